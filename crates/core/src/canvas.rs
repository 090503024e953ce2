//! Capability interface for the drawable presentation surface.
//!
//! Layout code and the markdown renderer only talk to a [`Canvas`]; the
//! production adapter and the in-memory recording canvas both implement it.

use crate::error::Result;
use crate::formatting::{ContentAlignment, RunStyle, TextStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;

/// A rectangle in canvas coordinates (points).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Width and height in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Opaque identifier of a page (slide).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of an element (text box, image, table) on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A piece of text with a fully-resolved style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub style: RunStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One append operation against a text container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Span {
    Run(TextRun),
    /// Zero-width marker restoring the given style for whatever follows.
    Reset { style: RunStyle },
    ParagraphBreak,
}

impl Span {
    /// Plain run in the given style.
    pub fn run(text: impl Into<String>, style: RunStyle) -> Self {
        Self::Run(TextRun::new(text, style))
    }

    /// Text carried by this span; `None` for markers.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Run(run) => Some(&run.text),
            Self::Reset { .. } | Self::ParagraphBreak => None,
        }
    }

    /// Text this span contributes to the container, paragraph breaks included.
    pub fn rendered_text(&self) -> &str {
        match self {
            Self::Run(run) => &run.text,
            Self::Reset { .. } => "",
            Self::ParagraphBreak => "\n",
        }
    }
}

/// Concatenate what a list of spans renders to.
pub fn spans_text(spans: &[Span]) -> String {
    spans.iter().map(Span::rendered_text).collect()
}

/// One table cell: its own list of styled spans.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableCell {
    pub spans: Vec<Span>,
}

impl TableCell {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    pub fn text(&self) -> String {
        spans_text(&self.spans)
    }
}

/// A rows × columns grid. Every row has exactly `columns` cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: usize,
    pub rows: Vec<Vec<TableCell>>,
    /// Vertical alignment of every cell.
    pub alignment: ContentAlignment,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Image bytes downloaded from a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlob {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// Natural size in pixels, when the header could be read.
    pub dimensions: Option<Size>,
}

impl ImageBlob {
    /// Wrap raw bytes, sniffing dimensions from the header.
    pub fn from_bytes(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        let dimensions = sniff_dimensions(&bytes);
        Self {
            bytes,
            content_type,
            dimensions,
        }
    }
}

/// Where an inserted image comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ImageSource {
    /// The host downloads the URL itself.
    Url(String),
    /// Bytes already fetched by us.
    Blob(ImageBlob),
}

/// Read pixel dimensions from the image header (PNG, GIF or JPEG).
pub fn sniff_dimensions(bytes: &[u8]) -> Option<Size> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok((width, height)) => Some(Size::new(width as f64, height as f64)),
        Err(e) => {
            log::debug!("Could not read image dimensions: {}", e);
            None
        }
    }
}

/// Downloads images referenced by markdown.
pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<ImageBlob>;
}

/// The drawable presentation surface.
///
/// All mutations are applied in call order.
pub trait Canvas {
    /// Stable identifier of the presentation (scopes the slide cache).
    fn presentation_id(&self) -> &str;

    /// Base URL of the presentation.
    fn presentation_url(&self) -> &str;

    /// Page dimensions in points.
    fn page_size(&self) -> Size;

    /// Append an empty page and return its id.
    fn append_page(&mut self) -> Result<PageId>;

    fn page_exists(&self, page: &PageId) -> bool;

    /// Remove every shape, image and table from a page.
    fn clear_page(&mut self, page: &PageId) -> Result<()>;

    /// Insert a text box holding `text` in `style`.
    fn insert_text_box(
        &mut self,
        page: &PageId,
        rect: Rect,
        style: &TextStyle,
        text: &str,
    ) -> Result<ElementId>;

    /// Append one span to an existing text box.
    fn append_span(&mut self, shape: &ElementId, span: Span) -> Result<()>;

    /// Plain text currently held by a text box.
    fn shape_text(&self, shape: &ElementId) -> Result<String>;

    /// Set the font size of every run in a text box.
    fn set_font_size(&mut self, shape: &ElementId, size: f64) -> Result<()>;

    /// Insert an image filling `rect`; `alt` becomes its title.
    fn insert_image(
        &mut self,
        page: &PageId,
        rect: Rect,
        source: ImageSource,
        alt: Option<&str>,
    ) -> Result<ElementId>;

    /// Insert a table whose grid fills `rect`.
    fn insert_table(&mut self, page: &PageId, rect: Rect, table: &Table) -> Result<ElementId>;

    /// Deep link to a page.
    fn slide_url(&self, page: &PageId) -> String {
        format!("{}#slide=id.{}", self.presentation_url(), page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    #[test]
    fn test_sniff_png_dimensions() {
        let png = encode(800, 600, image::ImageFormat::Png);
        assert_eq!(sniff_dimensions(&png), Some(Size::new(800.0, 600.0)));
    }

    #[test]
    fn test_sniff_gif_dimensions() {
        let gif = encode(320, 200, image::ImageFormat::Gif);
        assert_eq!(sniff_dimensions(&gif), Some(Size::new(320.0, 200.0)));
    }

    #[test]
    fn test_sniff_jpeg_dimensions() {
        let jpeg = encode(640, 480, image::ImageFormat::Jpeg);
        assert_eq!(sniff_dimensions(&jpeg), Some(Size::new(640.0, 480.0)));
    }

    #[test]
    fn test_sniff_unknown_format() {
        assert_eq!(sniff_dimensions(b"not an image"), None);
        assert_eq!(sniff_dimensions(&[]), None);
    }

    #[test]
    fn test_sniff_truncated_header() {
        let png = encode(800, 600, image::ImageFormat::Png);
        assert_eq!(sniff_dimensions(&png[..12]), None);
    }

    #[test]
    fn test_spans_text_includes_paragraph_breaks() {
        let spans = vec![
            Span::run("a", RunStyle::default()),
            Span::Reset {
                style: RunStyle::default(),
            },
            Span::ParagraphBreak,
            Span::run("b", RunStyle::default()),
        ];
        assert_eq!(spans_text(&spans), "a\nb");
    }
}
