//! In-memory presentation implementing [`Canvas`].
//!
//! Records every element exactly as it was drawn. The CLI persists it as a
//! JSON deck document; tests use it to inspect what layouts produced.

use crate::canvas::{
    spans_text, Canvas, ElementId, ImageSource, PageId, Rect, Size, Span, Table, TextRun,
};
use crate::error::{Error, Result};
use crate::formatting::TextStyle;
use serde::{Deserialize, Serialize};

/// Default page size of a 16:9 deck, in points.
pub const DEFAULT_PAGE_SIZE: Size = Size::new(720.0, 405.0);

/// A drawn element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub rect: Rect,
    pub kind: ElementKind,
}

/// What an element holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ElementKind {
    TextBox { style: TextStyle, spans: Vec<Span> },
    Image { source: ImageSource, alt: Option<String> },
    Table { table: Table },
}

impl Element {
    /// Text of a text box; `None` for other elements.
    pub fn text(&self) -> Option<String> {
        match &self.kind {
            ElementKind::TextBox { spans, .. } => Some(spans_text(spans)),
            _ => None,
        }
    }

    pub fn is_text_box(&self) -> bool {
        matches!(self.kind, ElementKind::TextBox { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ElementKind::Image { .. })
    }

    pub fn is_table(&self) -> bool {
        matches!(self.kind, ElementKind::Table { .. })
    }
}

/// A page and its elements in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub elements: Vec<Element>,
}

impl Page {
    pub fn text_boxes(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_text_box())
    }

    pub fn images(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_image())
    }

    pub fn tables(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_table())
    }

    /// Whether any text box on the page contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.text_boxes()
            .filter_map(Element::text)
            .any(|text| text.contains(needle))
    }
}

/// A whole presentation held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryCanvas {
    pub id: String,
    pub url: String,
    pub page_size: Size,
    pub pages: Vec<Page>,
    /// Counter for generated ids; persisted so ids stay unique across runs.
    #[serde(default)]
    next_id: u64,
}

impl MemoryCanvas {
    /// Create an empty presentation.
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            pages: Vec::new(),
            next_id: 0,
        }
    }

    /// Set the page size.
    pub fn with_page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|p| &p.id == id)
    }

    /// Remove a page, as a user deleting a slide would.
    pub fn delete_page(&mut self, id: &PageId) -> bool {
        let before = self.pages.len();
        self.pages.retain(|p| &p.id != id);
        self.pages.len() != before
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .find(|e| &e.id == id)
    }

    fn next(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn page_mut(&mut self, id: &PageId) -> Result<&mut Page> {
        self.pages
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| Error::PageNotFound(id.to_string()))
    }

    fn element_mut(&mut self, id: &ElementId) -> Result<&mut Element> {
        self.pages
            .iter_mut()
            .flat_map(|p| p.elements.iter_mut())
            .find(|e| &e.id == id)
            .ok_or_else(|| Error::ElementNotFound(id.to_string()))
    }

    fn push_element(&mut self, page: &PageId, rect: Rect, kind: ElementKind) -> Result<ElementId> {
        // Validate the page before consuming an id.
        self.page_mut(page)?;
        let id = ElementId::new(self.next("e"));
        self.page_mut(page)?.elements.push(Element {
            id: id.clone(),
            rect,
            kind,
        });
        Ok(id)
    }

    fn text_spans_mut(&mut self, shape: &ElementId) -> Result<&mut Vec<Span>> {
        match &mut self.element_mut(shape)?.kind {
            ElementKind::TextBox { spans, .. } => Ok(spans),
            _ => Err(Error::ElementNotFound(format!("{} is not a text box", shape))),
        }
    }
}

impl Canvas for MemoryCanvas {
    fn presentation_id(&self) -> &str {
        &self.id
    }

    fn presentation_url(&self) -> &str {
        &self.url
    }

    fn page_size(&self) -> Size {
        self.page_size
    }

    fn append_page(&mut self) -> Result<PageId> {
        let id = PageId::new(self.next("p"));
        self.pages.push(Page {
            id: id.clone(),
            elements: Vec::new(),
        });
        Ok(id)
    }

    fn page_exists(&self, page: &PageId) -> bool {
        self.page(page).is_some()
    }

    fn clear_page(&mut self, page: &PageId) -> Result<()> {
        self.page_mut(page)?.elements.clear();
        Ok(())
    }

    fn insert_text_box(
        &mut self,
        page: &PageId,
        rect: Rect,
        style: &TextStyle,
        text: &str,
    ) -> Result<ElementId> {
        let spans = if text.is_empty() {
            Vec::new()
        } else {
            vec![Span::Run(TextRun::new(text, style.run.clone()))]
        };
        self.push_element(
            page,
            rect,
            ElementKind::TextBox {
                style: style.clone(),
                spans,
            },
        )
    }

    fn append_span(&mut self, shape: &ElementId, span: Span) -> Result<()> {
        self.text_spans_mut(shape)?.push(span);
        Ok(())
    }

    fn shape_text(&self, shape: &ElementId) -> Result<String> {
        self.element(shape)
            .and_then(Element::text)
            .ok_or_else(|| Error::ElementNotFound(shape.to_string()))
    }

    fn set_font_size(&mut self, shape: &ElementId, size: f64) -> Result<()> {
        for span in self.text_spans_mut(shape)?.iter_mut() {
            match span {
                Span::Run(run) => run.style.font_size = size,
                Span::Reset { style } => style.font_size = size,
                Span::ParagraphBreak => {}
            }
        }
        Ok(())
    }

    fn insert_image(
        &mut self,
        page: &PageId,
        rect: Rect,
        source: ImageSource,
        alt: Option<&str>,
    ) -> Result<ElementId> {
        self.push_element(
            page,
            rect,
            ElementKind::Image {
                source,
                alt: alt.map(str::to_string),
            },
        )
    }

    fn insert_table(&mut self, page: &PageId, rect: Rect, table: &Table) -> Result<ElementId> {
        self.push_element(
            page,
            rect,
            ElementKind::Table {
                table: table.clone(),
            },
        )
    }
}
