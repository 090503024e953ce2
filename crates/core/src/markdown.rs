//! Markdown-to-canvas rendering for project update bodies.
//!
//! Supports the subset the tracker emits: `#`/`##`/`###` headings, `**bold**`,
//! `*italic*`, `[links](url)`, `![images](url)` and pipe tables. Every input
//! renders to something; the worst case is verbatim text.

use crate::canvas::{
    Canvas, ElementId, ImageFetcher, ImageSource, PageId, Rect, Size, Span, Table, TableCell,
};
use crate::error::Result;
use crate::formatting::{ContentAlignment, RunStyle, TextFormatting};
use regex::Regex;
use std::sync::LazyLock;

/// Regex matching an image reference anywhere in a line.
static IMAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").unwrap());

/// Gap between the text box and images/tables drawn below it.
const BLOCK_GAP: f64 = 10.0;

/// Vertical cursor advance after each image.
const IMAGE_ADVANCE: f64 = 200.0;

/// Vertical cursor advance after each table.
const TABLE_ADVANCE: f64 = 150.0;

/// Font size of table cells.
const TABLE_FONT_SIZE: f64 = 10.0;

/// Height of one table row.
const TABLE_ROW_HEIGHT: f64 = 20.0;

/// A classified markdown block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `#`, `##` or `###` heading with its prefix stripped.
    Heading { level: u8, text: String },
    Image { alt: String, url: String },
    /// Cell strings of a table block, row by row.
    Table(Vec<Vec<String>>),
    /// Any other line, rendered with inline styles.
    Paragraph(String),
}

impl Block {
    /// Extra points added to the base font size for a heading level.
    pub fn heading_increment(level: u8) -> f64 {
        match level {
            1 => 8.0,
            2 => 6.0,
            _ => 4.0,
        }
    }
}

/// Heading prefixes, longest first so `## x` is never read as `# x`.
const HEADING_PREFIXES: [(&str, u8); 3] = [("### ", 3), ("## ", 2), ("# ", 1)];

fn heading(line: &str) -> Option<Block> {
    HEADING_PREFIXES.iter().find_map(|(prefix, level)| {
        line.strip_prefix(prefix).map(|text| Block::Heading {
            level: *level,
            text: text.to_string(),
        })
    })
}

fn is_table_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
}

/// Strip the outer pipes and split on the inner ones.
fn table_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = &trimmed[1..trimmed.len() - 1];
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// Split markdown into blocks, one per line except for table runs.
pub fn classify(markdown: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut table: Vec<Vec<String>> = Vec::new();

    for raw in markdown.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if is_table_line(line) {
            table.push(table_cells(line));
            continue;
        }
        if !table.is_empty() {
            blocks.push(Block::Table(std::mem::take(&mut table)));
        }

        let block = if let Some(heading) = heading(line) {
            heading
        } else if let Some(caps) = IMAGE_REGEX.captures(line) {
            Block::Image {
                alt: caps[1].to_string(),
                url: caps[2].to_string(),
            }
        } else {
            Block::Paragraph(line.to_string())
        };
        blocks.push(block);
    }

    if !table.is_empty() {
        blocks.push(Block::Table(table));
    }

    blocks
}

/// Inline style recognised by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineKind {
    Bold,
    Italic,
    Link,
}

/// A matched inline span, as byte offsets into the line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InlineMatch<'a> {
    kind: InlineKind,
    start: usize,
    end: usize,
    inner: &'a str,
    url: Option<&'a str>,
}

fn find_from(line: &str, from: usize, needle: &str) -> Option<usize> {
    line.get(from..)?.find(needle).map(|idx| from + idx)
}

/// `**inner**` starting at the first `**` at or after `from`.
fn find_bold(line: &str, from: usize) -> Option<InlineMatch<'_>> {
    let start = find_from(line, from, "**")?;
    let close = find_from(line, start + 2, "**")?;
    Some(InlineMatch {
        kind: InlineKind::Bold,
        start,
        end: close + 2,
        inner: &line[start + 2..close],
        url: None,
    })
}

/// `*inner*` starting at the first `*` at or after `from`.
fn find_italic(line: &str, from: usize) -> Option<InlineMatch<'_>> {
    let start = find_from(line, from, "*")?;
    let close = find_from(line, start + 1, "*")?;
    Some(InlineMatch {
        kind: InlineKind::Italic,
        start,
        end: close + 1,
        inner: &line[start + 1..close],
        url: None,
    })
}

/// `[inner](url)` starting at the first `[` at or after `from`.
fn find_link(line: &str, from: usize) -> Option<InlineMatch<'_>> {
    let start = find_from(line, from, "[")?;
    let middle = find_from(line, start + 1, "](")?;
    let close = find_from(line, middle + 2, ")")?;
    Some(InlineMatch {
        kind: InlineKind::Link,
        start,
        end: close + 1,
        inner: &line[start + 1..middle],
        url: Some(&line[middle + 2..close]),
    })
}

/// Earliest match at or after `from`; on equal starts bold beats italic beats link.
fn next_match(line: &str, from: usize) -> Option<InlineMatch<'_>> {
    let candidates = [find_bold(line, from), find_italic(line, from), find_link(line, from)];
    let mut best: Option<InlineMatch<'_>> = None;
    for candidate in candidates.into_iter().flatten() {
        match &best {
            Some(current) if candidate.start >= current.start => {}
            _ => best = Some(candidate),
        }
    }
    best
}

fn has_inline_markers(line: &str) -> bool {
    line.contains('*') || line.contains('[')
}

/// Tokenize one line into styled runs.
///
/// Unstyled text before each match is emitted as a plain run, the captured
/// inner text as a styled run, then a [`Span::Reset`] back to the plain style.
/// The line's remainder after the last match is emitted plain.
pub fn inline_spans(line: &str, base_font_size: f64) -> Vec<Span> {
    let plain = RunStyle::plain(base_font_size);

    if !has_inline_markers(line) {
        return if line.is_empty() {
            Vec::new()
        } else {
            vec![Span::run(line, plain)]
        };
    }

    let mut spans = Vec::new();
    let mut cursor = 0;

    while cursor < line.len() {
        let Some(found) = next_match(line, cursor) else {
            spans.push(Span::run(&line[cursor..], plain.clone()));
            break;
        };

        if found.start > cursor {
            spans.push(Span::run(&line[cursor..found.start], plain.clone()));
        }

        let style = match (found.kind, found.url) {
            (InlineKind::Bold, _) => plain.clone().with_bold(),
            (InlineKind::Italic, _) => plain.clone().with_italic(),
            (InlineKind::Link, url) => plain.clone().with_link(url.unwrap_or_default()),
        };
        spans.push(Span::run(found.inner, style));
        spans.push(Span::Reset {
            style: plain.clone(),
        });

        cursor = found.end;
    }

    spans
}

/// Size of an image drawn into a column `max_width` wide.
///
/// The image always spans the column width, keeping its aspect ratio.
/// Without known dimensions it fills `max_width` × `fallback_height`.
pub fn fit_image(natural: Option<Size>, max_width: f64, fallback_height: f64) -> Size {
    match natural {
        Some(size) if size.width > 0.0 && size.height > 0.0 => {
            Size::new(max_width, size.height * max_width / size.width)
        }
        _ => Size::new(max_width, fallback_height),
    }
}

/// Build a table grid from cell strings.
///
/// The first row fixes the column count; shorter rows are padded with empty
/// cells and longer rows are truncated.
pub fn build_table(rows: &[Vec<String>], font_size: f64) -> Table {
    let columns = rows.first().map(Vec::len).unwrap_or(0);
    let rows = rows
        .iter()
        .map(|row| {
            (0..columns)
                .map(|col| {
                    let text = row.get(col).map(String::as_str).unwrap_or("");
                    TableCell::new(inline_spans(text, font_size))
                })
                .collect()
        })
        .collect();

    Table {
        columns,
        rows,
        alignment: ContentAlignment::Middle,
    }
}

/// Renders markdown into a text box plus images and tables below it.
pub struct MarkdownRenderer<'a> {
    fetcher: &'a dyn ImageFetcher,
}

impl<'a> MarkdownRenderer<'a> {
    /// Create a renderer that downloads images through `fetcher`.
    pub fn new(fetcher: &'a dyn ImageFetcher) -> Self {
        Self { fetcher }
    }

    /// Render `markdown` into `region` on `page`.
    ///
    /// Text goes into one text box covering `region`; images and tables are
    /// stacked below it. Returns the text box. Image download failures are
    /// logged and skipped; only canvas failures are returned.
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        page: &PageId,
        region: Rect,
        markdown: &str,
        base_font_size: f64,
    ) -> Result<ElementId> {
        let style = TextFormatting::new().font_size(base_font_size).resolve();
        let text_box = canvas.insert_text_box(page, region, &style, "")?;
        let mut cursor = region.top;

        for block in classify(markdown) {
            match block {
                Block::Heading { level, text } => {
                    let size = base_font_size + Block::heading_increment(level);
                    let run_style = RunStyle::plain(size).with_bold();
                    canvas.append_span(&text_box, Span::run(format!("{}\n", text), run_style))?;
                }
                Block::Paragraph(line) => {
                    for span in inline_spans(&line, base_font_size) {
                        canvas.append_span(&text_box, span)?;
                    }
                    canvas.append_span(&text_box, Span::ParagraphBreak)?;
                }
                Block::Image { alt, url } => {
                    self.draw_image(canvas, page, region, cursor, &alt, &url)?;
                    cursor += IMAGE_ADVANCE;
                }
                Block::Table(rows) => {
                    let table = build_table(&rows, TABLE_FONT_SIZE);
                    let rect = Rect::new(
                        region.left,
                        cursor + region.height + BLOCK_GAP,
                        region.width,
                        table.row_count() as f64 * TABLE_ROW_HEIGHT,
                    );
                    canvas.insert_table(page, rect, &table)?;
                    cursor += TABLE_ADVANCE;
                }
            }
        }

        Ok(text_box)
    }

    fn draw_image(
        &self,
        canvas: &mut dyn Canvas,
        page: &PageId,
        region: Rect,
        cursor: f64,
        alt: &str,
        url: &str,
    ) -> Result<()> {
        let blob = match self.fetcher.fetch(url) {
            Ok(blob) => blob,
            Err(e) => {
                log::warn!("Failed to fetch image from URL: {}\nError: {}", url, e);
                return Ok(());
            }
        };

        let size = fit_image(blob.dimensions, region.width, region.height);
        let rect = Rect::new(
            region.left,
            cursor + region.height + BLOCK_GAP,
            size.width,
            size.height,
        );
        let alt = (!alt.is_empty()).then_some(alt);
        canvas.insert_image(page, rect, ImageSource::Blob(blob), alt)?;
        Ok(())
    }
}
