//! Plain-text outline of a deck.
//!
//! Each page lists its text in reading order; pages are separated by a blank
//! line.

use crate::canvas::PageId;
use crate::memory::{Element, ElementKind, MemoryCanvas, Page};
use std::cmp::Ordering;

/// Text found on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutline {
    pub page: PageId,
    pub lines: Vec<String>,
}

/// Sort elements top-to-bottom, then left-to-right.
fn sort_by_position(elements: &mut [&Element]) {
    elements.sort_by(|a, b| {
        let y_cmp = a.rect.top.partial_cmp(&b.rect.top).unwrap_or(Ordering::Equal);
        if y_cmp == Ordering::Equal {
            a.rect.left.partial_cmp(&b.rect.left).unwrap_or(Ordering::Equal)
        } else {
            y_cmp
        }
    });
}

fn element_lines(element: &Element) -> Vec<String> {
    match &element.kind {
        ElementKind::TextBox { .. } => element
            .text()
            .unwrap_or_default()
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect(),
        ElementKind::Table { table } => table
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.text())
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .filter(|line| !line.trim().is_empty())
            .collect(),
        ElementKind::Image { .. } => Vec::new(),
    }
}

fn page_outline(page: &Page) -> PageOutline {
    let mut elements: Vec<&Element> = page.elements.iter().collect();
    sort_by_position(&mut elements);
    PageOutline {
        page: page.id.clone(),
        lines: elements.into_iter().flat_map(element_lines).collect(),
    }
}

/// Outline of every page, in deck order.
pub fn outline(canvas: &MemoryCanvas) -> Vec<PageOutline> {
    canvas.pages.iter().map(page_outline).collect()
}

/// Join page outlines into text, skipping pages without text.
pub fn format_outline(pages: &[PageOutline]) -> String {
    pages
        .iter()
        .filter(|p| !p.lines.is_empty())
        .map(|p| p.lines.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}
