//! JSON deck document: the presentation plus its document properties.

use anyhow::{Context, Result};
use roadmap_core::canvas::Size;
use roadmap_core::{MemoryCanvas, MemoryStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A presentation stored on disk.
///
/// `properties` is the document-scoped key-value store holding the slide
/// caches and settings. Canvas and store are separate fields so both can be
/// borrowed mutably at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckDocument {
    pub canvas: MemoryCanvas,
    #[serde(default)]
    pub properties: MemoryStore,
}

impl DeckDocument {
    pub fn new(id: &str, url: &str, page_size: Size) -> Self {
        Self {
            canvas: MemoryCanvas::new(id, url).with_page_size(page_size),
            properties: MemoryStore::new(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read deck {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse deck {}", path.display()))
    }

    /// Write the document, replacing the file only once it is fully written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to encode deck")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}
