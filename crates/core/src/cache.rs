//! Entity → slide cache.
//!
//! Maps a stable entity id (initiative, project) to the page generated for it,
//! so repeated runs repopulate the same slide instead of appending new ones.
//! Caches are persisted per presentation in the document key-value store,
//! loaded once at the start of a run and saved once at the end.

use crate::canvas::{Canvas, PageId, Rect};
use crate::error::{Error, Result};
use crate::formatting::{colors, ParagraphAlignment, TextFormatting};
use crate::store::KeyValueStore;
use crate::timeline::format_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Latest version of the persisted cache record.
pub const CACHE_RECORD_VERSION: u32 = 1;

/// Which kind of slide a cache tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideKind {
    Agenda,
    Initiative,
    Project,
}

impl SlideKind {
    pub const ALL: [SlideKind; 3] = [Self::Agenda, Self::Initiative, Self::Project];

    /// Tag used in the store key.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Agenda => "AGENDA-SLIDE",
            Self::Initiative => "INITIATIVE-SLIDE",
            Self::Project => "PROJECT-SLIDE",
        }
    }

    /// Store key of this cache for a presentation.
    pub fn store_key(&self, presentation_id: &str) -> String {
        format!("{}_{}", self.tag(), presentation_id)
    }
}

/// What to do when a cached slide id no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Surface [`Error::StaleSlide`].
    #[default]
    Fail,
    /// Append a fresh page and overwrite the mapping.
    Recreate,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    version: u32,
    #[serde(default)]
    slides: BTreeMap<String, PageId>,
}

/// Entity id → page id mapping for one slide kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideCache {
    kind: SlideKind,
    entries: BTreeMap<String, PageId>,
}

impl SlideCache {
    pub fn new(kind: SlideKind) -> Self {
        Self {
            kind,
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, entity_id: &str) -> Option<&PageId> {
        self.entries.get(entity_id)
    }

    pub fn insert(&mut self, entity_id: impl Into<String>, page: PageId) {
        self.entries.insert(entity_id.into(), page);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PageId)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse a persisted cache value.
    ///
    /// Accepts the versioned record and the legacy bare `{entity: slide}` map.
    /// An empty string or `null` is an empty cache.
    pub fn decode(kind: SlideKind, key: &str, raw: &str) -> Result<Self> {
        let corrupted = |reason: String| Error::CorruptedRecord {
            key: key.to_string(),
            reason,
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::new(kind));
        }

        let value: serde_json::Value =
            serde_json::from_str(trimmed).map_err(|e| corrupted(e.to_string()))?;

        let entries = if value.get("version").is_some() {
            let record: CacheRecord =
                serde_json::from_value(value).map_err(|e| corrupted(e.to_string()))?;
            if record.version > CACHE_RECORD_VERSION {
                return Err(Error::UnsupportedVersion {
                    key: key.to_string(),
                    found: record.version,
                    supported: CACHE_RECORD_VERSION,
                });
            }
            record.slides
        } else {
            log::debug!("Migrating legacy slide cache under {}", key);
            serde_json::from_value(value).map_err(|e| corrupted(e.to_string()))?
        };

        Ok(Self { kind, entries })
    }

    /// Serialize as the current versioned record.
    pub fn encode(&self) -> Result<String> {
        let record = CacheRecord {
            version: CACHE_RECORD_VERSION,
            slides: self.entries.clone(),
        };
        Ok(serde_json::to_string(&record)?)
    }

    /// Load this kind's cache for a presentation.
    pub fn load(kind: SlideKind, store: &dyn KeyValueStore, presentation_id: &str) -> Result<Self> {
        let key = kind.store_key(presentation_id);
        match store.get(&key)? {
            Some(raw) => Self::decode(kind, &key, &raw),
            None => Ok(Self::new(kind)),
        }
    }

    /// Persist this cache for a presentation.
    pub fn save(&self, store: &mut dyn KeyValueStore, presentation_id: &str) -> Result<()> {
        store.set(&self.kind.store_key(presentation_id), &self.encode()?)
    }
}

/// The three caches of one presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideCaches {
    pub agenda: SlideCache,
    pub initiative: SlideCache,
    pub project: SlideCache,
}

impl SlideCaches {
    /// Load all caches. Any corrupted record aborts the load.
    pub fn load(store: &dyn KeyValueStore, presentation_id: &str) -> Result<Self> {
        Ok(Self {
            agenda: SlideCache::load(SlideKind::Agenda, store, presentation_id)?,
            initiative: SlideCache::load(SlideKind::Initiative, store, presentation_id)?,
            project: SlideCache::load(SlideKind::Project, store, presentation_id)?,
        })
    }

    pub fn save(&self, store: &mut dyn KeyValueStore, presentation_id: &str) -> Result<()> {
        self.agenda.save(store, presentation_id)?;
        self.initiative.save(store, presentation_id)?;
        self.project.save(store, presentation_id)
    }
}

/// Resolve the slide for `entity_id`, reusing a cached page when possible.
///
/// A cached page is cleared before being returned; a new page is appended and
/// recorded otherwise. Both paths stamp the generation time in the
/// bottom-right corner.
pub fn get_or_create_slide(
    canvas: &mut dyn Canvas,
    cache: &mut SlideCache,
    entity_id: &str,
    now: DateTime<Utc>,
    policy: StalePolicy,
) -> Result<PageId> {
    let page = match cache.get(entity_id).cloned() {
        Some(page) if canvas.page_exists(&page) => {
            log::debug!("Reusing slide {} for {}", page, entity_id);
            canvas.clear_page(&page)?;
            page
        }
        Some(stale) => match policy {
            StalePolicy::Fail => {
                return Err(Error::StaleSlide {
                    entity_id: entity_id.to_string(),
                    slide_id: stale.to_string(),
                });
            }
            StalePolicy::Recreate => {
                log::warn!(
                    "Slide {} for {} was deleted; creating a new one",
                    stale,
                    entity_id
                );
                let page = canvas.append_page()?;
                cache.insert(entity_id, page.clone());
                page
            }
        },
        None => {
            let page = canvas.append_page()?;
            log::debug!("Created slide {} for {}", page, entity_id);
            cache.insert(entity_id, page.clone());
            page
        }
    };

    stamp_timestamp(canvas, &page, now)?;
    Ok(page)
}

fn stamp_timestamp(canvas: &mut dyn Canvas, page: &PageId, now: DateTime<Utc>) -> Result<()> {
    let size = canvas.page_size();
    let style = TextFormatting::new()
        .paragraph_alignment(ParagraphAlignment::End)
        .font_size(7.0)
        .font_color(colors::TEXT_SECONDARY)
        .resolve();
    canvas.insert_text_box(
        page,
        Rect::new(size.width - 200.0, size.height - 20.0, 200.0, 20.0),
        &style,
        &format!("Slide generated on {}", format_timestamp(now)),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCanvas;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 9, 30, 0).unwrap()
    }

    fn canvas() -> MemoryCanvas {
        MemoryCanvas::new("deck-1", "https://slides.example/deck-1")
    }

    fn slide(canvas: &mut MemoryCanvas, cache: &mut SlideCache, entity_id: &str) -> PageId {
        get_or_create_slide(canvas, cache, entity_id, now(), StalePolicy::Fail).unwrap()
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut canvas = canvas();
        let mut cache = SlideCache::new(SlideKind::Project);

        let first = slide(&mut canvas, &mut cache, "proj-1");
        let second = slide(&mut canvas, &mut cache, "proj-1");

        assert_eq!(first, second);
        assert_eq!(canvas.pages.len(), 1);
        assert_eq!(cache.get("proj-1"), Some(&first));
    }

    #[test]
    fn test_reuse_clears_previous_content() {
        let mut canvas = canvas();
        let mut cache = SlideCache::new(SlideKind::Project);
        let page =
            get_or_create_slide(&mut canvas, &mut cache, "p", now(), StalePolicy::Fail).unwrap();
        let style = TextFormatting::new().resolve();
        canvas
            .insert_text_box(&page, Rect::default(), &style, "old content")
            .unwrap();

        get_or_create_slide(&mut canvas, &mut cache, "p", now(), StalePolicy::Fail).unwrap();

        let page = canvas.page(&page).unwrap();
        assert!(!page.contains_text("old content"));
        assert_eq!(page.elements.len(), 1);
        assert!(page.contains_text("Slide generated on Aug 01, 2024, 09:30 AM UTC"));
    }

    #[test]
    fn test_timestamp_in_bottom_right_corner() {
        let mut canvas = canvas();
        let mut cache = SlideCache::new(SlideKind::Agenda);
        let page =
            get_or_create_slide(&mut canvas, &mut cache, "i", now(), StalePolicy::Fail).unwrap();
        let stamp = &canvas.page(&page).unwrap().elements[0];
        assert_eq!(stamp.rect, Rect::new(520.0, 385.0, 200.0, 20.0));
    }

    #[test]
    fn test_stale_slide_fails_by_default() {
        let mut canvas = canvas();
        let mut cache = SlideCache::new(SlideKind::Project);
        let page =
            get_or_create_slide(&mut canvas, &mut cache, "p", now(), StalePolicy::Fail).unwrap();
        canvas.delete_page(&page);

        let result = get_or_create_slide(&mut canvas, &mut cache, "p", now(), StalePolicy::Fail);

        assert!(matches!(result, Err(Error::StaleSlide { .. })));
        assert!(canvas.pages.is_empty());
    }

    #[test]
    fn test_stale_slide_recreated_when_asked() {
        let mut canvas = canvas();
        let mut cache = SlideCache::new(SlideKind::Project);
        let old =
            get_or_create_slide(&mut canvas, &mut cache, "p", now(), StalePolicy::Fail).unwrap();
        canvas.delete_page(&old);

        let new = get_or_create_slide(&mut canvas, &mut cache, "p", now(), StalePolicy::Recreate)
            .unwrap();

        assert_ne!(old, new);
        assert_eq!(cache.get("p"), Some(&new));
    }

    #[test]
    fn test_store_key() {
        assert_eq!(SlideKind::Project.store_key("abc"), "PROJECT-SLIDE_abc");
        assert_eq!(SlideKind::Agenda.store_key("abc"), "AGENDA-SLIDE_abc");
    }

    #[test]
    fn test_load_missing_and_empty() {
        let mut store = MemoryStore::new();
        assert!(SlideCache::load(SlideKind::Project, &store, "d").unwrap().is_empty());
        store.set("PROJECT-SLIDE_d", "").unwrap();
        assert!(SlideCache::load(SlideKind::Project, &store, "d").unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut cache = SlideCache::new(SlideKind::Initiative);
        cache.insert("init-1", PageId::new("p3"));
        cache.save(&mut store, "d").unwrap();

        let loaded = SlideCache::load(SlideKind::Initiative, &store, "d").unwrap();
        assert_eq!(loaded, cache);
        let raw = store.get("INITIATIVE-SLIDE_d").unwrap().unwrap();
        assert!(raw.contains("\"version\":1"));
    }

    #[test]
    fn test_legacy_map_is_migrated() {
        let cache = SlideCache::decode(SlideKind::Project, "k", r#"{"proj-1":"g123"}"#).unwrap();
        assert_eq!(cache.get("proj-1"), Some(&PageId::new("g123")));
    }

    #[test]
    fn test_corrupted_cache_is_an_error() {
        let result = SlideCache::decode(SlideKind::Project, "k", "{not json");
        assert!(matches!(result, Err(Error::CorruptedRecord { .. })));

        let result = SlideCache::decode(SlideKind::Project, "k", "[1, 2]");
        assert!(matches!(result, Err(Error::CorruptedRecord { .. })));
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = SlideCache::decode(SlideKind::Project, "k", r#"{"version":9,"slides":{}}"#);
        assert!(matches!(result, Err(Error::UnsupportedVersion { found: 9, .. })));
    }

    #[test]
    fn test_caches_load_fails_on_any_corruption() {
        let mut store = MemoryStore::new();
        store.set("AGENDA-SLIDE_d", "garbage").unwrap();
        assert!(SlideCaches::load(&store, "d").is_err());
    }
}
