//! Slide generation for a whole roadmap.
//!
//! A sync pass loads the settings and the three slide caches once, draws
//! every agenda, initiative and project slide, then writes the caches back.
//! A failure while drawing one entity is logged and recorded; the remaining
//! entities are still drawn.

use crate::cache::{get_or_create_slide, SlideCache, SlideCaches, SlideKind, StalePolicy};
use crate::canvas::{Canvas, ImageFetcher, PageId};
use crate::error::{Error, Result};
use crate::markdown::MarkdownRenderer;
use crate::settings::Settings;
use crate::slides;
use crate::store::KeyValueStore;
use crate::types::{map_projects_to_initiatives, Initiative, Project};
use chrono::{DateTime, Utc};

/// Where initiatives and projects come from.
pub trait RoadmapSource {
    fn initiatives(&self) -> Result<Vec<Initiative>>;

    /// Projects sorted by target date.
    fn projects(&self) -> Result<Vec<Project>>;
}

/// Handles a sync pass draws on.
pub struct SyncContext<'a> {
    pub canvas: &'a mut dyn Canvas,
    pub store: &'a mut dyn KeyValueStore,
    pub fetcher: &'a dyn ImageFetcher,
    pub now: DateTime<Utc>,
    pub stale_policy: StalePolicy,
}

/// An entity whose slide could not be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityFailure {
    pub kind: SlideKind,
    pub entity_id: String,
    pub error: String,
}

/// Outcome of a sync pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub initiatives: usize,
    pub projects: usize,
    /// Slides drawn, new or reused.
    pub slides_populated: usize,
    /// Slides appended to the deck during this pass.
    pub slides_created: usize,
    pub failures: Vec<EntityFailure>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, kind: SlideKind, entity_id: &str, outcome: Result<bool>) {
        match outcome {
            Ok(created) => {
                self.slides_populated += 1;
                if created {
                    self.slides_created += 1;
                }
            }
            Err(e) => {
                log::error!("Failed to draw {} slide for {}: {}", kind.tag(), entity_id, e);
                self.failures.push(EntityFailure {
                    kind,
                    entity_id: entity_id.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Resolve the slide for an entity and draw it. Returns whether the page is new.
fn draw_slide<F>(
    canvas: &mut dyn Canvas,
    cache: &mut SlideCache,
    entity_id: &str,
    now: DateTime<Utc>,
    policy: StalePolicy,
    draw: F,
) -> Result<bool>
where
    F: FnOnce(&mut dyn Canvas, &PageId) -> Result<()>,
{
    let created = cache.get(entity_id).is_none_or(|page| !canvas.page_exists(page));
    let page = get_or_create_slide(canvas, cache, entity_id, now, policy)?;
    draw(canvas, &page)?;
    Ok(created)
}

/// Generate or refresh every slide of the roadmap.
///
/// `with_project_slides` overrides the stored setting when given.
pub fn sync_roadmap(
    ctx: SyncContext<'_>,
    source: &dyn RoadmapSource,
    with_project_slides: Option<bool>,
) -> Result<SyncReport> {
    let SyncContext {
        canvas,
        store,
        fetcher,
        now,
        stale_policy,
    } = ctx;

    let settings = Settings::load(store)?;
    let presentation_id = canvas.presentation_id().to_string();
    let mut caches = SlideCaches::load(store, &presentation_id)?;

    let initiatives = source.initiatives()?;
    let projects = source.projects()?;
    let mut report = SyncReport {
        initiatives: initiatives.len(),
        projects: projects.len(),
        ..SyncReport::default()
    };
    if projects.is_empty() {
        log::info!("No projects found.");
        return Ok(report);
    }

    let roadmap = map_projects_to_initiatives(&initiatives, &projects);
    let agenda: Vec<Initiative> = roadmap.iter().map(|e| e.initiative.clone()).collect();
    let renderer = MarkdownRenderer::new(fetcher);
    let with_project_slides = with_project_slides.unwrap_or(settings.with_project_slides);

    for entry in &roadmap {
        let id = entry.initiative.id.as_str();
        log::info!("Drawing slides for initiative {} ({})", entry.initiative.name, id);

        let outcome = draw_slide(canvas, &mut caches.agenda, id, now, stale_policy, |c, page| {
            slides::agenda::populate(c, page, &agenda, id, &settings, now)
        });
        report.record(SlideKind::Agenda, id, outcome);

        let outcome = draw_slide(canvas, &mut caches.initiative, id, now, stale_policy, |c, page| {
            slides::initiative::populate(c, page, entry, &settings, now)
        });
        report.record(SlideKind::Initiative, id, outcome);

        if !with_project_slides {
            continue;
        }
        for project in &entry.projects {
            let outcome = draw_slide(
                canvas,
                &mut caches.project,
                &project.id,
                now,
                stale_policy,
                |c, page| {
                    slides::project::populate(
                        c,
                        page,
                        project,
                        &entry.initiative,
                        &renderer,
                        &settings,
                        now,
                    )
                },
            );
            report.record(SlideKind::Project, &project.id, outcome);
        }
    }

    caches.save(store, &presentation_id)?;
    log::info!(
        "Drew {} slides ({} new), {} failed",
        report.slides_populated,
        report.slides_created,
        report.failures.len()
    );
    Ok(report)
}

/// Redraw the slide of a single project.
pub fn update_project_slide(
    ctx: SyncContext<'_>,
    source: &dyn RoadmapSource,
    project_id: &str,
) -> Result<PageId> {
    let SyncContext {
        canvas,
        store,
        fetcher,
        now,
        stale_policy,
    } = ctx;

    let settings = Settings::load(store)?;
    let presentation_id = canvas.presentation_id().to_string();
    let mut cache = SlideCache::load(SlideKind::Project, store, &presentation_id)?;

    let project = source
        .projects()?
        .into_iter()
        .find(|p| p.id == project_id)
        .ok_or_else(|| Error::NotFound(format!("project {}", project_id)))?;
    let initiative = source
        .initiatives()?
        .into_iter()
        .find(|i| project.belongs_to(&i.id))
        .ok_or_else(|| Error::NotFound(format!("initiative of project {}", project_id)))?;

    let page = get_or_create_slide(canvas, &mut cache, project_id, now, stale_policy)?;
    let renderer = MarkdownRenderer::new(fetcher);
    slides::project::populate(
        canvas,
        &page,
        &project,
        &initiative,
        &renderer,
        &settings,
        now,
    )?;

    cache.save(store, &presentation_id)?;
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::ImageBlob;
    use crate::memory::MemoryCanvas;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    struct NoImages;

    impl ImageFetcher for NoImages {
        fn fetch(&self, url: &str) -> Result<ImageBlob> {
            Err(Error::HttpError(format!("offline: {}", url)))
        }
    }

    struct FixedSource {
        initiatives: Vec<Initiative>,
        projects: Vec<Project>,
    }

    impl RoadmapSource for FixedSource {
        fn initiatives(&self) -> Result<Vec<Initiative>> {
            Ok(self.initiatives.clone())
        }

        fn projects(&self) -> Result<Vec<Project>> {
            Ok(self.projects.clone())
        }
    }

    fn source() -> FixedSource {
        FixedSource {
            initiatives: vec![
                Initiative::new("i1", "Platform"),
                Initiative::new("i2", "Growth"),
            ],
            projects: vec![
                Project::new("p1", "Public API").in_initiative("i1"),
                Project::new("p2", "Docs").in_initiative("i1"),
                Project::new("p3", "Referrals").in_initiative("i2"),
            ],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 9, 0, 0).unwrap()
    }

    fn context<'a>(
        canvas: &'a mut MemoryCanvas,
        store: &'a mut MemoryStore,
        policy: StalePolicy,
    ) -> SyncContext<'a> {
        SyncContext {
            canvas,
            store,
            fetcher: &NoImages,
            now: now(),
            stale_policy: policy,
        }
    }

    #[test]
    fn test_first_sync_creates_every_slide() {
        let mut canvas = MemoryCanvas::new("deck", "https://slides.example/deck");
        let mut store = MemoryStore::new();

        let report = sync_roadmap(
            context(&mut canvas, &mut store, StalePolicy::Fail),
            &source(),
            None,
        )
        .unwrap();

        // Two agenda, two initiative and three project slides.
        assert_eq!(report.slides_created, 7);
        assert_eq!(report.slides_populated, 7);
        assert!(report.is_success());
        assert_eq!(canvas.pages.len(), 7);

        let caches = SlideCaches::load(&store, "deck").unwrap();
        assert_eq!(caches.agenda.len(), 2);
        assert_eq!(caches.initiative.len(), 2);
        assert_eq!(caches.project.len(), 3);
    }

    #[test]
    fn test_second_sync_reuses_slides() {
        let mut canvas = MemoryCanvas::new("deck", "https://slides.example/deck");
        let mut store = MemoryStore::new();
        sync_roadmap(context(&mut canvas, &mut store, StalePolicy::Fail), &source(), None)
            .unwrap();
        let report = sync_roadmap(
            context(&mut canvas, &mut store, StalePolicy::Fail),
            &source(),
            None,
        )
        .unwrap();

        assert_eq!(report.slides_created, 0);
        assert_eq!(report.slides_populated, 7);
        assert_eq!(canvas.pages.len(), 7);
    }

    #[test]
    fn test_without_project_slides() {
        let mut canvas = MemoryCanvas::new("deck", "https://slides.example/deck");
        let mut store = MemoryStore::new();
        let report = sync_roadmap(
            context(&mut canvas, &mut store, StalePolicy::Fail),
            &source(),
            Some(false),
        )
        .unwrap();
        assert_eq!(report.slides_created, 4);

        let mut settings = Settings::default();
        settings.with_project_slides = false;
        let mut store = MemoryStore::new();
        settings.save(&mut store).unwrap();
        let mut canvas = MemoryCanvas::new("deck", "https://slides.example/deck");
        let report = sync_roadmap(
            context(&mut canvas, &mut store, StalePolicy::Fail),
            &source(),
            None,
        )
        .unwrap();
        assert_eq!(report.slides_created, 4);
    }

    #[test]
    fn test_stale_slide_is_isolated() {
        let mut canvas = MemoryCanvas::new("deck", "https://slides.example/deck");
        let mut store = MemoryStore::new();
        sync_roadmap(context(&mut canvas, &mut store, StalePolicy::Fail), &source(), None)
            .unwrap();

        let caches = SlideCaches::load(&store, "deck").unwrap();
        let deleted = caches.project.get("p2").unwrap().clone();
        assert!(canvas.delete_page(&deleted));

        let report = sync_roadmap(
            context(&mut canvas, &mut store, StalePolicy::Fail),
            &source(),
            None,
        )
        .unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, SlideKind::Project);
        assert_eq!(report.failures[0].entity_id, "p2");
        assert_eq!(report.slides_populated, 6);

        let report = sync_roadmap(
            context(&mut canvas, &mut store, StalePolicy::Recreate),
            &source(),
            None,
        )
        .unwrap();
        assert!(report.is_success());
        assert_eq!(report.slides_created, 1);
        let caches = SlideCaches::load(&store, "deck").unwrap();
        assert_ne!(caches.project.get("p2"), Some(&deleted));
    }

    #[test]
    fn test_no_projects_is_benign() {
        let mut canvas = MemoryCanvas::new("deck", "https://slides.example/deck");
        let mut store = MemoryStore::new();
        let empty = FixedSource {
            initiatives: vec![Initiative::new("i1", "Platform")],
            projects: Vec::new(),
        };
        let report = sync_roadmap(
            context(&mut canvas, &mut store, StalePolicy::Fail),
            &empty,
            None,
        )
        .unwrap();
        assert_eq!(report.slides_populated, 0);
        assert!(canvas.pages.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_corrupted_cache_aborts() {
        let mut canvas = MemoryCanvas::new("deck", "https://slides.example/deck");
        let mut store = MemoryStore::new();
        store
            .set(&SlideKind::Agenda.store_key("deck"), "{not json")
            .unwrap();
        let result = sync_roadmap(
            context(&mut canvas, &mut store, StalePolicy::Fail),
            &source(),
            None,
        );
        assert!(matches!(result, Err(Error::CorruptedRecord { .. })));
        assert!(canvas.pages.is_empty());
    }

    #[test]
    fn test_update_single_project() {
        let mut canvas = MemoryCanvas::new("deck", "https://slides.example/deck");
        let mut store = MemoryStore::new();
        let page = update_project_slide(
            context(&mut canvas, &mut store, StalePolicy::Fail),
            &source(),
            "p3",
        )
        .unwrap();

        assert!(canvas.page(&page).unwrap().contains_text("Referrals"));
        assert!(canvas.page(&page).unwrap().contains_text("Growth"));
        let cache = SlideCache::load(SlideKind::Project, &store, "deck").unwrap();
        assert_eq!(cache.get("p3"), Some(&page));

        let missing = update_project_slide(
            context(&mut canvas, &mut store, StalePolicy::Fail),
            &source(),
            "nope",
        );
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }
}
