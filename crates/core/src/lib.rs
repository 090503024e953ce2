//! Core of the roadmap slide generator: domain types, formatting rules,
//! the canvas abstraction, markdown rendering, the slide cache and the
//! layouts and jobs built on top of them.

pub mod cache;
pub mod canvas;
pub mod emoji;
pub mod error;
pub mod formatting;
pub mod markdown;
pub mod memory;
pub mod outline;
pub mod reminders;
pub mod settings;
pub mod slides;
pub mod store;
pub mod sync;
pub mod timeline;
pub mod types;

pub use cache::{get_or_create_slide, SlideCache, SlideCaches, SlideKind, StalePolicy};
pub use canvas::{Canvas, ElementId, ImageBlob, ImageFetcher, ImageSource, PageId, Rect, Size};
pub use error::{Error, Result};
pub use markdown::MarkdownRenderer;
pub use memory::MemoryCanvas;
pub use reminders::{send_reminders, Email, Notifier, ReminderReport};
pub use settings::Settings;
pub use store::{KeyValueStore, MemoryStore};
pub use sync::{sync_roadmap, update_project_slide, RoadmapSource, SyncContext, SyncReport};
pub use types::{Health, Initiative, InitiativeWithProjects, Project, ProjectUpdate, Status, User};
