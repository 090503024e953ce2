//! Error types for roadmap slide generation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching roadmap data or populating slides.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a local file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A JSON payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The HTTP request itself failed (connection, TLS, non-success status).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// An email body could not be rendered.
    #[error("Template error: {0}")]
    TemplateError(#[from] askama::Error),

    /// The remote API answered with an error payload.
    #[error("API error: {0}")]
    ApiError(String),

    /// A page id handed to the canvas does not exist in the presentation.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// An element id handed to the canvas does not exist on any page.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A cached slide id no longer resolves to a page in the presentation.
    #[error("Cached slide '{slide_id}' for entity '{entity_id}' no longer exists")]
    StaleSlide { entity_id: String, slide_id: String },

    /// A persisted record (slide cache, settings) could not be parsed.
    #[error("Corrupted record under '{key}': {reason}")]
    CorruptedRecord { key: String, reason: String },

    /// A persisted record was written by a newer version of this tool.
    #[error("Unsupported record version {found} under '{key}' (latest known: {supported})")]
    UnsupportedVersion {
        key: String,
        found: u32,
        supported: u32,
    },

    /// A settings key or value was rejected.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// A colour string is not of the form `#rrggbb`.
    #[error("Invalid colour: {0}")]
    InvalidColor(String),

    /// The requested entity is not part of the fetched roadmap.
    #[error("Not found: {0}")]
    NotFound(String),
}
