//! Document-scoped user settings.
//!
//! Stored as a versioned JSON record in the document's key-value store.
//! Missing fields take their defaults; records written before versioning
//! (no `version` field) are migrated to the current version on load.

use crate::error::{Error, Result};
use crate::store::KeyValueStore;
use serde::{Deserialize, Serialize};

/// Store key of the settings record.
pub const SETTINGS_KEY: &str = "configSettings";

/// Latest settings record version.
pub const SETTINGS_VERSION: u32 = 1;

/// Placeholder image used when a user has no avatar.
pub const DEFAULT_AVATAR_URL: &str = "https://liamhorne.com/assets/img/icons/unknown.png";

fn default_version() -> u32 {
    0
}

fn default_true() -> bool {
    true
}

fn default_update_font_size() -> f64 {
    20.0
}

fn default_avatar_url() -> String {
    DEFAULT_AVATAR_URL.to_string()
}

fn default_meeting_name() -> String {
    "All Hands".to_string()
}

/// User-editable settings of one presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Generate one slide per project in addition to initiative slides.
    #[serde(default = "default_true")]
    pub with_project_slides: bool,

    /// Show owner avatars on initiative slides instead of the big emoji.
    #[serde(default)]
    pub with_assignee_avatars: bool,

    /// Base font size for rendered project updates.
    #[serde(default = "default_update_font_size")]
    pub update_font_size: f64,

    /// Image used when a user has no avatar.
    #[serde(default = "default_avatar_url")]
    pub default_avatar_url: String,

    /// Meeting named in reminder emails.
    #[serde(default = "default_meeting_name")]
    pub meeting_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            with_project_slides: true,
            with_assignee_avatars: false,
            update_font_size: default_update_font_size(),
            default_avatar_url: default_avatar_url(),
            meeting_name: default_meeting_name(),
        }
    }
}

impl Settings {
    /// Names accepted by [`set_field`](Self::set_field).
    pub const FIELDS: [&'static str; 5] = [
        "with_project_slides",
        "with_assignee_avatars",
        "update_font_size",
        "default_avatar_url",
        "meeting_name",
    ];

    /// Parse a stored record, migrating older versions.
    pub fn decode(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(Self::default());
        }

        let mut settings: Settings =
            serde_json::from_str(trimmed).map_err(|e| Error::CorruptedRecord {
                key: SETTINGS_KEY.to_string(),
                reason: e.to_string(),
            })?;

        if settings.version > SETTINGS_VERSION {
            return Err(Error::UnsupportedVersion {
                key: SETTINGS_KEY.to_string(),
                found: settings.version,
                supported: SETTINGS_VERSION,
            });
        }
        if settings.version < SETTINGS_VERSION {
            log::debug!("Migrating settings from version {}", settings.version);
            settings.version = SETTINGS_VERSION;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load settings, falling back to defaults when none are stored.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        match store.get(SETTINGS_KEY)? {
            Some(raw) => Self::decode(&raw),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        store.set(SETTINGS_KEY, &self.encode()?)
    }

    fn validate(&self) -> Result<()> {
        if !(self.update_font_size > 0.0 && self.update_font_size <= 96.0) {
            return Err(Error::InvalidSetting(format!(
                "update_font_size must be between 0 and 96, got {}",
                self.update_font_size
            )));
        }
        Ok(())
    }

    /// Set one field from its string form.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        let parse_bool = |value: &str| -> Result<bool> {
            match value.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err(Error::InvalidSetting(format!(
                    "{} expects true or false, got '{}'",
                    key, value
                ))),
            }
        };

        let mut updated = self.clone();
        match key {
            "with_project_slides" => updated.with_project_slides = parse_bool(value)?,
            "with_assignee_avatars" => updated.with_assignee_avatars = parse_bool(value)?,
            "update_font_size" => {
                updated.update_font_size = value.parse().map_err(|_| {
                    Error::InvalidSetting(format!(
                        "update_font_size expects a number, got '{}'",
                        value
                    ))
                })?;
            }
            "default_avatar_url" => updated.default_avatar_url = value.to_string(),
            "meeting_name" => updated.meeting_name = value.to_string(),
            other => {
                return Err(Error::InvalidSetting(format!(
                    "unknown setting '{}' (expected one of: {})",
                    other,
                    Self::FIELDS.join(", ")
                )));
            }
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}
