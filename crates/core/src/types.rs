//! Domain types for roadmap data fetched from the project tracker.

use crate::formatting::HexColor;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A person attached to an initiative (owner) or project (lead).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name, e.g. "Ada Lovelace".
    pub name: String,

    /// Email address. Empty when the API did not expose it.
    #[serde(default)]
    pub email: String,

    /// Avatar image URL, if the user uploaded one.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl User {
    /// Create a user with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: String::new(),
            avatar_url: None,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Lifecycle status shared by initiatives and projects.
///
/// Conversion from strings is total: names outside the known set are kept
/// verbatim in [`Status::Other`] so they can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Planned,
    InProgress,
    Completed,
    Canceled,
    Other(String),
}

impl Status {
    /// The wire name of this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Planned => "Planned",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Canceled => "Canceled",
            Self::Other(name) => name,
        }
    }

    /// Completed and canceled items are closed; they no longer have a schedule.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

impl From<&str> for Status {
    fn from(value: &str) -> Self {
        match value {
            "Planned" => Self::Planned,
            "In Progress" => Self::InProgress,
            "Completed" => Self::Completed,
            "Canceled" => Self::Canceled,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative risk signal reported on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Health {
    OnTrack,
    AtRisk,
    OffTrack,
    #[default]
    Unknown,
}

impl Health {
    /// The wire name of this health value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "onTrack",
            Self::AtRisk => "atRisk",
            Self::OffTrack => "offTrack",
            Self::Unknown => "unknown",
        }
    }
}

impl From<&str> for Health {
    fn from(value: &str) -> Self {
        match value {
            "onTrack" => Self::OnTrack,
            "atRisk" => Self::AtRisk,
            "offTrack" => Self::OffTrack,
            _ => Self::Unknown,
        }
    }
}

impl From<String> for Health {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Health> for String {
    fn from(value: Health) -> Self {
        value.as_str().to_string()
    }
}

/// A high-level roadmap item grouping one or more projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub target_date: Option<NaiveDate>,
    pub status: Status,
    /// Emoji shortcode such as `"rocket"` or `":eyes:"`.
    pub icon: Option<String>,
    pub color: Option<HexColor>,
    #[serde(default)]
    pub url: String,
    pub owner: Option<User>,
}

impl Initiative {
    /// Create a planned initiative with only an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            target_date: None,
            status: Status::Planned,
            icon: None,
            color: None,
            url: String::new(),
            owner: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }
}

/// A free-text status update posted on a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    /// Markdown body.
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Display name of the author.
    pub author: String,
}

/// A tracked unit of work with status, health, timeline and updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    pub icon: Option<String>,
    pub color: Option<HexColor>,
    #[serde(default)]
    pub url: String,
    pub status: Status,
    #[serde(default)]
    pub health: Health,
    /// Updates, newest first.
    #[serde(default)]
    pub updates: Vec<ProjectUpdate>,
    pub lead: Option<User>,
    /// Ids of the initiatives this project belongs to.
    #[serde(default)]
    pub initiative_ids: Vec<String>,
}

impl Project {
    /// Create a planned project with only an id and a name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_date: None,
            target_date: None,
            description: String::new(),
            icon: None,
            color: None,
            url: String::new(),
            status: Status::Planned,
            health: Health::Unknown,
            updates: Vec::new(),
            lead: None,
            initiative_ids: Vec::new(),
        }
    }

    /// Add this project to an initiative.
    pub fn in_initiative(mut self, initiative_id: impl Into<String>) -> Self {
        self.initiative_ids.push(initiative_id.into());
        self
    }

    /// The most recent update, if any.
    pub fn latest_update(&self) -> Option<&ProjectUpdate> {
        self.updates.first()
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    pub fn is_canceled(&self) -> bool {
        self.status == Status::Canceled
    }

    pub fn belongs_to(&self, initiative_id: &str) -> bool {
        self.initiative_ids.iter().any(|id| id == initiative_id)
    }
}

/// An initiative together with the projects that reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitiativeWithProjects {
    #[serde(flatten)]
    pub initiative: Initiative,
    pub projects: Vec<Project>,
}

/// Order two optional dates ascending, with missing dates last.
fn compare_target_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sort projects by target date (stable, missing dates last).
pub fn sort_by_target_date(projects: &mut [Project]) {
    projects.sort_by(|a, b| compare_target_dates(a.target_date, b.target_date));
}

/// Join projects into the initiatives they reference.
///
/// Every input initiative yields exactly one entry, even when no project
/// references it. Projects keep their input order within an entry and are
/// listed at most once. The result is sorted ascending by target date.
pub fn map_projects_to_initiatives(
    initiatives: &[Initiative],
    projects: &[Project],
) -> Vec<InitiativeWithProjects> {
    let mut joined: Vec<InitiativeWithProjects> = initiatives
        .iter()
        .map(|initiative| InitiativeWithProjects {
            initiative: initiative.clone(),
            projects: projects
                .iter()
                .filter(|project| project.belongs_to(&initiative.id))
                .cloned()
                .collect(),
        })
        .collect();

    joined.sort_by(|a, b| {
        compare_target_dates(a.initiative.target_date, b.initiative.target_date)
    });

    joined
}
