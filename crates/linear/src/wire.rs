//! Response shapes of the Linear GraphQL API and their conversion into
//! domain types.
//!
//! Linear returns `null` for most optional fields, so nearly everything here
//! is an `Option` with a serde default.

use chrono::{DateTime, NaiveDate, Utc};
use roadmap_core::formatting::HexColor;
use roadmap_core::{Error, Health, Initiative, Project, ProjectUpdate, Result, Status, User};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

impl<T> GraphQlResponse<T> {
    /// The `data` payload, or the joined `errors` messages.
    pub fn into_data(self) -> Result<T> {
        if !self.errors.is_empty() {
            let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(Error::ApiError(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| Error::ApiError("response has no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub nodes: Vec<T>,
    pub page_info: Option<PageInfo>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            page_info: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InitiativesData {
    pub initiatives: Connection<InitiativeNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectsData {
    pub projects: Connection<ProjectNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNode {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl From<UserNode> for User {
    fn from(node: UserNode) -> Self {
        User {
            name: node.name,
            email: node.email.unwrap_or_default(),
            avatar_url: node.avatar_url.filter(|url| !url.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiativeNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub owner: Option<UserNode>,
}

/// Keep only well-formed `#rrggbb` colours.
fn parse_color(value: Option<String>) -> Option<HexColor> {
    match HexColor::parse(&value?) {
        Ok(color) => Some(color),
        Err(e) => {
            log::warn!("Ignoring colour from API: {}", e);
            None
        }
    }
}

impl From<InitiativeNode> for Initiative {
    fn from(node: InitiativeNode) -> Self {
        Initiative {
            id: node.id,
            name: node.name,
            description: node.description.unwrap_or_default(),
            target_date: node.target_date,
            status: node.status.map(Status::from).unwrap_or(Status::Planned),
            icon: node.icon,
            color: parse_color(node.color),
            url: node.url.unwrap_or_default(),
            owner: node.owner.map(User::from),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusNode {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct IdNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNode {
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub status: Option<StatusNode>,
    #[serde(default)]
    pub project_updates: Option<Connection<UpdateNode>>,
    #[serde(default)]
    pub initiatives: Option<Connection<IdNode>>,
    #[serde(default)]
    pub lead: Option<UserNode>,
    #[serde(default)]
    pub health: Option<String>,
}

impl From<ProjectNode> for Project {
    fn from(node: ProjectNode) -> Self {
        let updates = node
            .project_updates
            .unwrap_or_default()
            .nodes
            .into_iter()
            .map(|update| ProjectUpdate {
                body: update.body,
                created_at: update.created_at,
                author: update.user.map(|u| u.name).unwrap_or_default(),
            })
            .collect();

        Project {
            id: node.id,
            name: node.name,
            start_date: node.start_date,
            target_date: node.target_date,
            description: node.description.unwrap_or_default(),
            icon: node.icon,
            color: parse_color(node.color),
            url: node.url.unwrap_or_default(),
            status: node
                .status
                .map(|s| Status::from(s.name))
                .unwrap_or(Status::Planned),
            health: node.health.map(Health::from).unwrap_or_default(),
            updates,
            lead: node.lead.map(User::from),
            initiative_ids: node
                .initiatives
                .unwrap_or_default()
                .nodes
                .into_iter()
                .map(|i| i.id)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_with_nulls() {
        let raw = r##"{
            "id": "p1",
            "name": "Public API",
            "startDate": null,
            "targetDate": "2024-08-05",
            "description": null,
            "icon": "Rocket",
            "color": "#bec2c8",
            "url": "https://linear.app/acme/project/p1",
            "status": { "name": "In Progress" },
            "projectUpdates": { "nodes": [
                { "body": "All good", "createdAt": "2024-07-29T15:00:00.000Z", "user": { "name": "Grace Hopper" } }
            ] },
            "initiatives": { "nodes": [ { "id": "i1" } ] },
            "lead": null,
            "health": null
        }"##;
        let project: Project = serde_json::from_str::<ProjectNode>(raw).unwrap().into();

        assert_eq!(project.start_date, None);
        assert_eq!(project.color.as_ref().map(HexColor::as_str), Some("#bec2c8"));
        assert_eq!(project.target_date, NaiveDate::from_ymd_opt(2024, 8, 5));
        assert_eq!(project.description, "");
        assert_eq!(project.status, Status::InProgress);
        assert_eq!(project.health, Health::Unknown);
        assert_eq!(project.initiative_ids, vec!["i1"]);
        assert_eq!(project.updates.len(), 1);
        assert_eq!(project.updates[0].author, "Grace Hopper");
        assert!(project.lead.is_none());
    }

    #[test]
    fn test_initiative_owner() {
        let raw = r#"{
            "id": "i1",
            "name": "Platform",
            "description": "Make it fast",
            "targetDate": null,
            "status": "Completed",
            "icon": null,
            "color": null,
            "owner": { "name": "Ada Lovelace", "avatarUrl": "" }
        }"#;
        let initiative: Initiative = serde_json::from_str::<InitiativeNode>(raw).unwrap().into();

        assert_eq!(initiative.status, Status::Completed);
        assert_eq!(initiative.color, None);
        let owner = initiative.owner.unwrap();
        assert_eq!(owner.name, "Ada Lovelace");
        assert_eq!(owner.email, "");
        assert_eq!(owner.avatar_url, None);
    }

    #[test]
    fn test_malformed_color_is_dropped() {
        assert_eq!(parse_color(Some("blue".into())), None);
        assert_eq!(parse_color(None), None);
        assert_eq!(
            parse_color(Some("#5E6AD2".into())).as_ref().map(HexColor::as_str),
            Some("#5e6ad2")
        );
    }

    #[test]
    fn test_errors_become_api_error() {
        let response: GraphQlResponse<InitiativesData> = serde_json::from_str(
            r#"{ "data": null, "errors": [ { "message": "Authentication required" } ] }"#,
        )
        .unwrap();
        match response.into_data() {
            Err(Error::ApiError(message)) => assert_eq!(message, "Authentication required"),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
