//! Linear API client.

use crate::queries::{INITIATIVES_QUERY, PROJECTS_QUERY};
use crate::wire::{GraphQlResponse, InitiativesData, ProjectsData};
use roadmap_core::sync::RoadmapSource;
use roadmap_core::types::sort_by_target_date;
use roadmap_core::{Error, Initiative, Project, Result};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// GraphQL endpoint of the Linear API.
pub const LINEAR_API_URL: &str = "https://api.linear.app/graphql";

/// Upper bound on project pages; a listing that never ends is an error.
const MAX_PAGES: usize = 200;

/// Sends a GraphQL request body and returns the raw response text.
pub trait Transport {
    fn post(&self, api_key: &str, body: &str) -> Result<String>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::with_url(LINEAR_API_URL)
    }

    /// Point the transport at another endpoint.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn post(&self, api_key: &str, body: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Authorization", api_key)
            // Short-lived signed URLs for uploaded images.
            .header("public-file-urls-expire-in", "60")
            .body(body.to_string())
            .send()
            .map_err(|e| Error::HttpError(format!("request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["errors"][0]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}: {}", status, text));
            return Err(Error::HttpError(format!("Linear API error: {}", message)));
        }

        Ok(text)
    }
}

/// Fetches initiatives and projects from Linear.
pub struct LinearClient<T: Transport = HttpTransport> {
    api_key: String,
    transport: T,
}

impl LinearClient<HttpTransport> {
    /// Client talking to the public Linear API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_transport(api_key, HttpTransport::new())
    }
}

impl<T: Transport> LinearClient<T> {
    pub fn with_transport(api_key: impl Into<String>, transport: T) -> Self {
        Self {
            api_key: api_key.into(),
            transport,
        }
    }

    fn query<D: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<D> {
        let body = json!({ "query": query, "variables": variables }).to_string();
        let text = self.transport.post(&self.api_key, &body)?;
        let response: GraphQlResponse<D> = serde_json::from_str(&text)?;
        response.into_data()
    }

    /// All initiatives, in API order.
    pub fn fetch_initiatives(&self) -> Result<Vec<Initiative>> {
        let data: InitiativesData = self.query(INITIATIVES_QUERY, json!({}))?;
        let initiatives: Vec<Initiative> = data
            .initiatives
            .nodes
            .into_iter()
            .map(Initiative::from)
            .collect();
        log::info!("Fetched {} initiatives", initiatives.len());
        Ok(initiatives)
    }

    /// Every project that belongs to at least one initiative, sorted by target date.
    pub fn fetch_projects(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 1.. {
            if page > MAX_PAGES {
                return Err(Error::ApiError(format!(
                    "projects did not fit in {} pages",
                    MAX_PAGES
                )));
            }
            let data: ProjectsData =
                self.query(PROJECTS_QUERY, json!({ "endCursor": cursor }))?;
            let connection = data.projects;
            log::debug!("Projects page {}: {} nodes", page, connection.nodes.len());
            projects.extend(connection.nodes.into_iter().map(Project::from));

            match connection.page_info {
                Some(info) if info.has_next_page && info.end_cursor.is_some() => {
                    cursor = info.end_cursor;
                }
                _ => break,
            }
        }

        sort_by_target_date(&mut projects);
        projects.retain(|p| !p.initiative_ids.is_empty());
        log::info!("Fetched {} projects", projects.len());
        Ok(projects)
    }
}

impl<T: Transport> RoadmapSource for LinearClient<T> {
    fn initiatives(&self) -> Result<Vec<Initiative>> {
        self.fetch_initiatives()
    }

    fn projects(&self) -> Result<Vec<Project>> {
        self.fetch_projects()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned responses and records request bodies.
    struct Canned {
        responses: RefCell<VecDeque<String>>,
        requests: RefCell<Vec<(String, Value)>>,
    }

    impl Canned {
        fn new(responses: Vec<String>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn post(&self, api_key: &str, body: &str) -> Result<String> {
            let body: Value = serde_json::from_str(body)?;
            self.requests.borrow_mut().push((api_key.to_string(), body));
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| Error::HttpError("no more canned responses".into()))
        }
    }

    fn project_node(id: &str, target: Option<&str>, initiatives: &[&str]) -> Value {
        json!({
            "id": id,
            "name": format!("Project {}", id),
            "targetDate": target,
            "status": { "name": "Planned" },
            "projectUpdates": { "nodes": [] },
            "initiatives": { "nodes": initiatives.iter().map(|i| json!({ "id": i })).collect::<Vec<_>>() },
            "health": "onTrack"
        })
    }

    fn projects_page(nodes: Vec<Value>, next: Option<&str>) -> String {
        json!({
            "data": {
                "projects": {
                    "pageInfo": { "hasNextPage": next.is_some(), "endCursor": next },
                    "nodes": nodes
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_projects_are_paginated_sorted_and_filtered() {
        let transport = Canned::new(vec![
            projects_page(
                vec![
                    project_node("a", Some("2024-09-01"), &["i1"]),
                    project_node("orphan", Some("2024-01-01"), &[]),
                ],
                Some("cursor-1"),
            ),
            projects_page(
                vec![
                    project_node("b", None, &["i1"]),
                    project_node("c", Some("2024-08-01"), &["i2"]),
                ],
                None,
            ),
        ]);
        let client = LinearClient::with_transport("lin_api_key", transport);

        let projects = client.fetch_projects().unwrap();
        let ids: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(projects[0].target_date, NaiveDate::from_ymd_opt(2024, 8, 1));

        let requests = client.transport.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].0, "lin_api_key");
        assert_eq!(requests[0].1["variables"]["endCursor"], Value::Null);
        assert_eq!(requests[1].1["variables"]["endCursor"], "cursor-1");
        assert!(requests[1].1["query"].as_str().unwrap().contains("first: 50"));
    }

    #[test]
    fn test_initiatives() {
        let transport = Canned::new(vec![r#"{
            "data": { "initiatives": { "nodes": [
                { "id": "i1", "name": "Platform", "status": "In Progress", "targetDate": "2024-12-31",
                  "owner": { "name": "Ada", "avatarUrl": "https://img.example/ada.png" } }
            ] } }
        }"#
        .to_string()]);
        let client = LinearClient::with_transport("key", transport);

        let initiatives = client.initiatives().unwrap();
        assert_eq!(initiatives.len(), 1);
        assert_eq!(initiatives[0].name, "Platform");
        assert_eq!(
            initiatives[0].owner.as_ref().and_then(|o| o.avatar_url.as_deref()),
            Some("https://img.example/ada.png")
        );
    }

    #[test]
    fn test_graphql_errors_surface() {
        let transport = Canned::new(vec![
            r#"{ "errors": [ { "message": "Invalid API key" } ] }"#.to_string(),
        ]);
        let client = LinearClient::with_transport("bad", transport);

        assert!(matches!(client.projects(), Err(Error::ApiError(m)) if m == "Invalid API key"));
    }

    #[test]
    fn test_endless_pagination_is_an_error() {
        let pages = (0..=MAX_PAGES)
            .map(|i| {
                let node = project_node(&format!("p{}", i), None, &["i1"]);
                projects_page(vec![node], Some("again"))
            })
            .collect();
        let client = LinearClient::with_transport("key", Canned::new(pages));

        assert!(matches!(client.projects(), Err(Error::ApiError(_))));
        assert_eq!(client.transport.requests.borrow().len(), MAX_PAGES);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let client = LinearClient::with_transport("key", Canned::new(Vec::new()));
        assert!(matches!(client.initiatives(), Err(Error::HttpError(_))));
    }
}
