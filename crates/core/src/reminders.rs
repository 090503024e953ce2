//! Reminder emails asking project leads to fill in their slides.

use crate::cache::{SlideCache, SlideKind};
use crate::canvas::Canvas;
use crate::error::Result;
use crate::store::KeyValueStore;
use crate::sync::RoadmapSource;
use crate::timeline::{format_date, is_due_soon, is_overdue};
use crate::types::{Health, Project, Status, User};
use askama::Template;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A composed HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivers emails.
pub trait Notifier {
    fn send(&mut self, email: &Email) -> Result<()>;
}

/// Outcome of a reminder run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub sent: usize,
    pub failed: usize,
}

/// Body of a reminder email.
#[derive(Template)]
#[template(path = "reminder.html")]
struct ReminderEmail<'a> {
    lead_name: &'a str,
    meeting_name: &'a str,
    rows: Vec<ReminderRow<'a>>,
}

/// One project line of the reminder table.
struct ReminderRow<'a> {
    name: &'a str,
    url: &'a str,
    prompts: Vec<String>,
}

/// What the lead should write about, one prompt per concern.
pub fn prompts(project: &Project, now: DateTime<Utc>) -> Vec<String> {
    let mut prompts = Vec::new();
    let target = format_date(project.target_date);

    match project.status {
        Status::Completed => {
            prompts.push("Project completed. Summarize outcomes and learnings.".to_string());
        }
        Status::Canceled => {
            prompts.push("Project canceled. Explain reasons and next steps.".to_string());
        }
        _ => {
            if let Some(date) = project.target_date {
                if is_overdue(date, now) {
                    prompts.push(format!(
                        "Project overdue since {}. Update slide with new deadline and issues.",
                        target
                    ));
                }
                if is_due_soon(date, now) {
                    prompts.push(format!(
                        "Project due this week ({}). Update slide with current status and confidence.",
                        target
                    ));
                }
            }
            match project.health {
                Health::OffTrack => prompts
                    .push("Project off track. Explain issues and recovery plan.".to_string()),
                Health::AtRisk => prompts
                    .push("Project at risk. Explain risks and mitigation plan.".to_string()),
                Health::OnTrack | Health::Unknown => {}
            }
        }
    }

    prompts
}

fn render_body(
    lead: &User,
    projects: &[&Project],
    slide_urls: &BTreeMap<String, String>,
    now: DateTime<Utc>,
    meeting_name: &str,
) -> Result<String> {
    let rows = projects
        .iter()
        .map(|project| ReminderRow {
            name: &project.name,
            url: slide_urls
                .get(&project.id)
                .map(String::as_str)
                .unwrap_or(&project.url),
            prompts: prompts(project, now),
        })
        .collect();

    let email = ReminderEmail {
        lead_name: &lead.name,
        meeting_name,
        rows,
    };
    Ok(email.render()?)
}

/// One email per project lead listing the slides they own.
///
/// Projects without a lead, or whose lead has no email address, are skipped.
/// Recipients appear in the order their first project does.
pub fn compose_reminders(
    projects: &[Project],
    slide_urls: &BTreeMap<String, String>,
    now: DateTime<Utc>,
    meeting_name: &str,
) -> Result<Vec<Email>> {
    let mut groups: Vec<(&User, Vec<&Project>)> = Vec::new();
    for project in projects {
        let Some(lead) = project.lead.as_ref().filter(|u| !u.email.is_empty()) else {
            log::debug!("Skipping {}: no lead email", project.id);
            continue;
        };
        match groups.iter_mut().find(|(user, _)| user.email == lead.email) {
            Some((_, owned)) => owned.push(project),
            None => groups.push((lead, vec![project])),
        }
    }

    groups
        .into_iter()
        .map(|(lead, owned)| {
            Ok(Email {
                to: lead.email.clone(),
                subject: format!("SLIDES ASSIGNED: {} Projects", owned.len()),
                html_body: render_body(lead, &owned, slide_urls, now, meeting_name)?,
            })
        })
        .collect()
}

/// Email every project lead a link to their slides.
///
/// Returns early when no project slides were ever generated for this deck or
/// the tracker has no projects. Delivery failures are logged and counted.
pub fn send_reminders(
    canvas: &dyn Canvas,
    store: &dyn KeyValueStore,
    source: &dyn RoadmapSource,
    notifier: &mut dyn Notifier,
    now: DateTime<Utc>,
    meeting_name: &str,
) -> Result<ReminderReport> {
    let presentation_id = canvas.presentation_id();
    let key = SlideKind::Project.store_key(presentation_id);
    let mut report = ReminderReport::default();

    let Some(raw) = store.get(&key)? else {
        log::info!("No project slide map found in cache.");
        return Ok(report);
    };
    let cache = SlideCache::decode(SlideKind::Project, &key, &raw)?;

    let projects = source.projects()?;
    if projects.is_empty() {
        log::info!("No projects found. Cannot send emails.");
        return Ok(report);
    }

    let slide_urls: BTreeMap<String, String> = cache
        .iter()
        .map(|(project_id, page)| (project_id.to_string(), canvas.slide_url(page)))
        .collect();

    for email in compose_reminders(&projects, &slide_urls, now, meeting_name)? {
        match notifier.send(&email) {
            Ok(()) => {
                log::info!("Sent reminder to {}", email.to);
                report.sent += 1;
            }
            Err(e) => {
                log::error!("Failed to send reminder to {}: {}", email.to, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
