//! Initiative slide: header, description and the list of its projects.

use super::{avatar_url, image, text_box};
use crate::canvas::{Canvas, PageId, Rect, Span, TextRun};
use crate::emoji;
use crate::error::Result;
use crate::formatting::{
    colors, date_formatting, health_icon_url, right_pad, status_icon_url, ContentAlignment,
    RunStyle, TextFormatting,
};
use crate::settings::Settings;
use crate::timeline::{classify, format_date};
use crate::types::{InitiativeWithProjects, Project};
use chrono::{DateTime, Utc};

const PROJECT_LIST_CENTER: f64 = 190.0;
const PROJECT_SPACING: f64 = 45.0;
const PROJECT_FONT_SIZE: f64 = 12.0;

/// Draw the slide of one initiative and its projects.
pub fn populate(
    canvas: &mut dyn Canvas,
    page: &PageId,
    entry: &InitiativeWithProjects,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<()> {
    let initiative = &entry.initiative;
    let emoji = emoji::lookup(initiative.icon.as_deref());

    if settings.with_assignee_avatars {
        image(
            canvas,
            page,
            Rect::new(35.0, 90.0, 55.0, 55.0),
            avatar_url(initiative.owner.as_ref(), settings),
        )?;
    } else {
        text_box(
            canvas,
            page,
            &TextFormatting::new()
                .alignment(ContentAlignment::Middle)
                .font_size(30.0),
            Rect::new(30.0, 90.0, 200.0, 50.0),
            emoji.as_deref().unwrap_or_default(),
        )?;
    }

    let title = if settings.with_assignee_avatars {
        format!("{}{}", right_pad(emoji.as_deref()), initiative.name)
    } else {
        initiative.name.clone()
    };
    text_box(
        canvas,
        page,
        &TextFormatting::new()
            .alignment(ContentAlignment::Middle)
            .font_size(24.0)
            .bold(true),
        Rect::new(30.0, 170.0, 350.0, 50.0),
        &title,
    )?;

    let description = match initiative.description.trim() {
        "" => "No description",
        text => text,
    };
    text_box(
        canvas,
        page,
        &TextFormatting::new()
            .font_color(colors::TEXT_SECONDARY)
            .font_size(14.0),
        Rect::new(30.0, 240.0, 350.0, 50.0),
        &format!(
            "{}\n\nTimeline -> {}",
            description,
            format_date(initiative.target_date)
        ),
    )?;

    // The list is vertically centred around the middle of the page.
    let mut top = PROJECT_LIST_CENTER - entry.projects.len() as f64 * 20.0;
    for project in &entry.projects {
        project_item(canvas, page, project, top, settings, now)?;
        top += PROJECT_SPACING;
    }

    Ok(())
}

fn project_item(
    canvas: &mut dyn Canvas,
    page: &PageId,
    project: &Project,
    top: f64,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<()> {
    image(
        canvas,
        page,
        Rect::new(384.0, top, 26.0, 26.0),
        avatar_url(project.lead.as_ref(), settings),
    )?;

    let base = RunStyle::plain(PROJECT_FONT_SIZE);
    let item = text_box(
        canvas,
        page,
        &TextFormatting::new().font_size(PROJECT_FONT_SIZE),
        Rect::new(410.0, top - 10.0, 250.0, 30.0),
        "",
    )?;

    let emoji = emoji::lookup(project.icon.as_deref());
    canvas.append_span(
        &item,
        Span::Run(TextRun::new(
            format!("{}{}\n", right_pad(emoji.as_deref()), project.name),
            base.clone().with_bold(),
        )),
    )?;

    let schedule = classify(project.target_date, &project.status, now);
    let dates = format!(
        "{} -> {}",
        format_date(project.start_date),
        format_date(project.target_date)
    );
    canvas.append_span(
        &item,
        Span::Run(TextRun::new(
            dates,
            date_formatting(schedule, project.is_completed()).apply_to_run(&base),
        )),
    )?;

    image(
        canvas,
        page,
        Rect::new(655.0, top, 20.0, 20.0),
        &status_icon_url(&project.status),
    )?;
    image(
        canvas,
        page,
        Rect::new(680.0, top, 20.0, 20.0),
        &health_icon_url(project.health),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::ImageSource;
    use crate::formatting::Background;
    use crate::memory::{ElementKind, MemoryCanvas};
    use crate::types::{Health, Initiative, Status, User};
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap()
    }

    fn entry() -> InitiativeWithProjects {
        let mut initiative = Initiative::new("i1", "Platform");
        initiative.icon = Some("rocket".into());
        initiative.target_date = NaiveDate::from_ymd_opt(2024, 12, 31);

        let mut api = Project::new("p1", "Public API").in_initiative("i1");
        api.start_date = NaiveDate::from_ymd_opt(2024, 7, 1);
        api.target_date = NaiveDate::from_ymd_opt(2024, 7, 20);
        api.status = Status::InProgress;
        api.health = Health::OffTrack;

        let mut docs = Project::new("p2", "Docs").in_initiative("i1");
        docs.lead = Some(User {
            avatar_url: Some("https://img.example/lead.png".into()),
            ..User::new("Grace Hopper")
        });

        InitiativeWithProjects {
            initiative,
            projects: vec![api, docs],
        }
    }

    fn image_urls(canvas: &MemoryCanvas, page: &PageId) -> Vec<String> {
        canvas
            .page(page)
            .unwrap()
            .images()
            .filter_map(|e| match &e.kind {
                ElementKind::Image {
                    source: ImageSource::Url(url),
                    ..
                } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_header_with_emoji() {
        let mut canvas = MemoryCanvas::new("d", "https://slides.example/d");
        let page = canvas.append_page().unwrap();
        populate(&mut canvas, &page, &entry(), &Settings::default(), now()).unwrap();

        let drawn = canvas.page(&page).unwrap();
        assert!(drawn.contains_text("🚀"));
        assert!(drawn.contains_text("Platform"));
        assert!(drawn.contains_text("No description\n\nTimeline -> Dec 31"));
        assert!(!drawn.contains_text("🚀 Platform"));
    }

    #[test]
    fn test_header_with_avatar() {
        let settings = Settings {
            with_assignee_avatars: true,
            ..Settings::default()
        };
        let mut canvas = MemoryCanvas::new("d", "https://slides.example/d");
        let page = canvas.append_page().unwrap();
        populate(&mut canvas, &page, &entry(), &settings, now()).unwrap();

        let drawn = canvas.page(&page).unwrap();
        assert!(drawn.contains_text("🚀 Platform"));
        // Owner avatar plus avatar, status and health per project.
        assert_eq!(drawn.images().count(), 1 + 2 * 3);
    }

    #[test]
    fn test_project_rows() {
        let mut canvas = MemoryCanvas::new("d", "https://slides.example/d");
        let page = canvas.append_page().unwrap();
        populate(&mut canvas, &page, &entry(), &Settings::default(), now()).unwrap();

        let urls = image_urls(&canvas, &page);
        assert_eq!(urls.len(), 6);
        assert!(urls[0].ends_with("unknown.png"));
        assert!(urls[1].ends_with("progress.png"));
        assert!(urls[2].ends_with("offtrack.png"));
        assert_eq!(urls[3], "https://img.example/lead.png");

        let drawn = canvas.page(&page).unwrap();
        let api = drawn
            .text_boxes()
            .find(|e| e.text().is_some_and(|t| t.starts_with("Public API")))
            .unwrap();
        assert_eq!(api.text().unwrap(), "Public API\nJul 01 -> Jul 20");
        assert_eq!(api.rect.top, PROJECT_LIST_CENTER - 40.0 - 10.0);

        match &api.kind {
            ElementKind::TextBox { spans, .. } => {
                let (Span::Run(name), Span::Run(dates)) = (&spans[0], &spans[1]) else {
                    panic!("expected two runs, got {:?}", spans);
                };
                assert!(name.style.bold);
                assert!(!dates.style.bold);
                assert_eq!(dates.style.font_color, Some(colors::FONT_OFF_TRACK));
                assert_eq!(
                    dates.style.background,
                    Background::Solid(colors::BACKGROUND_OFF_TRACK)
                );
            }
            other => panic!("unexpected element {:?}", other),
        }

        assert!(drawn.contains_text("Docs\nTBD -> TBD"));
    }
}
