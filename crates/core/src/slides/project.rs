//! Project slide: header, status subtitle and the latest project update.

use super::{avatar_url, image, text_box};
use crate::canvas::{Canvas, PageId, Rect};
use crate::emoji;
use crate::error::Result;
use crate::formatting::{
    colors, date_formatting, first_name, fit_font_size, health_formatting, health_icon_url,
    health_text, right_pad, status_formatting, subtitle_spans, Background, ParagraphAlignment,
    Section, TextFormatting,
};
use crate::markdown::MarkdownRenderer;
use crate::settings::Settings;
use crate::timeline::{classify, format_date};
use crate::types::{Initiative, Project};
use chrono::{DateTime, Utc};

const SEPARATOR: &str = " | ";

/// Region the latest update is rendered into.
const UPDATE_REGION: Rect = Rect {
    left: 50.0,
    top: 140.0,
    width: 600.0,
    height: 255.0,
};

/// Draw the slide of one project, nested under `initiative`.
pub fn populate(
    canvas: &mut dyn Canvas,
    page: &PageId,
    project: &Project,
    initiative: &Initiative,
    renderer: &MarkdownRenderer<'_>,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<()> {
    let secondary = TextFormatting::new().font_color(colors::TEXT_SECONDARY);

    let initiative_emoji = emoji::lookup(initiative.icon.as_deref());
    text_box(
        canvas,
        page,
        &secondary.clone().font_size(12.0),
        Rect::new(50.0, 30.0, 600.0, 20.0),
        &format!("{}{}", right_pad(initiative_emoji.as_deref()), initiative.name),
    )?;

    let project_emoji = emoji::lookup(project.icon.as_deref());
    text_box(
        canvas,
        page,
        &TextFormatting::new().bold(true).font_size(24.0),
        Rect::new(50.0, 48.0, 600.0, 40.0),
        &format!("{}{}", right_pad(project_emoji.as_deref()), project.name),
    )?;

    let description = match project.description.as_str() {
        "" => "No Description",
        text => text,
    };
    text_box(
        canvas,
        page,
        &secondary.clone().font_size(12.0),
        Rect::new(50.0, 105.0, 600.0, 20.0),
        description,
    )?;

    let subtitle_formatting = TextFormatting::new();
    let subtitle = text_box(
        canvas,
        page,
        &subtitle_formatting,
        Rect::new(50.0, 82.0, 600.0, 20.0),
        "",
    )?;
    let separator = Section::new(
        SEPARATOR,
        TextFormatting::new()
            .background(Background::Transparent)
            .font_color(colors::TEXT_SECONDARY),
    );
    let base = subtitle_formatting.resolve().run;
    for span in subtitle_spans(&subtitle_sections(project, now), &separator, &base) {
        canvas.append_span(&subtitle, span)?;
    }

    image(
        canvas,
        page,
        Rect::new(635.0, 40.0, 60.0, 60.0),
        &health_icon_url(project.health),
    )?;
    image(
        canvas,
        page,
        Rect::new(560.0, 40.0, 60.0, 60.0),
        avatar_url(project.lead.as_ref(), settings),
    )?;

    if let Some(update) = project.latest_update() {
        let body = renderer.render(
            canvas,
            page,
            UPDATE_REGION,
            &update.body,
            settings.update_font_size,
        )?;
        let text = canvas.shape_text(&body)?;
        let size = fit_font_size(&text, settings.update_font_size, UPDATE_REGION.height);
        if size != settings.update_font_size {
            log::debug!("Shrinking update of {} to {}pt", project.id, size);
            canvas.set_font_size(&body, size)?;
        }

        let author = match first_name(&update.author) {
            "" => "Unknown",
            name => name,
        };
        text_box(
            canvas,
            page,
            &secondary
                .paragraph_alignment(ParagraphAlignment::End)
                .font_size(10.0),
            Rect::new(480.0, 105.0, 220.0, 20.0),
            &format!(
                "Written by {} on {}",
                author,
                format_date(Some(update.created_at.date_naive()))
            ),
        )?;
    }

    Ok(())
}

/// `dates | health | status`, reduced for closed projects.
fn subtitle_sections(project: &Project, now: DateTime<Utc>) -> Vec<Section> {
    let status = Section::new(
        project.status.as_str(),
        status_formatting(&project.status),
    );
    if project.is_canceled() {
        return vec![status];
    }

    let schedule = classify(project.target_date, &project.status, now);
    let mut sections = vec![Section::new(
        format!(
            "{} -> {}",
            format_date(project.start_date),
            format_date(project.target_date)
        ),
        date_formatting(schedule, project.is_completed()),
    )];
    if !project.is_completed() {
        sections.push(Section::new(
            health_text(project.health),
            health_formatting(project.health),
        ));
    }
    sections.push(status);
    sections
}
