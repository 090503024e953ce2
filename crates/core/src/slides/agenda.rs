//! Agenda slide: the list of all initiatives with the current one highlighted.

use super::{avatar_url, image, text_box};
use crate::canvas::{Canvas, PageId, Rect};
use crate::emoji;
use crate::error::Result;
use crate::formatting::{
    colors, date_formatting, right_pad, Background, ContentAlignment, TextFormatting,
};
use crate::settings::Settings;
use crate::timeline::{classify, format_date};
use crate::types::Initiative;
use chrono::{DateTime, Utc};

const FIRST_ROW_TOP: f64 = 50.0;
const ROW_SPACING: f64 = 25.0;

/// Draw one agenda row per initiative, highlighting `highlight_id`.
pub fn populate(
    canvas: &mut dyn Canvas,
    page: &PageId,
    initiatives: &[Initiative],
    highlight_id: &str,
    settings: &Settings,
    now: DateTime<Utc>,
) -> Result<()> {
    let mut top = FIRST_ROW_TOP;

    for initiative in initiatives {
        image(
            canvas,
            page,
            Rect::new(50.0, top, 20.0, 20.0),
            avatar_url(initiative.owner.as_ref(), settings),
        )?;

        if initiative.target_date.is_some() {
            let schedule = classify(initiative.target_date, &initiative.status, now);
            let formatting = date_formatting(schedule, initiative.is_completed())
                .font_size(14.0)
                .alignment(ContentAlignment::Middle);
            text_box(
                canvas,
                page,
                &formatting,
                Rect::new(500.0, top, 200.0, 20.0),
                &format_date(initiative.target_date),
            )?;
        }

        let mut formatting = TextFormatting::new()
            .bold(false)
            .alignment(ContentAlignment::Middle)
            .font_size(14.0);
        if initiative.id == highlight_id {
            formatting = formatting.background(Background::Solid(colors::HIGHLIGHT));
        }
        let emoji = emoji::lookup(initiative.icon.as_deref());
        text_box(
            canvas,
            page,
            &formatting,
            Rect::new(90.0, top, 420.0, 20.0),
            &format!("{}{}", right_pad(emoji.as_deref()), initiative.name),
        )?;

        top += ROW_SPACING;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ElementKind, MemoryCanvas};
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_one_row_per_initiative_with_highlight() {
        let mut canvas = MemoryCanvas::new("d", "https://slides.example/d");
        let page = canvas.append_page().unwrap();
        let mut a = Initiative::new("a", "Platform");
        a.icon = Some("rocket".into());
        a.target_date = NaiveDate::from_ymd_opt(2024, 9, 1);
        let b = Initiative::new("b", "Growth");

        populate(&mut canvas, &page, &[a, b], "b", &Settings::default(), now()).unwrap();

        let page = canvas.page(&page).unwrap();
        assert_eq!(page.images().count(), 2);
        assert!(page.contains_text("🚀 Platform"));
        assert!(page.contains_text("Sep 01"));

        let growth = page
            .text_boxes()
            .find(|e| e.text().as_deref() == Some("Growth"))
            .unwrap();
        assert_eq!(growth.rect.top, FIRST_ROW_TOP + ROW_SPACING);
        match &growth.kind {
            ElementKind::TextBox { style, .. } => {
                assert_eq!(style.fill, Background::Solid(colors::HIGHLIGHT));
            }
            other => panic!("unexpected element {:?}", other),
        }

        let platform = page
            .text_boxes()
            .find(|e| e.text().as_deref() == Some("🚀 Platform"))
            .unwrap();
        match &platform.kind {
            ElementKind::TextBox { style, .. } => assert_eq!(style.fill, Background::Unset),
            other => panic!("unexpected element {:?}", other),
        }
    }
}
