//! Per-entity slide layouts.
//!
//! Each layout draws onto an already-cleared page obtained from the slide
//! cache. Coordinates assume a 720×405 point page.

pub mod agenda;
pub mod initiative;
pub mod project;

use crate::canvas::{Canvas, ElementId, ImageSource, PageId, Rect};
use crate::error::Result;
use crate::formatting::TextFormatting;
use crate::settings::Settings;
use crate::types::User;

/// Insert a text box with a partial formatting record resolved over defaults.
pub(crate) fn text_box(
    canvas: &mut dyn Canvas,
    page: &PageId,
    formatting: &TextFormatting,
    rect: Rect,
    text: &str,
) -> Result<ElementId> {
    canvas.insert_text_box(page, rect, &formatting.resolve(), text)
}

/// Insert an image the host downloads from `url`.
pub(crate) fn image(
    canvas: &mut dyn Canvas,
    page: &PageId,
    rect: Rect,
    url: &str,
) -> Result<ElementId> {
    canvas.insert_image(page, rect, ImageSource::Url(url.to_string()), None)
}

/// Avatar of a user, or the configured placeholder.
pub(crate) fn avatar_url<'a>(user: Option<&'a User>, settings: &'a Settings) -> &'a str {
    user.and_then(|u| u.avatar_url.as_deref())
        .filter(|url| !url.is_empty())
        .unwrap_or(&settings.default_avatar_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_falls_back_to_placeholder() {
        let settings = Settings::default();
        let mut user = User::new("Ada");
        assert_eq!(avatar_url(Some(&user), &settings), settings.default_avatar_url);
        assert_eq!(avatar_url(None, &settings), settings.default_avatar_url);

        user.avatar_url = Some("https://img.example/ada.png".into());
        assert_eq!(avatar_url(Some(&user), &settings), "https://img.example/ada.png");
    }
}
