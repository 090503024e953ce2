//! Emoji lookup for initiative and project icons.
//!
//! The tracker stores icons as shortcodes or names (`"rocket"`, `":eyes:"`,
//! `"Megaphone"`, `"Lightbulb"`); slides need the actual characters.

/// Lowercase and drop separators so `"Light bulb"`, `"light_bulb"` and
/// `"Lightbulb"` compare equal.
fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// First emoji whose name or one of whose shortcodes contains `term`.
fn find_partial(term: &str) -> Option<&'static emojis::Emoji> {
    emojis::iter().find(|emoji| {
        compact(emoji.name()).contains(term)
            || emoji.shortcodes().any(|alias| compact(alias).contains(term))
    })
}

/// Resolve an icon shortcode to its emoji.
///
/// Matching is case-insensitive and ignores colons: an exact shortcode wins,
/// otherwise the first emoji (in Unicode order) whose name or shortcode
/// contains the term.
pub fn lookup(shortcode: Option<&str>) -> Option<String> {
    let term = shortcode?.to_lowercase().replace(':', "");
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    if let Some(emoji) = emojis::get_by_shortcode(term) {
        return Some(emoji.as_str().to_string());
    }

    let term = compact(term);
    if term.is_empty() {
        return None;
    }
    find_partial(&term).map(|emoji| emoji.as_str().to_string())
}
