//! Presentational attributes for roadmap entities.
//!
//! Maps statuses, health values and schedules to colours, composes partial
//! [`TextFormatting`] records over defaults, and estimates font sizes that fit
//! a text box.

use crate::canvas::{Span, TextRun};
use crate::error::{Error, Result};
use crate::timeline::Schedule;
use crate::types::{Health, Status};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A `#rrggbb` colour.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexColor(Cow<'static, str>);

impl HexColor {
    /// Wrap a colour literal. The literal is trusted.
    pub const fn from_static(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    /// Validate and wrap a colour string.
    pub fn parse(value: &str) -> Result<Self> {
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| Error::InvalidColor(value.to_string()))?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(value.to_string()));
        }
        Ok(Self(Cow::Owned(value.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Colour constants used across slides.
pub mod colors {
    use super::HexColor;

    pub const TEXT_PRIMARY: HexColor = HexColor::from_static("#595959");
    pub const TEXT_SECONDARY: HexColor = HexColor::from_static("#999999");
    pub const HIGHLIGHT: HexColor = HexColor::from_static("#FFFF99");

    pub const BACKGROUND_AT_RISK: HexColor = HexColor::from_static("#f6eacb");
    pub const FONT_AT_RISK: HexColor = HexColor::from_static("#d9a800");
    pub const BACKGROUND_OFF_TRACK: HexColor = HexColor::from_static("#f3cece");
    pub const FONT_OFF_TRACK: HexColor = HexColor::from_static("#d24044");
    pub const BACKGROUND_ON_TRACK: HexColor = HexColor::from_static("#c8e1ca");
    pub const FONT_ON_TRACK: HexColor = HexColor::from_static("#009030");
    pub const BACKGROUND_UNKNOWN_HEALTH: HexColor = HexColor::from_static("#d6d6d6");
    pub const FONT_UNKNOWN_HEALTH: HexColor = HexColor::from_static("#a0a0a2");

    pub const BACKGROUND_COMPLETED: HexColor = HexColor::from_static("#aac4fd");
    pub const FONT_COMPLETED: HexColor = HexColor::from_static("#5d6ad2");
    pub const BACKGROUND_IN_PROGRESS: HexColor = HexColor::from_static("#f6eacb");
    pub const FONT_IN_PROGRESS: HexColor = HexColor::from_static("#d9a800");
    pub const BACKGROUND_PLANNED: HexColor = HexColor::from_static("#d9d9d9");
    pub const FONT_PLANNED: HexColor = HexColor::from_static("#666666");
    pub const BACKGROUND_CANCELED: HexColor = HexColor::from_static("#000000");
    pub const FONT_CANCELED: HexColor = HexColor::from_static("#ea9999");
    pub const FONT_UNKNOWN_STATUS: HexColor = HexColor::from_static("#595959");
}

const HEALTH_ICON_BASE: &str = "https://liamhorne.com/assets/img/icons";

/// Font used when the caller does not pick one.
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

/// Font size used when the caller does not pick one.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Background of a text box or text run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "color")]
pub enum Background {
    /// Leave whatever the host uses by default.
    #[default]
    Unset,
    /// Explicitly clear the background.
    Transparent,
    Solid(HexColor),
}

/// Vertical alignment of content inside a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// Horizontal alignment of paragraphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphAlignment {
    #[default]
    Start,
    Center,
    End,
}

/// A partial set of visual attributes.
///
/// Every field is optional; callers build a record with only the attributes
/// they care about and [`merge`](Self::merge) it over computed defaults.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextFormatting {
    pub font_color: Option<HexColor>,
    pub background: Option<Background>,
    pub highlight_color: Option<HexColor>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub alignment: Option<ContentAlignment>,
    pub paragraph_alignment: Option<ParagraphAlignment>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
}

impl TextFormatting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn font_color(mut self, color: HexColor) -> Self {
        self.font_color = Some(color);
        self
    }

    pub fn background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    pub fn highlight(mut self, color: HexColor) -> Self {
        self.highlight_color = Some(color);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.bold = Some(bold);
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = Some(italic);
        self
    }

    pub fn alignment(mut self, alignment: ContentAlignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn paragraph_alignment(mut self, alignment: ParagraphAlignment) -> Self {
        self.paragraph_alignment = Some(alignment);
        self
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Overlay `self` on top of `defaults`: fields set here win.
    pub fn merge(&self, defaults: &TextFormatting) -> TextFormatting {
        TextFormatting {
            font_color: self.font_color.clone().or_else(|| defaults.font_color.clone()),
            background: self.background.clone().or_else(|| defaults.background.clone()),
            highlight_color: self
                .highlight_color
                .clone()
                .or_else(|| defaults.highlight_color.clone()),
            bold: self.bold.or(defaults.bold),
            italic: self.italic.or(defaults.italic),
            alignment: self.alignment.or(defaults.alignment),
            paragraph_alignment: self.paragraph_alignment.or(defaults.paragraph_alignment),
            font_family: self.font_family.clone().or_else(|| defaults.font_family.clone()),
            font_size: self.font_size.or(defaults.font_size),
        }
    }

    /// Fill every missing attribute with the box defaults.
    pub fn resolve(&self) -> TextStyle {
        TextStyle {
            fill: self.background.clone().unwrap_or_default(),
            alignment: self.alignment.unwrap_or_default(),
            paragraph_alignment: self.paragraph_alignment.unwrap_or_default(),
            run: RunStyle {
                font_family: self
                    .font_family
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
                font_size: self.font_size.unwrap_or(DEFAULT_FONT_SIZE),
                bold: self.bold.unwrap_or(false),
                italic: self.italic.unwrap_or(false),
                font_color: self.font_color.clone(),
                background: match &self.highlight_color {
                    Some(color) => Background::Solid(color.clone()),
                    None => Background::Unset,
                },
                link: None,
            },
        }
    }

    /// Apply this record to a run, treating `background` as the text background.
    pub fn apply_to_run(&self, base: &RunStyle) -> RunStyle {
        let mut run = base.clone();
        if let Some(family) = &self.font_family {
            run.font_family = family.clone();
        }
        if let Some(size) = self.font_size {
            run.font_size = size;
        }
        if let Some(bold) = self.bold {
            run.bold = bold;
        }
        if let Some(italic) = self.italic {
            run.italic = italic;
        }
        if let Some(color) = &self.font_color {
            run.font_color = Some(color.clone());
        }
        if let Some(background) = &self.background {
            run.background = background.clone();
        }
        if let Some(color) = &self.highlight_color {
            run.background = Background::Solid(color.clone());
        }
        run
    }
}

/// Fully-resolved attributes of a text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    pub font_family: String,
    pub font_size: f64,
    pub bold: bool,
    pub italic: bool,
    pub font_color: Option<HexColor>,
    pub background: Background,
    pub link: Option<String>,
}

impl RunStyle {
    /// Plain text in the default family at the given size.
    pub fn plain(font_size: f64) -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size,
            bold: false,
            italic: false,
            font_color: None,
            background: Background::Unset,
            link: None,
        }
    }

    pub fn with_bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link = Some(url.into());
        self
    }
}

impl Default for RunStyle {
    fn default() -> Self {
        Self::plain(DEFAULT_FONT_SIZE)
    }
}

/// Fully-resolved attributes of a text box.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextStyle {
    /// Shape fill.
    pub fill: Background,
    pub alignment: ContentAlignment,
    pub paragraph_alignment: ParagraphAlignment,
    /// Style of the box's initial text and default for appended runs.
    pub run: RunStyle,
}

fn pair(background: HexColor, font: HexColor) -> TextFormatting {
    TextFormatting::new()
        .background(Background::Solid(background))
        .font_color(font)
}

/// Colours for a project health badge. Unknown health gets a neutral grey pair.
pub fn health_formatting(health: Health) -> TextFormatting {
    match health {
        Health::AtRisk => pair(colors::BACKGROUND_AT_RISK, colors::FONT_AT_RISK),
        Health::OffTrack => pair(colors::BACKGROUND_OFF_TRACK, colors::FONT_OFF_TRACK),
        Health::OnTrack => pair(colors::BACKGROUND_ON_TRACK, colors::FONT_ON_TRACK),
        Health::Unknown => pair(
            colors::BACKGROUND_UNKNOWN_HEALTH,
            colors::FONT_UNKNOWN_HEALTH,
        ),
    }
}

/// Colours for a status badge. Unrecognised statuses get no background.
pub fn status_formatting(status: &Status) -> TextFormatting {
    match status {
        Status::Completed => pair(colors::BACKGROUND_COMPLETED, colors::FONT_COMPLETED),
        Status::InProgress => pair(colors::BACKGROUND_IN_PROGRESS, colors::FONT_IN_PROGRESS),
        Status::Planned => pair(colors::BACKGROUND_PLANNED, colors::FONT_PLANNED),
        Status::Canceled => pair(colors::BACKGROUND_CANCELED, colors::FONT_CANCELED),
        Status::Other(_) => TextFormatting::new()
            .background(Background::Unset)
            .font_color(colors::FONT_UNKNOWN_STATUS),
    }
}

/// Colours for a target date given its schedule classification.
pub fn date_formatting(schedule: Schedule, completed: bool) -> TextFormatting {
    let formatting = match schedule {
        Schedule::Closed if completed => pair(colors::BACKGROUND_COMPLETED, colors::FONT_COMPLETED),
        Schedule::Overdue => pair(colors::BACKGROUND_OFF_TRACK, colors::FONT_OFF_TRACK),
        Schedule::DueSoon => pair(colors::BACKGROUND_AT_RISK, colors::FONT_AT_RISK),
        _ => TextFormatting::new()
            .background(Background::Transparent)
            .font_color(colors::TEXT_SECONDARY),
    };
    formatting.bold(false)
}

/// Human label for a health value.
pub fn health_text(health: Health) -> &'static str {
    match health {
        Health::AtRisk => "At Risk",
        Health::OffTrack => "Off Track",
        Health::OnTrack => "On Track",
        Health::Unknown => "Unknown",
    }
}

/// Icon shown next to a project for its health.
pub fn health_icon_url(health: Health) -> String {
    let name = match health {
        Health::AtRisk => "atrisk",
        Health::OffTrack => "offtrack",
        Health::OnTrack => "ontrack",
        Health::Unknown => "unknown",
    };
    format!("{}/{}.png", HEALTH_ICON_BASE, name)
}

/// Icon shown next to a project for its status. Unknown statuses use "planned".
pub fn status_icon_url(status: &Status) -> String {
    let name = match status {
        Status::InProgress => "progress",
        Status::Completed => "completed",
        Status::Canceled => "canceled",
        Status::Planned | Status::Other(_) => "planned",
    };
    format!("{}/{}.png", HEALTH_ICON_BASE, name)
}

/// `"x "` for a present value, empty otherwise.
pub fn right_pad(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => format!("{} ", v),
        _ => String::new(),
    }
}

/// First whitespace-separated word of a display name.
pub fn first_name(name: &str) -> &str {
    name.split(' ').next().unwrap_or(name)
}

/// One `text | style` segment of a subtitle line.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub text: String,
    pub style: TextFormatting,
}

impl Section {
    pub fn new(text: impl Into<String>, style: TextFormatting) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Join sections with styled separators into a list of runs.
pub fn subtitle_spans(
    sections: &[Section],
    separator: &Section,
    base: &RunStyle,
) -> Vec<Span> {
    let mut spans = Vec::with_capacity(sections.len() * 2);
    for (idx, section) in sections.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::Run(TextRun::new(
                separator.text.clone(),
                separator.style.apply_to_run(base),
            )));
        }
        spans.push(Span::Run(TextRun::new(
            section.text.clone(),
            section.style.apply_to_run(base),
        )));
    }
    spans
}

/// Width of a slide in points used to estimate characters per line.
const LINE_WIDTH_BUDGET: f64 = 1280.0;

/// Estimate how many lines `text` wraps into at `font_size`.
pub fn estimated_line_count(text: &str, font_size: f64) -> usize {
    let max_chars = (LINE_WIDTH_BUDGET / font_size).floor().max(1.0) as usize;
    text.split('\n')
        .map(|line| line.chars().count().div_ceil(max_chars))
        .sum()
}

/// Largest font size (at most `default_size`) whose estimated height fits.
///
/// Texts shorter than ten characters always keep `default_size`.
pub fn fit_font_size(text: &str, default_size: f64, max_height: f64) -> f64 {
    if text.chars().count() < 10 {
        return default_size;
    }

    let mut size = default_size.floor();
    while size > 1.0 {
        let height = estimated_line_count(text, size) as f64 * size * 1.8;
        if height <= max_height {
            break;
        }
        size -= 1.0;
    }
    size
}
