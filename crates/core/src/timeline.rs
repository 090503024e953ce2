//! Date classification and date formatting for slides and reminders.
//!
//! Target dates are calendar dates; they are compared against the evaluation
//! time as midnight UTC of that day.

use crate::types::Status;
use chrono::{DateTime, NaiveDate, Utc};

/// Number of days ahead of the target date during which an item is "due soon".
pub const DUE_SOON_DAYS: i64 = 7;

/// Schedule classification of a dated item at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Completed or canceled; no longer on a schedule.
    Closed,
    /// The target date is in the past.
    Overdue,
    /// The target date is within the next [`DUE_SOON_DAYS`] days.
    DueSoon,
    /// The target date is further away.
    OnSchedule,
    /// No target date was set.
    Unscheduled,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// Whether the target date lies strictly before `now`.
pub fn is_overdue(target: NaiveDate, now: DateTime<Utc>) -> bool {
    start_of_day(target) < now
}

/// Whole days from `now` until the target date, rounded towards negative infinity.
pub fn days_until(target: NaiveDate, now: DateTime<Utc>) -> i64 {
    let millis = (start_of_day(target) - now).num_milliseconds();
    millis.div_euclid(24 * 60 * 60 * 1000)
}

/// Whether the target date is between now and [`DUE_SOON_DAYS`] days ahead.
pub fn is_due_soon(target: NaiveDate, now: DateTime<Utc>) -> bool {
    (0..=DUE_SOON_DAYS).contains(&days_until(target, now))
}

/// Classify a target date for formatting and reminder prompts.
///
/// Closed items are exempt from date classification. Overdue wins over due soon.
pub fn classify(target: Option<NaiveDate>, status: &Status, now: DateTime<Utc>) -> Schedule {
    if status.is_closed() {
        return Schedule::Closed;
    }
    match target {
        None => Schedule::Unscheduled,
        Some(date) if is_overdue(date, now) => Schedule::Overdue,
        Some(date) if is_due_soon(date, now) => Schedule::DueSoon,
        Some(_) => Schedule::OnSchedule,
    }
}

/// Short month and day, e.g. `"Mar 05"`; `"TBD"` when there is no date.
pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%b %d").to_string(),
        None => "TBD".to_string(),
    }
}

/// Timestamp stamped onto generated slides, e.g. `"Oct 19, 2026, 06:20 AM UTC"`.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%b %d, %Y, %I:%M %p UTC").to_string()
}
