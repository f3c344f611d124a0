//! Minute-of-day conversions and free-text time parsing.
//!
//! All schedule arithmetic happens in day-local minutes since midnight.
//! Stored start times use the canonical zero-padded `HH:MM` form.

use std::sync::LazyLock;

use chrono::{NaiveTime, Timelike};
use regex::Regex;

/// Number of minutes in a day; valid minute-of-day values lie in `[0, MINUTES_PER_DAY)`.
pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Canonical `HH:MM` (one- or two-digit hour).
static CANONICAL_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*$").unwrap());

/// Typed input: `H:MM` with an optional AM/PM suffix (`am`, `PM`, `p.m.`).
static TYPED_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d{1,2}):(\d{2})\s*(?:([ap])\.?\s*m\.?)?\s*$").unwrap()
});

/// A successfully parsed typed time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedTime {
    /// Canonical 24-hour `HH:MM` form.
    pub canonical: String,
    /// Minutes since midnight.
    pub minutes: i32,
}

/// Parses canonical `HH:MM` into minutes since midnight.
///
/// Returns `None` for anything unparsable or out of range.
pub fn parse_time_to_minutes(text: &str) -> Option<i32> {
    let caps = CANONICAL_TIME_RE.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0).map(time_to_minutes)
}

/// Formats minutes since midnight as zero-padded `HH:MM`.
///
/// Values outside a single day wrap around midnight; keeping shifted
/// times inside the day is the caller's job.
pub fn minutes_to_time_string(minutes: i32) -> String {
    let minutes = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Parses free-text time input typed by a user.
///
/// Accepts 12-hour forms with a meridiem suffix (`6:17 AM`, `6:17pm`,
/// `6:17 p.m.`) and 24-hour forms (`14:30`). Returns `None` whenever the
/// hour or minute cannot be resolved unambiguously; callers keep the
/// previous value in that case.
pub fn parse_typed_time_input(text: &str) -> Option<TypedTime> {
    let caps = TYPED_TIME_RE.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;

    let hour = match caps.get(3).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (meridiem.as_str(), hour) {
                ("a", 12) => 0,
                ("a", h) => h,
                (_, 12) => 12,
                (_, h) => h + 12,
            }
        }
        None => hour,
    };

    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(TypedTime {
        canonical: time.format("%H:%M").to_string(),
        minutes: time_to_minutes(time),
    })
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "minute-of-day never exceeds 1439"
)]
fn time_to_minutes(time: NaiveTime) -> i32 {
    (time.hour() * 60 + time.minute()) as i32
}
