//! Fuzzy date and time resolution for demo scheduling.
//!
//! Date precedence is strict: a weekday name wins, then an explicit calendar
//! date, then tomorrow. Time falls back to 10:00. Resolution never fails; if
//! even the defaults cannot be computed the result is `now + 1 day + 10h`.

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use regex::Regex;

/// Hour used when no time could be parsed.
pub const DEFAULT_HOUR: u32 = 10;

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(st|nd|rd|th)\b").expect("valid ordinal regex"));
static MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\s*(am|pm)\b").expect("valid meridiem regex"));
static TIME_12H_MINUTES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2}) (am|pm)$").expect("valid 12h minutes regex")
});
static TIME_12H_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}) (am|pm)$").expect("valid 12h hour regex"));
static TIME_24H_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid 24h minutes regex"));
static TIME_24H_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})$").expect("valid 24h hour regex"));

const WEEKDAYS: [(&str, Weekday); 7] = [
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// Explicit formats that carry their own year; no roll-forward applies.
const DATED_FORMATS: [&str; 4] = ["%d %B %Y", "%B %d %Y", "%d/%m/%Y", "%m/%d/%Y"];
/// Explicit formats without a year; the current year is assumed.
const YEARLESS_FORMATS: [&str; 4] = ["%d %B", "%B %d", "%d/%m", "%m/%d"];

/// Which rule produced the date part of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Weekday(Weekday),
    /// `yearless` is true when the current year was assumed.
    Explicit { yearless: bool },
    Tomorrow,
    /// Nothing could be computed; the whole timestamp is the safe default.
    SafeDefault,
}

/// A resolved demo slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDateTime {
    pub at: NaiveDateTime,
    pub date_source: DateSource,
    /// True when the time text was not understood and 10:00 was used.
    pub time_defaulted: bool,
}

/// Resolve free-text date and time into a timestamp relative to `now`.
pub fn resolve(date_text: &str, time_text: &str, now: NaiveDateTime) -> ResolvedDateTime {
    match resolve_date(date_text, now) {
        Some((date, date_source)) => {
            let parsed = parse_time(time_text);
            let time = parsed.unwrap_or_else(default_time);
            let mut at = date.and_time(time);
            // Today's yearless date whose slot already passed means next year.
            if date_source == (DateSource::Explicit { yearless: true }) && at < now {
                if let Some(next) = date.with_year(date.year() + 1) {
                    at = next.and_time(time);
                }
            }
            ResolvedDateTime {
                at,
                date_source,
                time_defaulted: parsed.is_none(),
            }
        }
        None => ResolvedDateTime {
            at: safe_default(now),
            date_source: DateSource::SafeDefault,
            time_defaulted: true,
        },
    }
}

/// Resolve the date part. `None` only when date arithmetic overflows.
pub fn resolve_date(date_text: &str, now: NaiveDateTime) -> Option<(NaiveDate, DateSource)> {
    let today = now.date();

    if let Some(weekday) = parse_weekday(date_text) {
        let offset = (7 + weekday.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
        return today
            .checked_add_days(Days::new(u64::from(offset)))
            .map(|d| (d, DateSource::Weekday(weekday)));
    }

    if let Some((date, yearless)) = explicit_date(date_text, today) {
        return Some((date, DateSource::Explicit { yearless }));
    }

    today
        .checked_add_days(Days::new(1))
        .map(|d| (d, DateSource::Tomorrow))
}

/// Find a weekday name or abbreviation among the words of `text`.
pub fn parse_weekday(text: &str) -> Option<Weekday> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| w.len() >= 3)
        .find_map(|word| {
            WEEKDAYS
                .iter()
                .find(|(name, _)| name.starts_with(word) && word.starts_with(&name[..3]))
                .map(|(_, day)| *day)
        })
}

/// Parse an explicit calendar date. Yearless dates that already passed
/// relative to `today` roll forward one year.
pub fn parse_explicit_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    explicit_date(text, today).map(|(date, _)| date)
}

fn explicit_date(text: &str, today: NaiveDate) -> Option<(NaiveDate, bool)> {
    let normalized = normalize_date_text(text);
    if normalized.is_empty() {
        return None;
    }

    for fmt in DATED_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&normalized, fmt) {
            return Some((date, false));
        }
    }

    let year = today.year();
    let with_year = format!("{normalized} {year}");
    for fmt in YEARLESS_FORMATS {
        let Ok(date) = NaiveDate::parse_from_str(&with_year, &format!("{fmt} %Y")) else {
            continue;
        };
        if date >= today {
            return Some((date, true));
        }
        if let Some(next) = date.with_year(year + 1) {
            return Some((next, true));
        }
    }
    None
}

fn normalize_date_text(text: &str) -> String {
    let lower = text.trim().to_lowercase().replace(',', " ");
    let stripped = ORDINAL_SUFFIX.replace_all(&lower, "$1");
    stripped
        .split_whitespace()
        .filter(|w| *w != "of")
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a clock time: 12-hour with minutes, 12-hour hour only, 24-hour
/// with minutes, 24-hour hour only, in that order.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let lower = text
        .trim()
        .to_lowercase()
        .replace("a.m.", "am")
        .replace("p.m.", "pm");
    let spaced = MERIDIEM.replace_all(&lower, "$1 $2");
    let normalized = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(c) = TIME_12H_MINUTES.captures(&normalized) {
        return twelve_hour(&c[1], &c[2], &c[3]);
    }
    if let Some(c) = TIME_12H_HOUR.captures(&normalized) {
        return twelve_hour(&c[1], "0", &c[2]);
    }
    if let Some(c) = TIME_24H_MINUTES.captures(&normalized) {
        return NaiveTime::from_hms_opt(c[1].parse().ok()?, c[2].parse().ok()?, 0);
    }
    if let Some(c) = TIME_24H_HOUR.captures(&normalized) {
        return NaiveTime::from_hms_opt(c[1].parse().ok()?, 0, 0);
    }
    None
}

fn twelve_hour(hour: &str, minute: &str, meridiem: &str) -> Option<NaiveTime> {
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match (hour, meridiem) {
        (12, "am") => 0,
        (12, _) => 12,
        (h, "pm") => h + 12,
        (h, _) => h,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn safe_default(now: NaiveDateTime) -> NaiveDateTime {
    now.checked_add_signed(TimeDelta::days(1) + TimeDelta::hours(i64::from(DEFAULT_HOUR)))
        .unwrap_or(now)
}
