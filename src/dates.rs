// Date handling: search range sanitizing and display formatting

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use tracing::info;

use crate::error::{AvailabilityError, Result};
use crate::prompt::Prompt;

// Ranges wider than this need an explicit confirmation
pub const MAX_UNCONFIRMED_SPAN_DAYS: i64 = 30;

// Default search window when no end date is given
pub const DEFAULT_SPAN_DAYS: i64 = 14;

const SECONDS_PER_DAY: i64 = 86_400;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%Y%m%d",
];

/// Start and end of a search, already in the form the availability
/// endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// A parsed date or date-time. `naive` is the wall-clock time in `offset`
/// when one was present in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub naive: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl ParsedDate {
    fn from_offset(dt: DateTime<FixedOffset>) -> Self {
        Self {
            naive: dt.naive_local(),
            offset: Some(*dt.offset()),
        }
    }

    fn from_naive(naive: NaiveDateTime) -> Self {
        Self {
            naive,
            offset: None,
        }
    }

    // Instants without an offset are taken to be UTC
    fn utc_instant(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => self.naive - Duration::seconds(offset.local_minus_utc() as i64),
            None => self.naive,
        }
    }

    /// Renders like an ISO-8601 `isoformat()`: microseconds only when
    /// non-zero, offset only when one was parsed.
    pub fn isoformat(&self) -> String {
        let mut out = self.naive.format("%Y-%m-%dT%H:%M:%S").to_string();
        let micros = self.naive.nanosecond() / 1_000;
        if micros != 0 {
            out.push_str(&format!(".{:06}", micros));
        }
        if let Some(offset) = self.offset {
            out.push_str(&format_offset(offset));
        }
        out
    }
}

fn format_offset(offset: FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.abs();
    format!("{}{:02}:{:02}", sign, seconds / 3600, (seconds % 3600) / 60)
}

/// Parses the date shapes a user is likely to type, plus the shapes the
/// API returns. Returns `None` when nothing matches.
pub fn parse_date(input: &str) -> Option<ParsedDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(ParsedDate::from_offset(dt));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Some(ParsedDate::from_offset(dt));
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(ParsedDate::from_naive(naive));
        }
    }

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(input, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(ParsedDate::from_naive)
    })
}

/// Whole days from `start` to `end`, rounded towards negative infinity.
pub fn span_days(start: &ParsedDate, end: &ParsedDate) -> i64 {
    let delta = end.utc_instant() - start.utc_instant();
    let mut seconds = delta.num_seconds();
    if delta < Duration::seconds(seconds) {
        seconds -= 1;
    }
    seconds.div_euclid(SECONDS_PER_DAY)
}

/// Validates the raw start/end strings and turns them into query values.
///
/// Spans over [`MAX_UNCONFIRMED_SPAN_DAYS`] are only accepted after the user
/// answers `y` to the confirmation. Each bound gets a `Z` appended to its
/// ISO form even when the input carried its own offset.
pub fn sanitize(start_raw: &str, end_raw: &str, prompt: &mut dyn Prompt) -> Result<DateRange> {
    let start = parse_date(start_raw).ok_or(AvailabilityError::InvalidDateFormat)?;
    let end = parse_date(end_raw).ok_or(AvailabilityError::InvalidDateFormat)?;

    let days = span_days(&start, &end);
    if days > MAX_UNCONFIRMED_SPAN_DAYS {
        info!(days, "search range is wider than {} days", MAX_UNCONFIRMED_SPAN_DAYS);
        let question = format!(
            "Your search spans {} days. Are you sure you want to continue?\n(y/N)> ",
            days
        );
        match prompt.ask(&question)? {
            Some(answer) if answer.to_lowercase() == "y" => {}
            _ => return Err(AvailabilityError::UserAborted),
        }
    }

    Ok(DateRange {
        start: format!("{}Z", start.isoformat()),
        end: format!("{}Z", end.isoformat()),
    })
}

/// Raw start/end values used when the user gives none: now and two weeks
/// from now, both UTC.
pub fn default_bounds(now: DateTime<Utc>) -> (String, String) {
    let end = now + Duration::days(DEFAULT_SPAN_DAYS);
    (
        now.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        end.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
    )
}

/// Formats an availability timestamp for the console, e.g.
/// `Monday, 10/28/19 @ 9:30AM UTC`. The time stays in the timestamp's own
/// offset.
pub fn format_display(timestamp: &str) -> Result<String> {
    let parsed = parse_date(timestamp).ok_or_else(|| {
        AvailabilityError::MalformedResponse(format!("unreadable timestamp '{}'", timestamp))
    })?;

    let zone = match parsed.offset {
        Some(offset) if offset.local_minus_utc() != 0 => format_offset(offset),
        _ => "UTC".to_string(),
    };

    Ok(format!(
        "{} {}",
        parsed.naive.format("%A, %m/%d/%y @ %-I:%M%p"),
        zone
    ))
}
