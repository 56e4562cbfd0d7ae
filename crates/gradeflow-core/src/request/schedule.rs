//! Code review appointment scheduling: eligibility date and signup link

use chrono::{DateTime, Duration, FixedOffset, Utc};

/// Appointment kind booked for a review request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewKind {
    /// Full code review
    Code,
    /// Quick follow-up review
    Quick,
}

impl ReviewKind {
    /// Kind named by a `request-*-review` label
    pub fn from_label(label: &str) -> Self {
        if label == "request-code-review" {
            Self::Code
        } else {
            Self::Quick
        }
    }

    /// Display name
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Code => "Code",
            Self::Quick => "Quick",
        }
    }

    /// Calendar event slug (`code-review`)
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::Code => "code-review",
            Self::Quick => "quick-review",
        }
    }

    /// Minutes a student presents for
    pub const fn review_minutes(&self) -> u32 {
        match self {
            Self::Code => 20,
            Self::Quick => 10,
        }
    }

    /// Minutes the whole appointment takes
    pub const fn appointment_minutes(&self) -> u32 {
        match self {
            Self::Code => 30,
            Self::Quick => 15,
        }
    }
}

/// Parse an RFC 3339 timestamp; `None` for empty or malformed text
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Earliest date the next appointment may be booked.
///
/// Counts `delay_days` from the check date when present, else from the
/// last review date, and never returns a date before `now` (nor a date
/// past chrono's range).
pub fn eligible_date(
    last_date: Option<DateTime<Utc>>,
    check_date: Option<DateTime<Utc>>,
    delay_days: i64,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    check_date
        .or(last_date)
        .and_then(|d| d.checked_add_signed(Duration::try_days(delay_days)?))
        .filter(|d| *d >= now)
        .unwrap_or(now)
}

/// Long human-readable form (`March 1, 2024 at 4:00 PM (UTC-08:00)`)
pub fn display_date(date: DateTime<Utc>, offset: FixedOffset) -> String {
    date.with_timezone(&offset)
        .format("%B %-d, %Y at %-I:%M %p (UTC%:z)")
        .to_string()
}

/// Personalized signup link with the student's details filled in
pub fn appointment_link(
    calendar_url: &str,
    kind: ReviewKind,
    eligible: DateTime<Utc>,
    offset: FixedOffset,
    name: &str,
    email: &str,
    issue_url: &str,
) -> String {
    let local = eligible.with_timezone(&offset);
    format!(
        "{}/{}?month={}&date={}&name={}&email={}&a1={}",
        calendar_url.trim_end_matches('/'),
        kind.slug(),
        local.format("%Y-%m"),
        local.format("%Y-%m-%d"),
        urlencoding::encode(name),
        urlencoding::encode(email),
        urlencoding::encode(issue_url)
    )
}
