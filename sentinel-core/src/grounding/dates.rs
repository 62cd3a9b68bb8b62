//! Best-effort date mining from source URIs and titles.
//!
//! Three patterns are tried in a fixed order and the first one that yields a
//! real calendar date wins:
//!
//! 1. `YYYY-MM-DD` or `YYYY/MM/DD`
//! 2. `YYYY-MM` or `YYYY/MM` (day taken as the 1st)
//! 3. `Mon DD, YYYY` with an English month name or abbreviation
//!
//! Matching is deliberately loose: any substring qualifies, so a numeric path
//! segment such as `/2048/12/` reads as a date. A match that does not form a
//! valid date falls through to the next pattern.

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static YEAR_MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{4})[/-](\d{1,2})[/-](\d{1,2})").expect("invalid regex")
});

static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{4})[/-](\d{1,2})").expect("invalid regex"));

static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]* (\d{1,2}),? (\d{4})")
        .expect("invalid regex")
});

/// Which pattern produced a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePattern {
    YearMonthDay,
    YearMonth,
    MonthDayYear,
}

impl DatePattern {
    /// All patterns in precedence order.
    pub const ALL: [DatePattern; 3] = [Self::YearMonthDay, Self::YearMonth, Self::MonthDayYear];

    fn regex(self) -> &'static Regex {
        match self {
            Self::YearMonthDay => &YEAR_MONTH_DAY,
            Self::YearMonth => &YEAR_MONTH,
            Self::MonthDayYear => &MONTH_DAY_YEAR,
        }
    }

    fn to_date(self, caps: &Captures<'_>) -> Option<NaiveDate> {
        match self {
            Self::YearMonthDay => {
                calendar_date(number(caps, 1)?, number(caps, 2)?, number(caps, 3)?)
            }
            Self::YearMonth => calendar_date(number(caps, 1)?, number(caps, 2)?, 1),
            Self::MonthDayYear => {
                let month = month_number(caps.get(1)?.as_str())?;
                calendar_date(number(caps, 3)?, month, number(caps, 2)?)
            }
        }
    }
}

impl std::fmt::Display for DatePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YearMonthDay => write!(f, "year_month_day"),
            Self::YearMonth => write!(f, "year_month"),
            Self::MonthDayYear => write!(f, "month_day_year"),
        }
    }
}

/// A date found in free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDate {
    pub date: NaiveDate,
    pub pattern: DatePattern,
    /// The substring the pattern matched.
    pub matched: String,
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn calendar_date(year: u32, month: u32, day: u32) -> Option<NaiveDate> {
    // Year 0 has no calendar meaning for a publication date.
    if year == 0 {
        return None;
    }
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

/// Find the first date in `text`, with the pattern that produced it.
pub fn extract_date_detailed(text: &str) -> Option<ExtractedDate> {
    for pattern in DatePattern::ALL {
        let Some(caps) = pattern.regex().captures(text) else {
            continue;
        };
        let matched = caps.get(0).map_or("", |m| m.as_str());
        match pattern.to_date(&caps) {
            Some(date) => {
                return Some(ExtractedDate {
                    date,
                    pattern,
                    matched: matched.to_string(),
                })
            }
            None => {
                tracing::debug!(%pattern, matched, "Matched text is not a calendar date, trying next pattern");
            }
        }
    }
    None
}

/// Find the first date in `text`.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    extract_date_detailed(text).map(|d| d.date)
}

/// Find a date in a source's URI and title.
pub fn extract_date_from_source(uri: Option<&str>, title: Option<&str>) -> Option<NaiveDate> {
    extract_date(&format!("{} {}", uri.unwrap_or(""), title.unwrap_or("")))
}
