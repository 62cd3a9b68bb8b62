//! Source staleness detection.
//!
//! A source is stale when the date mined from its URI and title is strictly
//! earlier than `now - threshold_days`. Sources with no recognizable date
//! are unknown, and unknown is not stale.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::dates::extract_date;
use super::types::GroundingMetadata;

/// Default freshness threshold: six months.
pub const DEFAULT_STALE_THRESHOLD_DAYS: i64 = 180;

/// A chunk whose inferred date predates the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleSource {
    /// Position in the chunk list.
    pub index: usize,
    pub uri: Option<String>,
    pub date: NaiveDate,
}

fn cutoff(threshold_days: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::try_days(threshold_days)?)
}

/// Stale chunks relative to `now`, in chunk order.
pub fn stale_sources_at(
    metadata: &GroundingMetadata,
    threshold_days: i64,
    now: DateTime<Utc>,
) -> Vec<StaleSource> {
    let Some(cutoff) = cutoff(threshold_days, now) else {
        tracing::debug!(threshold_days, "Staleness threshold out of range, treating all sources as fresh");
        return Vec::new();
    };
    let cutoff = cutoff.naive_utc();

    metadata
        .grounding_chunks
        .iter()
        .enumerate()
        .filter_map(|(index, chunk)| {
            let date = extract_date(&chunk.date_text())?;
            (date.and_time(NaiveTime::MIN) < cutoff).then(|| StaleSource {
                index,
                uri: chunk.uri.clone(),
                date,
            })
        })
        .collect()
}

/// Whether any cited source is older than `threshold_days` as of `now`.
pub fn is_stale_at(metadata: &GroundingMetadata, threshold_days: i64, now: DateTime<Utc>) -> bool {
    !stale_sources_at(metadata, threshold_days, now).is_empty()
}

/// Whether any cited source is older than `threshold_days` as of now.
pub fn is_stale(metadata: &GroundingMetadata, threshold_days: i64) -> bool {
    is_stale_at(metadata, threshold_days, Utc::now())
}
