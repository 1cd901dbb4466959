// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Helpers for finishing and summarizing cooks.

use crate::models::cook::{initial_hp, Cook, CookSize, CookType};
use crate::services::duration;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// How many cooks a portal's history summary shows.
pub const RECENT_COOKS: usize = 5;

/// Start of a cook that ran for `days` and `hours` up to `end`.
///
/// Neither may be negative and at least one must be 1 or more. `None` also
/// when the start would fall outside the representable range.
pub fn start_time_from_duration(end: DateTime<Utc>, days: i64, hours: i64) -> Option<DateTime<Utc>> {
    if days < 0 || hours < 0 || (days < 1 && hours < 1) {
        return None;
    }
    end.checked_sub_signed(Duration::try_days(days)?)?
        .checked_sub_signed(Duration::try_hours(hours)?)
}

/// Start of a cook that has `current_hp` left at `end` after being
/// consumed at `rate`. Needs a known initial HP and a positive rate.
pub fn start_time_from_hp(
    size: CookSize,
    cook_type: CookType,
    current_hp: f64,
    rate: f64,
    end: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let initial = initial_hp(size, cook_type)? as f64;
    let elapsed = duration::seconds_remaining(initial - current_hp, rate)?;
    end.checked_sub_signed(duration::seconds_to_duration(elapsed)?)
}

/// Days and whole hours of a finished cook, rounded to the hour (at least one).
pub fn duration_parts(cook: &Cook) -> Option<(i64, i64)> {
    let seconds = cook.duration_seconds()?;
    let hours = (seconds / 3600.0).round().max(1.0) as i64;
    Some((hours / 24, hours % 24))
}

/// The first few cooks ordered by end time, ongoing cooks last, with their
/// index in the portal's history.
pub fn recent_cooks(cooks: &[Cook]) -> Vec<(usize, &Cook)> {
    let mut indexed: Vec<(usize, &Cook)> = cooks.iter().enumerate().collect();
    indexed.sort_by_key(|(_, cook)| (cook.end.is_none(), cook.end));
    indexed.truncate(RECENT_COOKS);
    indexed
}

/// One history line.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CookSummary {
    pub index: usize,
    /// Size and type symbols, e.g. `"N🔥"`.
    pub label: String,
    /// Rounded cook length, empty while ongoing.
    pub duration: String,
    pub ended: Option<String>,
    #[serde(flatten)]
    pub cook: Cook,
}

impl CookSummary {
    pub fn new(index: usize, cook: &Cook) -> Self {
        Self {
            index,
            label: format!("{}{}", cook.size.symbol(), cook.cook_type.symbol()),
            duration: cook
                .duration_seconds()
                .map(|s| duration::relative_from_seconds(s, false))
                .unwrap_or_default(),
            ended: cook.end.map(|end| duration::format_date_time(&end)),
            cook: cook.clone(),
        }
    }
}

/// Summaries of the most recent cooks.
pub fn summarize(cooks: &[Cook]) -> Vec<CookSummary> {
    recent_cooks(cooks)
        .into_iter()
        .map(|(index, cook)| CookSummary::new(index, cook))
        .collect()
}
