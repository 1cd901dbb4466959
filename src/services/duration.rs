// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Duration engine: how long a resource lasts when consumed at a rate.
//!
//! `rate` is a percentage per 100 seconds, so `hp` at `rate` lasts
//! `hp / rate * 100` seconds. Rate changes compose: each one takes effect
//! a number of hours after the previous one.
//!
//! Everything here is pure arithmetic and formatting. Degenerate input
//! (no rate, no start) yields `None`, never an error.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Rates are per this many seconds.
pub const RATE_DIVISOR: f64 = 100.0;

const SECONDS_PER_MINUTE: f64 = 60.0;
const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Seconds until `hp` is used up at `rate`. `None` for a non-positive rate.
pub fn seconds_remaining(hp: f64, rate: f64) -> Option<f64> {
    if rate <= 0.0 {
        return None;
    }
    Some(hp / rate * RATE_DIVISOR)
}

/// HP left after `elapsed_seconds` of consumption at `rate`, floored at 0.
pub fn live_remaining(initial_hp: f64, rate: f64, elapsed_seconds: f64) -> f64 {
    (initial_hp - rate * elapsed_seconds / RATE_DIVISOR).max(0.0)
}

/// A change of rate some hours after the previous segment began.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RateChange {
    /// Signed: positive joins, negative leaves.
    pub rate_delta: f64,
    #[serde(default)]
    pub delay_hours: f64,
}

/// State at the start of one segment of a projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentProjection {
    /// Total rate from this segment on.
    pub rate: f64,
    /// HP left when the segment begins. May be negative once depleted.
    pub remaining_hp: f64,
    /// Seconds from the projection start to the segment start.
    pub elapsed_seconds: f64,
    /// Wall-clock segment start, when the projection is anchored.
    pub start: Option<DateTime<Utc>>,
    /// Seconds from the segment start until depletion.
    pub seconds: Option<f64>,
}

impl SegmentProjection {
    /// When this segment's HP runs out, if anchored and depleting.
    pub fn completes_at(&self) -> Option<DateTime<Utc>> {
        let start = self.start?;
        let seconds = self.seconds.filter(|s| *s > 0.0)?;
        start.checked_add_signed(seconds_to_duration(seconds)?)
    }
}

/// The initial segment plus one segment per rate change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub initial: SegmentProjection,
    pub segments: Vec<SegmentProjection>,
}

impl Projection {
    /// State after every change has been applied.
    pub fn final_segment(&self) -> &SegmentProjection {
        self.segments.last().unwrap_or(&self.initial)
    }

    /// Completion time of the final segment.
    pub fn completes_at(&self) -> Option<DateTime<Utc>> {
        self.final_segment().completes_at()
    }
}

/// Project depletion through a sequence of rate changes.
pub fn project(
    hp: f64,
    rate: f64,
    changes: &[RateChange],
    start: Option<DateTime<Utc>>,
) -> Projection {
    let initial = SegmentProjection {
        rate,
        remaining_hp: hp,
        elapsed_seconds: 0.0,
        start,
        seconds: seconds_remaining(hp, rate),
    };

    let mut remaining = hp;
    let mut rate_sum = rate;
    let mut elapsed = 0.0;
    let mut segments = Vec::with_capacity(changes.len());

    for change in changes {
        let delay_seconds = change.delay_hours * SECONDS_PER_HOUR;
        remaining -= rate_sum * delay_seconds / RATE_DIVISOR;
        rate_sum += change.rate_delta;
        elapsed += delay_seconds;

        segments.push(SegmentProjection {
            rate: rate_sum,
            remaining_hp: remaining,
            elapsed_seconds: elapsed,
            start: start.and_then(|s| s.checked_add_signed(seconds_to_duration(elapsed)?)),
            seconds: seconds_remaining(remaining, rate_sum),
        });
    }

    Projection { initial, segments }
}

/// `None` when the span does not fit in a `Duration`.
pub(crate) fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    let millis = (seconds * 1000.0).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

fn plural(stem: &str, value: i64) -> String {
    if value == 1 {
        format!("{} {}", value, stem)
    } else {
        format!("{} {}s", value, stem)
    }
}

/// Human-readable duration such as `"1 day 3 hours 12 minutes"`.
///
/// Without minutes the value is rounded to whole hours (at least one).
/// Non-positive input renders as an empty string.
pub fn relative_from_seconds(seconds: f64, show_minutes: bool) -> String {
    if seconds.is_nan() || seconds <= 0.0 {
        return String::new();
    }

    let seconds = if show_minutes {
        seconds
    } else {
        (seconds / SECONDS_PER_HOUR).round().max(1.0) * SECONDS_PER_HOUR
    };

    let days = (seconds / SECONDS_PER_DAY).floor() as i64;
    let hours = (seconds / SECONDS_PER_HOUR % 24.0).floor() as i64;
    let minutes = (seconds / SECONDS_PER_MINUTE % 60.0).floor() as i64;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(plural("day", days));
    }
    if days > 0 || hours > 0 {
        parts.push(plural("hour", hours));
    }
    if show_minutes {
        parts.push(plural("minute", minutes));
    }

    parts.join(" ")
}

/// `"Saturday March 1 at 12:30"` in the date's own zone.
pub fn format_date_time<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.format("%A %B %-d at %H:%M").to_string()
}

/// Fixed offset for a signed, possibly fractional hour count.
pub fn zone_offset(zone_hours: f64) -> Option<FixedOffset> {
    FixedOffset::east_opt((zone_hours * SECONDS_PER_HOUR).round() as i32)
}

/// Completion time `seconds` after `start`, optionally also shown in an
/// auxiliary UTC offset: `"… (<same in UTC+zone> @ UTC+5.5)"`.
pub fn absolute_from_seconds<Tz>(
    seconds: f64,
    start: Option<&DateTime<Tz>>,
    zone_hours: Option<f64>,
) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let start = start?;
    let end = start.clone().checked_add_signed(seconds_to_duration(seconds)?)?;
    let mut formatted = format_date_time(&end);

    if let Some(zone) = zone_hours {
        // Normalize -0 so it prints as "+0".
        let zone = if zone == 0.0 { 0.0 } else { zone };
        if let Some(offset) = zone_offset(zone) {
            let zoned = end.with_timezone(&offset);
            let sign = if zone >= 0.0 { "+" } else { "" };
            formatted.push_str(&format!(
                " ({} @ UTC{}{})",
                format_date_time(&zoned),
                sign,
                zone
            ));
        }
    }

    Some(formatted)
}

/// Seconds in a days/hours/minutes span.
pub fn seconds_from_parts(days: f64, hours: f64, minutes: f64) -> f64 {
    days * SECONDS_PER_DAY + hours * SECONDS_PER_HOUR + minutes * SECONDS_PER_MINUTE
}

/// Seconds from `now` until `target`; negative when it has passed.
pub fn seconds_until(target: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (target - now).num_milliseconds() as f64 / 1000.0
}

/// Chat timestamp markup styles (`<t:UNIX:STYLE>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// "in 3 hours"
    Relative,
    /// Short time of day.
    ShortTime,
    /// Full date and time.
    Full,
}

impl TimestampStyle {
    fn code(self) -> char {
        match self {
            TimestampStyle::Relative => 'R',
            TimestampStyle::ShortTime => 't',
            TimestampStyle::Full => 'F',
        }
    }

    /// Time of day for anything within a day of `now`, full date otherwise.
    pub fn absolute_for(at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if seconds_until(at, now) < SECONDS_PER_DAY {
            TimestampStyle::ShortTime
        } else {
            TimestampStyle::Full
        }
    }
}

/// Chat markup that renders `at` in every reader's own zone.
pub fn timestamp_tag(at: DateTime<Utc>, style: TimestampStyle) -> String {
    format!("<t:{}:{}>", at.timestamp(), style.code())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_seconds_remaining() {
        assert_eq!(seconds_remaining(1000.0, 50.0), Some(2000.0));
        assert_eq!(seconds_remaining(100.0, 0.0), None);
        assert_eq!(seconds_remaining(100.0, -5.0), None);
    }

    #[test]
    fn test_live_remaining_floors_at_zero() {
        assert_eq!(live_remaining(1000.0, 50.0, 10.0), 995.0);
        assert_eq!(live_remaining(10.0, 50.0, 1000.0), 0.0);
    }

    #[test]
    fn test_project_without_changes() {
        let projection = project(1000.0, 50.0, &[], Some(start()));
        assert!(projection.segments.is_empty());
        assert_eq!(projection.final_segment().seconds, Some(2000.0));
        assert_eq!(
            projection.completes_at(),
            Some(start() + Duration::seconds(2000))
        );
    }

    #[test]
    fn test_project_unanchored_has_no_times() {
        let changes = [RateChange {
            rate_delta: 10.0,
            delay_hours: 1.0,
        }];
        let projection = project(1000.0, 10.0, &changes, None);
        assert_eq!(projection.segments[0].start, None);
        assert_eq!(projection.completes_at(), None);
    }

    #[test]
    fn test_relative_boundaries() {
        assert_eq!(relative_from_seconds(0.0, true), "");
        assert_eq!(relative_from_seconds(-5.0, true), "");
        assert_eq!(relative_from_seconds(59.0, true), "0 minutes");
        assert_eq!(relative_from_seconds(60.0, true), "1 minute");
        assert_eq!(relative_from_seconds(3660.0, true), "1 hour 1 minute");
        assert_eq!(relative_from_seconds(86_400.0, true), "1 day 0 hours 0 minutes");
    }

    #[test]
    fn test_relative_coarse() {
        assert_eq!(relative_from_seconds(60.0, false), "1 hour");
        assert_eq!(relative_from_seconds(5400.0, false), "2 hours");
        assert_eq!(relative_from_seconds(90_000.0, false), "1 day 1 hour");
    }

    #[test]
    fn test_absolute_format() {
        assert_eq!(absolute_from_seconds::<Utc>(60.0, None, None), None);

        let text = absolute_from_seconds(3600.0, Some(&start()), None).unwrap();
        assert_eq!(text, "Saturday March 1 at 13:30");

        let text = absolute_from_seconds(3600.0, Some(&start()), Some(5.5)).unwrap();
        assert_eq!(
            text,
            "Saturday March 1 at 13:30 (Saturday March 1 at 19:00 @ UTC+5.5)"
        );

        let text = absolute_from_seconds(0.0, Some(&start()), Some(-13.0)).unwrap();
        assert_eq!(
            text,
            "Saturday March 1 at 12:30 (Friday February 28 at 23:30 @ UTC-13)"
        );
    }

    #[test]
    fn test_absolute_in_start_zone() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = start().with_timezone(&offset);
        let text = absolute_from_seconds(0.0, Some(&local), Some(2.0)).unwrap();
        assert_eq!(
            text,
            "Saturday March 1 at 14:30 (Saturday March 1 at 14:30 @ UTC+2)"
        );
    }

    #[test]
    fn test_helpers() {
        assert_eq!(seconds_from_parts(1.0, 2.0, 3.0), 93_780.0);
        assert_eq!(
            seconds_until(start() + Duration::minutes(90), start()),
            5400.0
        );
        assert_eq!(
            timestamp_tag(start(), TimestampStyle::Relative),
            format!("<t:{}:R>", start().timestamp())
        );
        assert_eq!(
            TimestampStyle::absolute_for(start() + Duration::hours(2), start()),
            TimestampStyle::ShortTime
        );
        assert_eq!(
            TimestampStyle::absolute_for(start() + Duration::days(2), start()),
            TimestampStyle::Full
        );
    }

    #[test]
    fn test_out_of_range_times_are_unanchored() {
        let projection = project(1e15, 0.001, &[], Some(start()));
        assert!(projection.initial.seconds.is_some());
        assert_eq!(projection.completes_at(), None);

        let projection = project(
            1000.0,
            10.0,
            &[RateChange {
                rate_delta: 10.0,
                delay_hours: 1e12,
            }],
            Some(start()),
        );
        assert_eq!(projection.segments[0].start, None);
        assert_eq!(projection.completes_at(), None);

        let projection = project(
            1000.0,
            10.0,
            &[RateChange {
                rate_delta: 10.0,
                delay_hours: -1e30,
            }],
            Some(start()),
        );
        assert_eq!(projection.segments[0].start, None);

        assert_eq!(absolute_from_seconds(1e18, Some(&start()), None), None);
        assert_eq!(absolute_from_seconds(f64::INFINITY, Some(&start()), Some(2.0)), None);
        assert_eq!(seconds_to_duration(f64::NAN), None);
        assert_eq!(seconds_to_duration(1.5), Some(Duration::milliseconds(1500)));
    }
}
