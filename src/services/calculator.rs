// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Duration calculator view-model.
//!
//! The calculator holds the user's inputs and an anchor that says when
//! consumption started:
//!
//! - `Idle`: no start, only relative durations are shown
//! - `Manual`: an explicit start time
//! - `Live`: started now; HP is re-derived from elapsed time on each tick
//!
//! HP and rate are locked while live. Leaving live mode goes to `Manual`
//! when a start is supplied, otherwise to `Idle`.

use crate::services::duration::{self, Projection, RateChange, SegmentProjection};
use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Interval between live updates.
pub const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_millis(250);

/// When consumption started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    Idle,
    Manual {
        start: DateTime<Utc>,
    },
    Live {
        start: DateTime<Utc>,
        baseline_hp: f64,
        since: Instant,
    },
}

impl Anchor {
    pub fn start(&self) -> Option<DateTime<Utc>> {
        match self {
            Anchor::Idle => None,
            Anchor::Manual { start } | Anchor::Live { start, .. } => Some(*start),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Anchor::Idle => "idle",
            Anchor::Manual { .. } => "manual",
            Anchor::Live { .. } => "live",
        }
    }
}

/// Inputs and anchor of one calculator.
#[derive(Debug, Clone)]
pub struct DurationCalculator {
    hp: f64,
    rate: f64,
    zone_hours: Option<f64>,
    changes: Vec<RateChange>,
    anchor: Anchor,
}

impl Default for DurationCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl DurationCalculator {
    pub fn new() -> Self {
        Self {
            hp: 0.0,
            rate: 0.0,
            zone_hours: None,
            changes: Vec::new(),
            anchor: Anchor::Idle,
        }
    }

    pub fn hp(&self) -> f64 {
        self.hp
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn changes(&self) -> &[RateChange] {
        &self.changes
    }

    pub fn is_live(&self) -> bool {
        matches!(self.anchor, Anchor::Live { .. })
    }

    /// Set current HP. Ignored while live.
    pub fn set_hp(&mut self, hp: f64) -> bool {
        if self.is_live() {
            return false;
        }
        self.hp = hp.max(0.0);
        true
    }

    /// Set the rate. Ignored while live.
    pub fn set_rate(&mut self, rate: f64) -> bool {
        if self.is_live() {
            return false;
        }
        self.rate = rate;
        true
    }

    pub fn set_zone(&mut self, zone_hours: Option<f64>) {
        self.zone_hours = zone_hours;
    }

    /// Append a rate change, returning its index.
    pub fn add_change(&mut self, change: RateChange) -> usize {
        self.changes.push(change);
        self.changes.len() - 1
    }

    pub fn update_change(&mut self, index: usize, change: RateChange) -> bool {
        match self.changes.get_mut(index) {
            Some(slot) => {
                *slot = change;
                true
            }
            None => false,
        }
    }

    pub fn replace_changes(&mut self, changes: Vec<RateChange>) {
        self.changes = changes;
    }

    pub fn remove_change(&mut self, index: usize) -> bool {
        if index >= self.changes.len() {
            return false;
        }
        self.changes.remove(index);
        true
    }

    /// Anchor at an explicit start, or clear the anchor. Ignored while live.
    pub fn set_start(&mut self, start: Option<DateTime<Utc>>) -> bool {
        if self.is_live() {
            return false;
        }
        self.anchor = match start {
            Some(start) => Anchor::Manual { start },
            None => Anchor::Idle,
        };
        true
    }

    /// Start live mode: consumption began at `now_wall` with the current HP.
    pub fn go_live(&mut self, now_wall: DateTime<Utc>, now: Instant) {
        self.anchor = Anchor::Live {
            start: now_wall,
            baseline_hp: self.hp,
            since: now,
        };
        tracing::debug!(hp = self.hp, rate = self.rate, "Calculator went live");
    }

    /// Leave live mode, keeping the last derived HP.
    pub fn stop_live(&mut self, start: Option<DateTime<Utc>>) {
        if !self.is_live() {
            return;
        }
        self.anchor = Anchor::Idle;
        self.set_start(start);
    }

    /// Re-derive HP from elapsed time. Only does anything while live.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Anchor::Live {
            baseline_hp, since, ..
        } = self.anchor
        else {
            return false;
        };

        let elapsed_ms = now.saturating_duration_since(since).as_millis() as f64;
        let elapsed = elapsed_ms.floor() / 1000.0;
        self.hp = duration::live_remaining(baseline_hp, self.rate, elapsed).round();
        true
    }

    pub fn projection(&self) -> Projection {
        duration::project(self.hp, self.rate, &self.changes, self.anchor.start())
    }

    /// Render in the local time zone.
    pub fn view(&self) -> CalculatorView {
        self.view_in(&Local)
    }

    /// Render with absolute times in `tz`.
    pub fn view_in<Tz>(&self, tz: &Tz) -> CalculatorView
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let projection = self.projection();

        let rows = self
            .changes
            .iter()
            .zip(&projection.segments)
            .map(|(change, segment)| RowView {
                rate_delta: change.rate_delta,
                delay_hours: change.delay_hours,
                total_rate: segment.rate,
                joining: change.rate_delta >= 0.0,
                joins_at: segment
                    .start
                    .map(|s| duration::format_date_time(&s.with_timezone(tz))),
                display: TimeDisplay::of(segment, tz, self.zone_hours),
            })
            .collect();

        CalculatorView {
            mode: self.anchor.name().to_string(),
            hp: self.hp,
            rate: self.rate,
            zone_hours: self.zone_hours,
            start: self.anchor.start(),
            main: TimeDisplay::of(&projection.initial, tz, self.zone_hours),
            rows,
        }
    }
}

/// Relative and absolute completion for one segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimeDisplay {
    pub seconds: Option<f64>,
    pub relative: String,
    pub absolute: Option<String>,
    pub completes_at: Option<DateTime<Utc>>,
}

impl TimeDisplay {
    fn of<Tz>(segment: &SegmentProjection, tz: &Tz, zone_hours: Option<f64>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        // Displays work in whole seconds.
        let seconds = segment.seconds.map(f64::trunc);

        match seconds {
            Some(s) if s > 0.0 => {
                let start = segment.start.map(|st| st.with_timezone(tz));
                TimeDisplay {
                    seconds,
                    relative: duration::relative_from_seconds(s, true),
                    absolute: duration::absolute_from_seconds(s, start.as_ref(), zone_hours),
                    completes_at: segment.completes_at(),
                }
            }
            _ => TimeDisplay {
                seconds,
                relative: String::new(),
                absolute: None,
                completes_at: None,
            },
        }
    }
}

/// One rate change row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RowView {
    pub rate_delta: f64,
    pub delay_hours: f64,
    /// Rate from this row on.
    pub total_rate: f64,
    /// Joining (positive delta) or leaving.
    pub joining: bool,
    pub joins_at: Option<String>,
    pub display: TimeDisplay,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalculatorView {
    pub mode: String,
    pub hp: f64,
    pub rate: f64,
    pub zone_hours: Option<f64>,
    pub start: Option<DateTime<Utc>>,
    pub main: TimeDisplay,
    pub rows: Vec<RowView>,
}

/// Ticks a shared calculator every 250 ms and publishes fresh views.
///
/// The timer task stops when the ticker is dropped.
pub struct LiveTicker {
    handle: JoinHandle<()>,
    views: watch::Receiver<CalculatorView>,
}

impl LiveTicker {
    pub async fn spawn(calculator: Arc<Mutex<DurationCalculator>>, display: FixedOffset) -> Self {
        let initial = calculator.lock().await.view_in(&display);
        let (tx, views) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                let at = interval.tick().await;
                let view = {
                    let mut calc = calculator.lock().await;
                    calc.tick(at.into_std());
                    calc.view_in(&display)
                };
                tx.send_replace(view);
            }
        });

        Self { handle, views }
    }

    pub fn latest(&self) -> CalculatorView {
        self.views.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CalculatorView> {
        self.views.clone()
    }
}

impl Drop for LiveTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
