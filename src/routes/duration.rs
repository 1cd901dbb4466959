// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Duration calculator routes.
//!
//! `/api/duration*` are stateless evaluations. `/api/calculator` is the
//! server's shared calculator, which can run live and be watched over SSE.

use crate::error::{AppError, Result};
use crate::services::calculator::{CalculatorView, DurationCalculator, LiveTicker};
use crate::services::duration::{self, RateChange};
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Instant;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/duration", post(evaluate))
        .route("/api/duration/from", post(time_from))
        .route("/api/duration/until", post(time_until))
        .route("/api/calculator", get(get_calculator).put(update_calculator))
        .route("/api/calculator/stream", get(stream_calculator))
}

#[derive(Deserialize, Default)]
struct DisplayQuery {
    /// Client's UTC offset for absolute times; UTC when absent.
    utc_offset_minutes: Option<i32>,
}

impl DisplayQuery {
    fn offset(&self) -> Result<FixedOffset> {
        let minutes = self.utc_offset_minutes.unwrap_or(0);
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid UTC offset {}", minutes)))
    }
}

fn validate_zone(zone_hours: Option<f64>) -> Result<()> {
    match zone_hours {
        Some(z) if !z.is_finite() || z.abs() >= 24.0 => Err(AppError::BadRequest(
            "Zone offset must be between -24 and 24 hours".to_string(),
        )),
        _ => Ok(()),
    }
}

// ─── Stateless ───────────────────────────────────────────────

#[derive(Deserialize)]
struct DurationRequest {
    hp: f64,
    rate: f64,
    #[serde(default)]
    changes: Vec<RateChange>,
    /// Start with its own offset; absolute times use that offset.
    #[serde(default)]
    start: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    zone_hours: Option<f64>,
}

/// Project completion for the given inputs.
async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DurationRequest>,
) -> Result<Json<CalculatorView>> {
    validate_zone(req.zone_hours)?;

    let mut calc = DurationCalculator::new();
    calc.set_hp(req.hp);
    calc.set_rate(req.rate);
    calc.replace_changes(req.changes);
    calc.set_zone(req.zone_hours.or(state.config.zone_offset_hours));
    calc.set_start(req.start.map(|s| s.with_timezone(&Utc)));

    let display = req
        .start
        .map(|s| *s.offset())
        .unwrap_or_else(|| Utc.fix());
    Ok(Json(calc.view_in(&display)))
}

#[derive(Deserialize)]
struct TimeFromRequest {
    #[serde(default)]
    days: f64,
    #[serde(default)]
    hours: f64,
    #[serde(default)]
    minutes: f64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TimeResponse {
    pub seconds: f64,
    pub relative: String,
    pub absolute: Option<String>,
}

/// When a span starting now ends.
async fn time_from(
    State(state): State<Arc<AppState>>,
    Query(display): Query<DisplayQuery>,
    Json(req): Json<TimeFromRequest>,
) -> Result<Json<TimeResponse>> {
    let offset = display.offset()?;
    let seconds = duration::seconds_from_parts(req.days, req.hours, req.minutes);
    let now = Utc::now().with_timezone(&offset);

    let absolute = if seconds > 0.0 {
        duration::absolute_from_seconds(seconds, Some(&now), state.config.zone_offset_hours)
    } else {
        None
    };

    Ok(Json(TimeResponse {
        seconds,
        relative: duration::relative_from_seconds(seconds, true),
        absolute,
    }))
}

#[derive(Deserialize)]
struct TimeUntilRequest {
    #[serde(deserialize_with = "crate::time_utils::timestamp::deserialize")]
    target: DateTime<Utc>,
}

/// How long until a moment.
async fn time_until(Json(req): Json<TimeUntilRequest>) -> Json<TimeResponse> {
    let seconds = duration::seconds_until(req.target, Utc::now());
    Json(TimeResponse {
        seconds,
        relative: duration::relative_from_seconds(seconds, true),
        absolute: None,
    })
}

// ─── Shared Calculator ───────────────────────────────────────

async fn get_calculator(
    State(state): State<Arc<AppState>>,
    Query(display): Query<DisplayQuery>,
) -> Result<Json<CalculatorView>> {
    let offset = display.offset()?;
    Ok(Json(state.calculator.lock().await.view_in(&offset)))
}

#[derive(Deserialize)]
struct CalculatorUpdate {
    hp: Option<f64>,
    rate: Option<f64>,
    changes: Option<Vec<RateChange>>,
    /// `null` clears the auxiliary zone.
    #[serde(default, deserialize_with = "present_or_null")]
    zone_hours: Option<Option<f64>>,
    /// Explicit start; also the start kept when leaving live mode.
    #[serde(default, deserialize_with = "crate::time_utils::optional_timestamp::deserialize")]
    start: Option<DateTime<Utc>>,
    /// Drop the start and go back to relative times only.
    #[serde(default)]
    clear_start: bool,
    live: Option<bool>,
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn present_or_null<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Option<f64>>, D::Error> {
    Option::<f64>::deserialize(d).map(Some)
}

/// Update the shared calculator. HP and rate are ignored while live.
async fn update_calculator(
    State(state): State<Arc<AppState>>,
    Query(display): Query<DisplayQuery>,
    Json(req): Json<CalculatorUpdate>,
) -> Result<Json<CalculatorView>> {
    let offset = display.offset()?;
    if let Some(zone) = req.zone_hours {
        validate_zone(zone)?;
    }

    let mut calc = state.calculator.lock().await;

    if let Some(hp) = req.hp {
        calc.set_hp(hp);
    }
    if let Some(rate) = req.rate {
        calc.set_rate(rate);
    }
    if let Some(changes) = req.changes {
        calc.replace_changes(changes);
    }
    if let Some(zone) = req.zone_hours {
        calc.set_zone(zone);
    }

    match req.live {
        Some(true) if !calc.is_live() => calc.go_live(Utc::now(), Instant::now()),
        Some(false) if calc.is_live() => calc.stop_live(req.start),
        _ if req.clear_start => {
            calc.set_start(None);
        }
        _ => {
            if let Some(start) = req.start {
                calc.set_start(Some(start));
            }
        }
    }

    Ok(Json(calc.view_in(&offset)))
}

/// Stream calculator views every 250 ms while the client listens.
async fn stream_calculator(
    State(state): State<Arc<AppState>>,
    Query(display): Query<DisplayQuery>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let offset = display.offset()?;
    let ticker = LiveTicker::spawn(state.calculator.clone(), offset).await;
    let views = ticker.subscribe();

    // The ticker lives in the stream state and stops when the client leaves.
    let stream = stream::unfold((ticker, views), |(ticker, mut views)| async move {
        if views.changed().await.is_err() {
            return None;
        }
        let view = views.borrow_and_update().clone();
        let event = Event::default().event("calculator").json_data(&view);
        Some((event, (ticker, views)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
