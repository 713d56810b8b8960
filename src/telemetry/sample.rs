//! # Telemetry Samples
//!
//! Wire payloads returned by the backend and their validation into
//! [`TelemetrySample`].
//!
//! The backend is loosely typed: numeric fields can arrive as numbers,
//! numeric strings, `null`, or not at all. Everything is coerced through
//! [`coerce_number`] so a bad field only blanks that field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dashboard::GeoPoint;

/// Raw GPS block of a `/latest` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GpsPayload {
    #[serde(default)]
    pub latitude: Value,
    #[serde(default)]
    pub longitude: Value,
}

/// Raw `/latest` response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestPayload {
    #[serde(default)]
    pub gps: Option<GpsPayload>,
    #[serde(default)]
    pub temperature: Value,
    #[serde(default)]
    pub humidite: Value,
    #[serde(default)]
    pub pression: Value,
    #[serde(default)]
    pub batterie: Value,
    #[serde(default)]
    pub distance_m: Value,
    #[serde(default)]
    pub ts: Value,
}

/// `/sessions/{id}` response body
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTotals {
    pub total_distance_m: f64,
}

/// One entry of `/sessions/{id}/measures`
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryPoint {
    #[serde(default)]
    pub lat: Value,
    #[serde(default)]
    pub lon: Value,
}

impl HistoryPoint {
    /// Returns the point if both coordinates are finite.
    pub fn to_geo_point(&self) -> Option<GeoPoint> {
        let lat = coerce_number(&self.lat)?;
        let lon = coerce_number(&self.lon)?;
        Some(GeoPoint::new(lat, lon))
    }
}

/// A validated telemetry reading.
///
/// Only built by [`validate_latest`], so `position` always holds finite
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySample {
    pub position: GeoPoint,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub battery: Option<f64>,
    pub distance_m: Option<f64>,
    pub timestamp: Option<f64>,
}

/// Why a `/latest` response did not produce a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No `gps` block in the response
    MissingPosition,
    /// Latitude or longitude absent, unparseable, or not finite
    InvalidPosition,
}

/// Coerce a JSON value into a finite number.
///
/// Numbers pass through, numeric strings are parsed, everything else is
/// `None`. Non-finite results are `None` as well.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Validate a `/latest` payload into a sample.
///
/// # Errors
///
/// Returns a [`Rejection`] if the position is missing or not finite. Other
/// fields never cause a rejection.
pub fn validate_latest(payload: &LatestPayload) -> std::result::Result<TelemetrySample, Rejection> {
    let gps = payload.gps.as_ref().ok_or(Rejection::MissingPosition)?;

    let lat = coerce_number(&gps.latitude).ok_or(Rejection::InvalidPosition)?;
    let lon = coerce_number(&gps.longitude).ok_or(Rejection::InvalidPosition)?;

    Ok(TelemetrySample {
        position: GeoPoint::new(lat, lon),
        temperature: coerce_number(&payload.temperature),
        humidity: coerce_number(&payload.humidite),
        pressure: coerce_number(&payload.pression),
        battery: coerce_number(&payload.batterie),
        distance_m: coerce_number(&payload.distance_m),
        timestamp: coerce_number(&payload.ts),
    })
}
