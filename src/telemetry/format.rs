//! # Field Formatting
//!
//! Turns a [`TelemetrySample`] into the strings shown on the dashboard.
//! Every field is formatted on its own; a missing value becomes
//! [`PLACEHOLDER`], never zero.

use chrono::{Local, TimeZone};

use super::sample::TelemetrySample;
use crate::dashboard::DisplayFields;

/// Shown in place of any missing value
pub const PLACEHOLDER: &str = "--";

fn with_unit(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*} {}", decimals, v, unit),
        None => PLACEHOLDER.to_string(),
    }
}

/// Format a single coordinate with 5 decimals.
pub fn format_coord(value: f64) -> String {
    if value.is_finite() {
        format!("{:.5}", value)
    } else {
        PLACEHOLDER.to_string()
    }
}

pub fn format_temperature(value: Option<f64>) -> String {
    with_unit(value, 1, "°C")
}

pub fn format_humidity(value: Option<f64>) -> String {
    with_unit(value, 1, "%")
}

pub fn format_pressure(value: Option<f64>) -> String {
    with_unit(value, 0, "hPa")
}

pub fn format_battery(value: Option<f64>) -> String {
    with_unit(value, 0, "%")
}

pub fn format_distance(value: Option<f64>) -> String {
    with_unit(value, 1, "m")
}

/// Session total as shown in the session panel.
pub fn format_total_distance(total_m: f64) -> String {
    format!("Total: {:.1} m", total_m)
}

/// Format a Unix timestamp (seconds) as a wall-clock time in `tz`.
///
/// Zero and absent timestamps render as the placeholder.
pub fn format_timestamp_in<Tz: TimeZone>(ts: Option<f64>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(ts) = ts.filter(|t| *t != 0.0) else {
        return PLACEHOLDER.to_string();
    };

    let millis = (ts * 1000.0).round() as i64;
    match tz.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// Format a Unix timestamp in the local timezone.
pub fn format_timestamp(ts: Option<f64>) -> String {
    format_timestamp_in(ts, &Local)
}

/// Build the full set of displayed fields for a validated sample.
pub fn display_fields(sample: &TelemetrySample) -> DisplayFields {
    DisplayFields {
        coords: format!(
            "{}, {}",
            format_coord(sample.position.lat),
            format_coord(sample.position.lon)
        ),
        temperature: format_temperature(sample.temperature),
        humidity: format_humidity(sample.humidity),
        pressure: format_pressure(sample.pressure),
        battery: format_battery(sample.battery),
        distance: format_distance(sample.distance_m),
        timestamp: format_timestamp(sample.timestamp),
    }
}
