//! # Dashboard Module
//!
//! The display side of the poller.
//!
//! This module handles:
//! - View types handed to the display (fields, status, coordinates)
//! - The [`DashboardSurface`] trait the poller renders through
//! - A terminal implementation that logs updates via `tracing`
//!
//! Map projection, tiles and styling belong to whatever implements the
//! surface. The poller only ever hands it coordinates.

use serde::Serialize;

use crate::telemetry::format::PLACEHOLDER;

pub mod terminal;

/// A finite latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned bounding box of a set of points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl Bounds {
    /// Bounding box of `points`, or `None` for an empty slice.
    pub fn of(points: &[GeoPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut south_west = *first;
        let mut north_east = *first;

        for p in &points[1..] {
            south_west.lat = south_west.lat.min(p.lat);
            south_west.lon = south_west.lon.min(p.lon);
            north_east.lat = north_east.lat.max(p.lat);
            north_east.lon = north_east.lon.max(p.lon);
        }

        Some(Self { south_west, north_east })
    }
}

/// Formatted telemetry fields as shown on the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFields {
    pub coords: String,
    pub temperature: String,
    pub humidity: String,
    pub pressure: String,
    pub battery: String,
    pub distance: String,
    pub timestamp: String,
}

impl DisplayFields {
    /// All fields set to the placeholder
    pub fn placeholder() -> Self {
        Self {
            coords: PLACEHOLDER.to_string(),
            temperature: PLACEHOLDER.to_string(),
            humidity: PLACEHOLDER.to_string(),
            pressure: PLACEHOLDER.to_string(),
            battery: PLACEHOLDER.to_string(),
            distance: PLACEHOLDER.to_string(),
            timestamp: PLACEHOLDER.to_string(),
        }
    }

    /// True if every field is the placeholder
    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

impl Default for DisplayFields {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// What the status indicator shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationState {
    /// Fresh data is flowing
    Live(String),
    /// Backend reachable but nothing usable to show
    Idle(String),
    /// Backend unreachable or answered with an error
    Error(String),
}

impl PresentationState {
    pub fn message(&self) -> &str {
        match self {
            PresentationState::Live(m) | PresentationState::Idle(m) | PresentationState::Error(m) => m,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, PresentationState::Live(_))
    }
}

/// Everything the poller can ask the display to do.
///
/// Calls are synchronous and must not block; implementations queue or
/// render immediately.
#[cfg_attr(test, mockall::automock)]
pub trait DashboardSurface: Send {
    /// Update the status indicator
    fn render_status(&mut self, state: &PresentationState);

    /// Update the telemetry panel
    fn render_fields(&mut self, fields: &DisplayFields);

    /// Update the session total line
    fn render_total(&mut self, total: &str);

    /// Move the position marker
    fn move_marker(&mut self, point: GeoPoint);

    /// Add one point to the end of the trail
    fn append_trail(&mut self, point: GeoPoint);

    /// Replace the whole trail
    fn replace_trail(&mut self, points: &[GeoPoint]);

    /// Jump the view to `point` at `zoom`
    fn recenter(&mut self, point: GeoPoint, zoom: u8);

    /// Smoothly pan the view to `point`, keeping the zoom
    fn pan_to(&mut self, point: GeoPoint);

    /// Fit the view to `bounds`
    fn fit_bounds(&mut self, bounds: Bounds);

    /// Show a blocking message to the user
    fn alert(&mut self, message: &str);

    /// Navigate away to `path`
    fn redirect(&mut self, path: &str);
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// One recorded surface call
    #[derive(Debug, Clone, PartialEq)]
    pub enum SurfaceCall {
        Status(PresentationState),
        Fields(DisplayFields),
        Total(String),
        Marker(GeoPoint),
        Append(GeoPoint),
        Replace(Vec<GeoPoint>),
        Recenter(GeoPoint, u8),
        Pan(GeoPoint),
        Fit(Bounds),
        Alert(String),
        Redirect(String),
    }

    /// Surface that records every call for later inspection
    #[derive(Clone, Default)]
    pub struct RecordingSurface {
        pub calls: Arc<Mutex<Vec<SurfaceCall>>>,
    }

    impl RecordingSurface {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<SurfaceCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn clear(&self) {
            self.calls.lock().unwrap().clear();
        }

        pub fn alerts(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    SurfaceCall::Alert(m) => Some(m),
                    _ => None,
                })
                .collect()
        }

        pub fn redirects(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    SurfaceCall::Redirect(p) => Some(p),
                    _ => None,
                })
                .collect()
        }

        fn push(&self, call: SurfaceCall) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl DashboardSurface for RecordingSurface {
        fn render_status(&mut self, state: &PresentationState) {
            self.push(SurfaceCall::Status(state.clone()));
        }

        fn render_fields(&mut self, fields: &DisplayFields) {
            self.push(SurfaceCall::Fields(fields.clone()));
        }

        fn render_total(&mut self, total: &str) {
            self.push(SurfaceCall::Total(total.to_string()));
        }

        fn move_marker(&mut self, point: GeoPoint) {
            self.push(SurfaceCall::Marker(point));
        }

        fn append_trail(&mut self, point: GeoPoint) {
            self.push(SurfaceCall::Append(point));
        }

        fn replace_trail(&mut self, points: &[GeoPoint]) {
            self.push(SurfaceCall::Replace(points.to_vec()));
        }

        fn recenter(&mut self, point: GeoPoint, zoom: u8) {
            self.push(SurfaceCall::Recenter(point, zoom));
        }

        fn pan_to(&mut self, point: GeoPoint) {
            self.push(SurfaceCall::Pan(point));
        }

        fn fit_bounds(&mut self, bounds: Bounds) {
            self.push(SurfaceCall::Fit(bounds));
        }

        fn alert(&mut self, message: &str) {
            self.push(SurfaceCall::Alert(message.to_string()));
        }

        fn redirect(&mut self, path: &str) {
            self.push(SurfaceCall::Redirect(path.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_of_empty() {
        assert_eq!(Bounds::of(&[]), None);
    }

    #[test]
    fn test_bounds_of_single_point() {
        let p = GeoPoint::new(45.0, 4.0);
        let bounds = Bounds::of(&[p]).unwrap();
        assert_eq!(bounds.south_west, p);
        assert_eq!(bounds.north_east, p);
    }

    #[test]
    fn test_bounds_of_many_points() {
        let points = [
            GeoPoint::new(45.1, 4.9),
            GeoPoint::new(44.9, 4.7),
            GeoPoint::new(45.3, 4.8),
        ];
        let bounds = Bounds::of(&points).unwrap();
        assert_eq!(bounds.south_west, GeoPoint::new(44.9, 4.7));
        assert_eq!(bounds.north_east, GeoPoint::new(45.3, 4.9));
    }

    #[test]
    fn test_placeholder_fields() {
        let fields = DisplayFields::placeholder();
        assert!(fields.is_placeholder());
        assert_eq!(fields.coords, "--");
        assert_eq!(DisplayFields::default(), fields);
    }

    #[test]
    fn test_presentation_message() {
        let state = PresentationState::Live("Telemetry stream active".to_string());
        assert!(state.is_live());
        assert_eq!(state.message(), "Telemetry stream active");
        assert!(!PresentationState::Error("x".to_string()).is_live());
    }
}
