//! Terminal dashboard surface.
//!
//! Renders updates as log lines. Status changes and alerts are logged at
//! `info`/`warn`; per-tick field and view updates go to `debug` so a normal
//! run stays readable.

use tracing::{debug, info, warn};

use super::{Bounds, DashboardSurface, DisplayFields, GeoPoint, PresentationState};

/// Dashboard surface that writes to the tracing subscriber
#[derive(Debug)]
pub struct TerminalSurface {
    /// Origin prefixed to redirect paths, e.g. `http://127.0.0.1:8000`
    origin: String,
    last_status: Option<PresentationState>,
    trail_len: usize,
}

impl TerminalSurface {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            last_status: None,
            trail_len: 0,
        }
    }

    /// Number of trail points currently drawn
    pub fn trail_len(&self) -> usize {
        self.trail_len
    }
}

impl DashboardSurface for TerminalSurface {
    fn render_status(&mut self, state: &PresentationState) {
        if self.last_status.as_ref() == Some(state) {
            return;
        }
        match state {
            PresentationState::Live(m) => info!("[live] {}", m),
            PresentationState::Idle(m) => info!("[idle] {}", m),
            PresentationState::Error(m) => warn!("[error] {}", m),
        }
        self.last_status = Some(state.clone());
    }

    fn render_fields(&mut self, fields: &DisplayFields) {
        if fields.is_placeholder() {
            debug!("Telemetry panel cleared");
            return;
        }
        info!(
            "{} | {} | {} | {} | batt {} | {} | {}",
            fields.coords,
            fields.temperature,
            fields.humidity,
            fields.pressure,
            fields.battery,
            fields.distance,
            fields.timestamp
        );
    }

    fn render_total(&mut self, total: &str) {
        info!("{}", total);
    }

    fn move_marker(&mut self, point: GeoPoint) {
        debug!("Marker at {:.5}, {:.5}", point.lat, point.lon);
    }

    fn append_trail(&mut self, _point: GeoPoint) {
        self.trail_len += 1;
    }

    fn replace_trail(&mut self, points: &[GeoPoint]) {
        self.trail_len = points.len();
        info!("Trail loaded with {} points", points.len());
    }

    fn recenter(&mut self, point: GeoPoint, zoom: u8) {
        debug!("Recenter on {:.5}, {:.5} (zoom {})", point.lat, point.lon, zoom);
    }

    fn pan_to(&mut self, point: GeoPoint) {
        debug!("Pan to {:.5}, {:.5}", point.lat, point.lon);
    }

    fn fit_bounds(&mut self, bounds: Bounds) {
        debug!(
            "Fit view to [{:.5}, {:.5}] - [{:.5}, {:.5}]",
            bounds.south_west.lat, bounds.south_west.lon, bounds.north_east.lat, bounds.north_east.lon
        );
    }

    fn alert(&mut self, message: &str) {
        warn!("{}", message);
    }

    fn redirect(&mut self, path: &str) {
        warn!("Session expired, sign in again at {}{}", self.origin, path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_trimmed() {
        let surface = TerminalSurface::new("http://127.0.0.1:8000/");
        assert_eq!(surface.origin, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_trail_length_tracking() {
        let mut surface = TerminalSurface::new("http://localhost");
        surface.append_trail(GeoPoint::new(1.0, 2.0));
        surface.append_trail(GeoPoint::new(1.1, 2.1));
        assert_eq!(surface.trail_len(), 2);

        surface.replace_trail(&[GeoPoint::new(3.0, 4.0)]);
        assert_eq!(surface.trail_len(), 1);
    }

    #[test]
    fn test_repeated_status_is_deduplicated() {
        let mut surface = TerminalSurface::new("http://localhost");
        let state = PresentationState::Idle("Waiting for data".to_string());
        surface.render_status(&state);
        surface.render_status(&state);
        assert_eq!(surface.last_status, Some(state));
    }
}
