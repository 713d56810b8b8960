//! # Poller Module
//!
//! The polling state machine.
//!
//! Every tick the poller:
//! 1. triggers a (throttled) collect on the backend
//! 2. fetches the latest sample and validates it
//! 3. derives the presentation state ({live, idle, error}) and pushes
//!    fields, marker, trail and view changes to the dashboard surface
//! 4. refreshes the session total when a session is known
//!
//! Network and parse failures become presentation state. The only thing
//! that escalates is an authorization failure, which redirects to the
//! login path once and stops all further polling.
//!
//! Ticks may overlap. Each latest fetch carries a sequence number and a
//! response older than the one on screen is dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::TelemetryBackend;
use crate::config::Config;
use crate::dashboard::{Bounds, DashboardSurface, DisplayFields, GeoPoint, PresentationState};
use crate::error::{PollerError, Result};
use crate::session::SessionContext;
use crate::telemetry::format::{display_fields, format_total_distance};
use crate::telemetry::recorder::SampleRecorder;
use crate::telemetry::sample::{validate_latest, LatestPayload, Rejection, TelemetrySample};

pub mod collect;

pub use collect::{CollectOutcome, CollectThrottle, SkipReason};

pub const MSG_LIVE: &str = "Telemetry stream active";
pub const MSG_WAITING: &str = "Waiting for data";
pub const MSG_INVALID_POSITION: &str = "Invalid position";
pub const MSG_BACKEND_UNAVAILABLE: &str = "Backend unavailable";
pub const MSG_BACKEND_UNREACHABLE: &str = "Backend unreachable";
pub const MSG_NO_SESSION: &str = "No active session. Register a runner first.";
pub const MSG_HISTORY_FAILED: &str = "Unable to load history.";

/// Timing and feature switches for the poller
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub collect_enabled: bool,
    pub collect_cooldown: Duration,
    pub recenter_after: Duration,
    pub recenter_zoom: u8,
    pub login_path: String,
}

impl PollerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            collect_enabled: config.poller.collect_enabled,
            collect_cooldown: Duration::from_millis(config.poller.collect_cooldown_ms),
            recenter_after: Duration::from_millis(config.poller.recenter_after_ms),
            recenter_zoom: config.poller.recenter_zoom,
            login_path: config.backend.login_path.clone(),
        }
    }
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// What is currently on screen
#[derive(Debug)]
struct ViewState {
    presentation: PresentationState,
    fields: DisplayFields,
    trail: Vec<GeoPoint>,
    total: Option<String>,
    last_update: Option<Instant>,
    displayed_seq: u64,
    login_required: bool,
}

impl ViewState {
    fn new() -> Self {
        Self {
            presentation: PresentationState::Idle(MSG_WAITING.to_string()),
            fields: DisplayFields::placeholder(),
            trail: Vec::new(),
            total: None,
            last_update: None,
            displayed_seq: 0,
            login_required: false,
        }
    }
}

/// What a latest response turns into
enum LatestAction {
    Clear(PresentationState),
    Show(TelemetrySample),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock leaves plain data behind; keep going
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Short message for a failed collect, shown after "Partial data: "
fn collect_error_message(error: &PollerError) -> String {
    match error {
        PollerError::Status { reason: Some(reason), .. } => reason.clone(),
        other => other.to_string(),
    }
}

/// Telemetry poller for one dashboard session
pub struct Poller {
    settings: PollerSettings,
    backend: Arc<dyn TelemetryBackend>,
    surface: Mutex<Box<dyn DashboardSurface>>,
    session: SessionContext,
    collect: Mutex<CollectThrottle>,
    state: Mutex<ViewState>,
    recorder: Option<Mutex<SampleRecorder>>,
    next_seq: AtomicU64,
}

impl std::fmt::Debug for Poller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("settings", &self.settings)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Create a poller.
    ///
    /// # Arguments
    ///
    /// * `settings` - Timing and feature switches
    /// * `backend` - Where telemetry comes from
    /// * `surface` - Where it is displayed
    /// * `session` - Session context resolved at startup
    pub fn new(
        settings: PollerSettings,
        backend: Arc<dyn TelemetryBackend>,
        surface: Box<dyn DashboardSurface>,
        session: SessionContext,
    ) -> Self {
        let cooldown = settings.collect_cooldown;
        Self {
            settings,
            backend,
            surface: Mutex::new(surface),
            session,
            collect: Mutex::new(CollectThrottle::new(cooldown)),
            state: Mutex::new(ViewState::new()),
            recorder: None,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Record every accepted sample with `recorder`
    pub fn with_recorder(mut self, recorder: SampleRecorder) -> Self {
        self.recorder = Some(Mutex::new(recorder));
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn presentation(&self) -> PresentationState {
        lock(&self.state).presentation.clone()
    }

    pub fn fields(&self) -> DisplayFields {
        lock(&self.state).fields.clone()
    }

    pub fn trail(&self) -> Vec<GeoPoint> {
        lock(&self.state).trail.clone()
    }

    pub fn total(&self) -> Option<String> {
        lock(&self.state).total.clone()
    }

    /// True once an authorization failure has redirected to login
    pub fn login_required(&self) -> bool {
        lock(&self.state).login_required
    }

    pub fn last_collect_error(&self) -> String {
        lock(&self.collect).last_error().to_string()
    }

    pub fn collect_in_flight(&self) -> bool {
        lock(&self.collect).in_flight()
    }

    /// Initial page load: show the idle state, then pull session data.
    pub async fn start(&self) {
        {
            let state = lock(&self.state);
            let mut surface = lock(&self.surface);
            surface.render_status(&state.presentation);
            surface.render_fields(&state.fields);
        }

        self.load_session_meta().await;
        if self.session.is_present() {
            self.load_history().await;
        }
    }

    /// Ask the backend to collect a fresh reading.
    ///
    /// Skipped when collect is disabled, while another request is in
    /// flight, or (unless `force`) within the cooldown of the last attempt.
    pub async fn trigger_collect(&self, force: bool) -> CollectOutcome {
        if !self.settings.collect_enabled {
            return CollectOutcome::Skipped(SkipReason::Disabled);
        }
        if self.login_required() {
            return CollectOutcome::Skipped(SkipReason::LoginRequired);
        }

        let begun = lock(&self.collect).try_begin(force, Instant::now());
        if let Err(reason) = begun {
            debug!("Collect skipped: {:?}", reason);
            return CollectOutcome::Skipped(reason);
        }

        let result = self.backend.collect(self.session.id()).await;

        match result {
            Ok(()) => {
                lock(&self.collect).finish_ok();
                debug!("Collect succeeded");
                CollectOutcome::Sent
            }
            Err(e) if e.is_auth_failure() => {
                lock(&self.collect).finish_auth();
                self.require_login(&e);
                CollectOutcome::LoginRequired
            }
            Err(e) => {
                let message = collect_error_message(&e);
                warn!("Collect failed: {}", e);
                lock(&self.collect).finish_err(message.clone());
                CollectOutcome::Failed(message)
            }
        }
    }

    /// One polling tick.
    pub async fn refresh(&self) {
        if self.login_required() {
            return;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let (_, latest) = tokio::join!(self.trigger_collect(false), self.backend.latest());
        self.apply_latest(seq, latest);

        if self.session.is_present() && !self.login_required() {
            self.load_session_meta().await;
        }
    }

    /// Turn a latest response into presentation state.
    fn apply_latest(&self, seq: u64, result: Result<LatestPayload>) {
        let collect_error = self.last_collect_error();

        let action = match result {
            Err(e) if e.is_auth_failure() => {
                self.require_login(&e);
                return;
            }
            Err(e @ PollerError::Status { .. }) => {
                warn!("Latest failed: {}", e);
                LatestAction::Clear(PresentationState::Error(MSG_BACKEND_UNAVAILABLE.to_string()))
            }
            Err(e) => {
                warn!("Latest unreachable: {}", e);
                LatestAction::Clear(PresentationState::Error(MSG_BACKEND_UNREACHABLE.to_string()))
            }
            Ok(payload) => match validate_latest(&payload) {
                Ok(sample) => LatestAction::Show(sample),
                Err(Rejection::MissingPosition) => {
                    LatestAction::Clear(PresentationState::Idle(MSG_WAITING.to_string()))
                }
                Err(Rejection::InvalidPosition) => {
                    debug!("Rejected sample with non-finite position");
                    LatestAction::Clear(PresentationState::Idle(MSG_INVALID_POSITION.to_string()))
                }
            },
        };

        let recorded = {
            let mut state = lock(&self.state);
            if state.login_required {
                return;
            }
            if seq < state.displayed_seq {
                debug!("Dropping stale latest response #{} (showing #{})", seq, state.displayed_seq);
                return;
            }
            state.displayed_seq = seq;

            let mut surface = lock(&self.surface);
            match action {
                LatestAction::Clear(presentation) => {
                    state.fields = DisplayFields::placeholder();
                    state.presentation = presentation;
                    surface.render_fields(&state.fields);
                    surface.render_status(&state.presentation);
                    None
                }
                LatestAction::Show(sample) => {
                    let now = Instant::now();
                    let point = sample.position;

                    state.fields = display_fields(&sample);
                    surface.render_fields(&state.fields);

                    surface.move_marker(point);
                    state.trail.push(point);
                    surface.append_trail(point);

                    let stale_view = state
                        .last_update
                        .map_or(true, |last| now.saturating_duration_since(last) > self.settings.recenter_after);
                    if stale_view {
                        surface.recenter(point, self.settings.recenter_zoom);
                    } else {
                        surface.pan_to(point);
                    }

                    state.presentation = if collect_error.is_empty() {
                        PresentationState::Live(MSG_LIVE.to_string())
                    } else {
                        PresentationState::Live(format!("Partial data: {}", collect_error))
                    };
                    surface.render_status(&state.presentation);
                    state.last_update = Some(now);
                    Some(sample)
                }
            }
        };

        if let (Some(sample), Some(recorder)) = (recorded, self.recorder.as_ref()) {
            if let Err(e) = lock(recorder).record(&sample) {
                warn!("Failed to record sample: {}", e);
            }
        }
    }

    /// Latch the login redirect; the surface is told only once.
    fn require_login(&self, error: &PollerError) {
        {
            let mut state = lock(&self.state);
            if state.login_required {
                return;
            }
            state.login_required = true;
        }
        info!("Authorization lost ({}), redirecting to {}", error, self.settings.login_path);
        lock(&self.surface).redirect(&self.settings.login_path);
    }

    /// Refresh the session total. Failures keep the previous value.
    pub async fn load_session_meta(&self) {
        let Some(id) = self.session.id() else {
            return;
        };

        match self.backend.session_totals(id).await {
            Ok(totals) if totals.total_distance_m.is_finite() => {
                let text = format_total_distance(totals.total_distance_m);
                let mut state = lock(&self.state);
                lock(&self.surface).render_total(&text);
                state.total = Some(text);
            }
            Ok(totals) => debug!("Ignoring non-finite session total {}", totals.total_distance_m),
            Err(e) => debug!("Session meta unavailable: {}", e),
        }
    }

    /// Replace the trail with the session's full history.
    pub async fn load_history(&self) {
        let Some(id) = self.session.id() else {
            lock(&self.surface).alert(MSG_NO_SESSION);
            return;
        };

        let measures = match self.backend.session_measures(id).await {
            Ok(measures) => measures,
            Err(e) => {
                warn!("History load failed: {}", e);
                lock(&self.surface).alert(MSG_HISTORY_FAILED);
                return;
            }
        };

        let points: Vec<GeoPoint> = measures.iter().filter_map(|m| m.to_geo_point()).collect();
        if points.len() < measures.len() {
            debug!("Dropped {} history points without a valid position", measures.len() - points.len());
        }

        let mut state = lock(&self.state);
        let mut surface = lock(&self.surface);
        surface.replace_trail(&points);
        if let Some(bounds) = Bounds::of(&points) {
            surface.fit_bounds(bounds);
        }
        info!("Loaded {} history points", points.len());
        state.trail = points;
    }
}
