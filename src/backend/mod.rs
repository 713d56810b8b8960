//! # Backend Module
//!
//! The HTTP contract the poller consumes.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | Trigger collection | `POST {base}/collect` |
//! | Latest sample | `GET {base}/latest` |
//! | Session totals | `GET {base}/sessions/{id}` |
//! | Session history | `GET {base}/sessions/{id}/measures` |
//!
//! [`TelemetryBackend`] is the seam; [`http::HttpBackend`] talks to a real
//! server and `mocks::ScriptedBackend` stands in for it in tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::telemetry::sample::{HistoryPoint, LatestPayload, SessionTotals};

pub mod http;

/// Async access to the telemetry backend
#[async_trait]
pub trait TelemetryBackend: Send + Sync {
    /// Ask the backend to pull a fresh reading from its sensors
    async fn collect(&self, session_id: Option<&str>) -> Result<()>;

    /// Fetch the most recent reading
    async fn latest(&self) -> Result<LatestPayload>;

    /// Fetch totals for a session
    async fn session_totals(&self, session_id: &str) -> Result<SessionTotals>;

    /// Fetch the full measurement history of a session
    async fn session_measures(&self, session_id: &str) -> Result<Vec<HistoryPoint>>;
}
