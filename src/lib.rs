//! # Telemetry Poller Library
//!
//! Poll a tracking backend for live runner telemetry and drive a map
//! dashboard.
//!
//! This library provides the polling state machine, the backend HTTP
//! contract and the display seam. Rendering is left to whatever implements
//! [`dashboard::DashboardSurface`].

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod poller;
pub mod session;
pub mod telemetry;
