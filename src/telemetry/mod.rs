//! # Telemetry Module
//!
//! Sample payloads, formatting and recording.
//!
//! This module handles:
//! - Decoding `/latest`, session and history payloads
//! - Validating positions and coercing loosely typed numbers
//! - Formatting fields for display, with placeholders for missing values
//! - Writing accepted samples to rotating JSONL files

pub mod format;
pub mod recorder;
pub mod sample;
