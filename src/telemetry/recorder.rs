//! # Sample Recorder
//!
//! Appends accepted samples to JSONL files with rotation.
//!
//! - One JSON object per line: the sample plus a `received_at` RFC 3339 stamp
//! - A new file is started every `max_records_per_file` records
//! - Only the newest `max_files_to_keep` files are retained

use chrono::Local;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::sample::TelemetrySample;
use crate::config::RecorderConfig;
use crate::error::Result;

const FILE_PREFIX: &str = "telemetry_";
const FILE_EXTENSION: &str = "jsonl";

#[derive(Serialize)]
struct Record<'a> {
    received_at: String,
    #[serde(flatten)]
    sample: &'a TelemetrySample,
}

/// Rotating JSONL writer for telemetry samples
#[derive(Debug)]
pub struct SampleRecorder {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    file_seq: u32,
}

impl SampleRecorder {
    /// Create a recorder writing into `config.log_dir`.
    ///
    /// The directory is created if needed. No file is opened until the
    /// first sample arrives.
    pub fn new(config: &RecorderConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&dir)?;
        info!("Recording samples to {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            file_seq: 0,
        })
    }

    /// Directory the recorder writes into
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one sample, rotating first if the current file is full.
    pub fn record(&mut self, sample: &TelemetrySample) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = Record {
            received_at: Local::now().to_rfc3339(),
            sample,
        };
        let line = serde_json::to_string(&record)?;

        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{}", line)?;
            writer.flush()?;
        }
        self.records_in_file += 1;
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            self.file_seq,
            FILE_EXTENSION
        );
        self.file_seq = self.file_seq.wrapping_add(1);

        let path = self.dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened telemetry file {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;
        self.prune()
    }

    /// Delete the oldest files beyond `max_files_to_keep`.
    fn prune(&self) -> Result<()> {
        let mut files = self.recorded_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        let excess = files.len() - self.max_files_to_keep;
        for path in files.drain(..excess) {
            debug!("Removing old telemetry file {}", path.display());
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Recorded files, oldest first
    pub fn recorded_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                let is_jsonl = path.extension().is_some_and(|ext| ext == FILE_EXTENSION);
                let has_prefix = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(FILE_PREFIX));
                is_jsonl && has_prefix
            })
            .collect();
        files.sort();
        Ok(files)
    }
}
