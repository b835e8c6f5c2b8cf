//! Emission ledger
//!
//! Append-only record of emission times plus a parallel record of failed
//! arrivals. Persisted as one value so both sequences always travel
//! together, and reloaded read-only for playback.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::LedgerError;

/// On-disk encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LedgerFormat {
    /// Compact binary (`.bin`, `.data`)
    #[default]
    Bincode,
    /// Human readable (`.json`)
    Json,
}

impl LedgerFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "bin" | "data" => Some(Self::Bincode),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, LedgerError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| LedgerError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedLedger {
    timestamps: Vec<f64>,
    failure_timestamps: Vec<f64>,
}

/// Ordered emission and failure timestamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionLedger {
    timestamps: Vec<f64>,
    failure_timestamps: Vec<f64>,
}

impl EmissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from already recorded sequences
    pub fn from_parts(timestamps: Vec<f64>, failure_timestamps: Vec<f64>) -> Self {
        Self {
            timestamps,
            failure_timestamps,
        }
    }

    pub fn append(&mut self, timestamp: f64) {
        self.timestamps.push(timestamp);
    }

    pub fn append_failure(&mut self, timestamp: f64) {
        self.failure_timestamps.push(timestamp);
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    pub fn failure_timestamps(&self) -> &[f64] {
        &self.failure_timestamps
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Time between the first and last emission
    pub fn span(&self) -> Option<f64> {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        }
    }

    /// Verify against the emission count without writing anything
    pub fn check_consistency(&self, expected_count: u64) -> Result<(), LedgerError> {
        if self.timestamps.len() as u64 != expected_count {
            return Err(LedgerError::Consistency {
                expected: expected_count,
                actual: self.timestamps.len(),
            });
        }
        Ok(())
    }

    /// Persist both sequences to `path`
    ///
    /// The data is written to a sibling temporary file and renamed over the
    /// destination, so an earlier ledger at `path` survives any failure.
    #[instrument(
        name = "ledger_persist",
        skip(self, path),
        fields(path = %path.display(), entries = self.timestamps.len())
    )]
    pub fn persist(
        &self,
        path: &Path,
        expected_count: u64,
        format: LedgerFormat,
    ) -> Result<(), LedgerError> {
        self.check_consistency(expected_count)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))?;
        }

        let tmp_path = temp_path_for(path);
        let result = self
            .write_to(&tmp_path, format)
            .and_then(|()| fs::rename(&tmp_path, path).map_err(|e| LedgerError::io(path, e)));

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        } else {
            debug!(failures = self.failure_timestamps.len(), "ledger persisted");
        }
        result
    }

    /// Persist with the format inferred from the extension
    pub fn persist_to(&self, path: &Path, expected_count: u64) -> Result<(), LedgerError> {
        self.persist(path, expected_count, LedgerFormat::from_path(path)?)
    }

    /// Load a persisted ledger, format inferred from the extension
    #[instrument(name = "ledger_load", skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let format = LedgerFormat::from_path(path)?;
        let file = File::open(path).map_err(|e| LedgerError::io(path, e))?;
        let reader = BufReader::new(file);

        let persisted: PersistedLedger = match format {
            LedgerFormat::Bincode => {
                bincode::deserialize_from(reader).map_err(|e| LedgerError::Decode {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            }
            LedgerFormat::Json => {
                serde_json::from_reader(reader).map_err(|e| LedgerError::Decode {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
            }
        };

        Ok(Self {
            timestamps: persisted.timestamps,
            failure_timestamps: persisted.failure_timestamps,
        })
    }

    fn write_to(&self, path: &Path, format: LedgerFormat) -> Result<(), LedgerError> {
        let persisted = PersistedLedger {
            timestamps: self.timestamps.clone(),
            failure_timestamps: self.failure_timestamps.clone(),
        };

        let file = File::create(path).map_err(|e| LedgerError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        match format {
            LedgerFormat::Bincode => bincode::serialize_into(&mut writer, &persisted)
                .map_err(|e| LedgerError::Encode(e.to_string()))?,
            LedgerFormat::Json => serde_json::to_writer(&mut writer, &persisted)
                .map_err(|e| LedgerError::Encode(e.to_string()))?,
        }

        let file = writer
            .into_inner()
            .map_err(|e| LedgerError::io(path, e.into_error()))?;
        file.sync_all().map_err(|e| LedgerError::io(path, e))?;
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger".into());
    name.push(".tmp");
    path.with_file_name(name)
}
