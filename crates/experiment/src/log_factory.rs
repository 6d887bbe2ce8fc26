//! Naming and opening per-point log files.

use crate::logger::{Capacity, LogError, Logger};
use crate::GridPoint;
use netsim_core::NetworkSnapshot;
use netsim_types::SimTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Seconds since the unix epoch, or 0 if the clock is before it.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Creates loggers writing to `prefix_name_id_timestamp.extension` inside a
/// results directory. Empty name parts are skipped.
#[derive(Debug, Clone)]
pub struct LoggerFactory {
    results_dir: PathBuf,
    prefix: String,
    name: String,
    id: String,
    timestamp: String,
    extension: String,
    interval: SimTime,
    capacity: Capacity,
    replace_previous: bool,
}

impl LoggerFactory {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            prefix: "log".into(),
            name: "simulation".into(),
            id: String::new(),
            timestamp: unix_timestamp().to_string(),
            extension: "json".into(),
            interval: 1,
            capacity: Capacity::default(),
            replace_previous: false,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Use the short hash of `point` as the id, so results can be found
    /// again from the grid.
    pub fn with_point(self, point: &GridPoint) -> Self {
        self.with_id(point.hash().short_hex())
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_interval(mut self, interval: SimTime) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    /// Remove earlier files with the same prefix, name and id on build.
    pub fn with_replace_previous(mut self, replace: bool) -> Self {
        self.replace_previous = replace;
        self
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// `prefix_name_id`, empty parts skipped.
    pub fn file_prefix(&self) -> String {
        join_parts(&[self.prefix.as_str(), &self.name, &self.id])
    }

    /// `prefix_name_id_timestamp.extension`, empty parts skipped.
    pub fn file_name(&self) -> String {
        let stem = join_parts(&[self.prefix.as_str(), &self.name, &self.id, &self.timestamp]);
        if self.extension.is_empty() {
            stem
        } else {
            format!("{stem}.{}", self.extension)
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.results_dir.join(self.file_name())
    }

    /// Open a logger on a new file.
    ///
    /// If the results directory cannot be created or the file cannot be
    /// opened, the logger keeps its observations in memory instead.
    pub fn build(&self) -> Result<Logger<NetworkSnapshot>, LogError> {
        if let Err(error) = fs::create_dir_all(&self.results_dir) {
            warn!(
                dir = %self.results_dir.display(),
                %error,
                "Cannot create results directory; logging in memory"
            );
            return Logger::in_memory(self.interval, self.capacity);
        }

        if self.replace_previous {
            self.remove_previous()?;
        }

        let path = self.file_path();
        match Logger::to_file(&path, self.interval, self.capacity) {
            Ok(logger) => {
                info!(path = %path.display(), "Logging to file");
                Ok(logger)
            }
            Err(LogError::Io { source, .. }) => {
                warn!(path = %path.display(), error = %source, "Cannot open log file; logging in memory");
                Logger::in_memory(self.interval, self.capacity)
            }
            Err(other) => Err(other),
        }
    }

    fn remove_previous(&self) -> Result<(), LogError> {
        let io_err = |source: std::io::Error| LogError::Io {
            path: self.results_dir.clone(),
            source,
        };
        let prefix = self.file_prefix();
        for entry in fs::read_dir(&self.results_dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let matches = name
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('_') || rest.starts_with('.'));
            if matches && entry.path().is_file() {
                fs::remove_file(entry.path()).map_err(|source| LogError::Io {
                    path: entry.path(),
                    source,
                })?;
                info!(file = name, "Removed previous log");
            }
        }
        Ok(())
    }
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}
