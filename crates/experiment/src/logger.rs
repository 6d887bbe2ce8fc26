//! Bounded-memory observation logging.
//!
//! A [`Logger`] samples the network at a fixed interval, buffers the
//! observations and flushes them as one batch whenever the buffer reaches
//! its limit. A persisted log is a sequence of lines, each holding one
//! flushed batch as a JSON array; files are only ever appended to.

use netsim_core::{Context, Network, NetworkSnapshot, Process, ProcessError, Step};
use netsim_simulation::Environment;
use netsim_types::SimTime;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while logging.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialise observation: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Logger has already been finalized")]
    Finalized,

    #[error("Logging interval must be at least one time unit")]
    InvalidInterval,
}

/// When the buffer is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Flush once this many observations are buffered.
    Items(usize),

    /// Flush once the buffer holds roughly this many serialised bytes.
    ///
    /// The serialised size of the first observation fixes an item limit of
    /// `max(1, budget / size)` for the rest of the run.
    Bytes(usize),
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Items(100)
    }
}

/// Where a finalized logger's observations ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum LogOutput<T> {
    Persisted(PathBuf),

    /// The observations themselves, when no file could be used.
    InMemory(Vec<T>),
}

impl<T> LogOutput<T> {
    pub fn path(&self) -> Option<&Path> {
        match self {
            LogOutput::Persisted(path) => Some(path),
            LogOutput::InMemory(_) => None,
        }
    }
}

enum Sink<T> {
    File { path: PathBuf, writer: BufWriter<File> },
    Memory(Vec<T>),
}

/// Extracts one observation from the network.
pub type StateFn<T> = Box<dyn Fn(&Network) -> T>;

/// Periodic, buffered recorder of network observations.
///
/// Every logger owns its buffer.
pub struct Logger<T> {
    interval: SimTime,
    capacity: Capacity,
    limit: Option<usize>,
    buffer: Vec<T>,
    state: StateFn<T>,
    sink: Option<Sink<T>>,
    flushes: usize,
    stored: usize,
}

impl Logger<NetworkSnapshot> {
    /// Log network snapshots to `path`, appending if it exists.
    pub fn to_file(
        path: impl Into<PathBuf>,
        interval: SimTime,
        capacity: Capacity,
    ) -> Result<Self, LogError> {
        if interval == 0 {
            return Err(LogError::InvalidInterval);
        }
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LogError::Io {
                path: path.clone(),
                source,
            })?;
        Self::with_sink(
            Sink::File {
                path,
                writer: BufWriter::new(file),
            },
            interval,
            capacity,
        )
    }

    /// Keep network snapshots in memory.
    pub fn in_memory(interval: SimTime, capacity: Capacity) -> Result<Self, LogError> {
        Self::with_sink(Sink::Memory(Vec::new()), interval, capacity)
    }

    fn with_sink(
        sink: Sink<NetworkSnapshot>,
        interval: SimTime,
        capacity: Capacity,
    ) -> Result<Self, LogError> {
        if interval == 0 {
            return Err(LogError::InvalidInterval);
        }
        Ok(Self {
            interval,
            capacity,
            limit: None,
            buffer: Vec::new(),
            state: Box::new(Network::snapshot),
            sink: Some(sink),
            flushes: 0,
            stored: 0,
        })
    }
}

impl<T: Serialize> Logger<T> {
    /// Replace what is extracted from the network on each tick.
    ///
    /// Call before anything is stored.
    pub fn with_state<U: Serialize>(self, state: impl Fn(&Network) -> U + 'static) -> Logger<U> {
        let sink = self.sink.map(|sink| match sink {
            Sink::File { path, writer } => Sink::File { path, writer },
            Sink::Memory(_) => Sink::Memory(Vec::new()),
        });
        Logger {
            interval: self.interval,
            capacity: self.capacity,
            limit: None,
            buffer: Vec::new(),
            state: Box::new(state),
            sink,
            flushes: 0,
            stored: 0,
        }
    }

    /// Extract one observation.
    pub fn get_state(&self, network: &Network) -> T {
        (self.state)(network)
    }

    /// Buffer an observation, flushing when the limit is reached.
    ///
    /// An observation that cannot be serialised (a NaN attribute, say) is
    /// rejected here so it never reaches a batch.
    pub fn store_state(&mut self, state: T) -> Result<(), LogError> {
        if self.sink.is_none() {
            return Err(LogError::Finalized);
        }
        serde_json::to_writer(io::sink(), &state)?;
        let limit = match self.limit {
            Some(limit) => limit,
            None => {
                let limit = self.derive_limit(&state)?;
                debug!(limit, capacity = ?self.capacity, "Log buffer limit derived");
                self.limit = Some(limit);
                limit
            }
        };

        self.buffer.push(state);
        self.stored += 1;
        if self.buffer.len() >= limit {
            self.flush()?;
        }
        Ok(())
    }

    /// Write the buffered batch as one unit and clear the buffer.
    pub fn flush(&mut self) -> Result<(), LogError> {
        let batch = std::mem::take(&mut self.buffer);
        match self.sink.as_mut() {
            None => return Err(LogError::Finalized),
            Some(Sink::File { path, writer }) => {
                let io_err = |source: io::Error| LogError::Io {
                    path: path.clone(),
                    source,
                };
                serde_json::to_writer(&mut *writer, &batch)?;
                writer.write_all(b"\n").map_err(&io_err)?;
                writer.flush().map_err(&io_err)?;
            }
            Some(Sink::Memory(kept)) => kept.extend(batch.into_iter()),
        }
        self.flushes += 1;
        trace!(flushes = self.flushes, "Log buffer flushed");
        Ok(())
    }

    /// Flush whatever is left, even nothing, and release the sink.
    pub fn finalize(&mut self) -> Result<LogOutput<T>, LogError> {
        self.flush()?;
        let output = match self.sink.take() {
            None => return Err(LogError::Finalized),
            Some(Sink::File { path, writer }) => {
                drop(writer);
                LogOutput::Persisted(path)
            }
            Some(Sink::Memory(kept)) => LogOutput::InMemory(kept),
        };
        debug!(stored = self.stored, flushes = self.flushes, "Logger finalized");
        Ok(output)
    }

    /// Hand the logger to `env`, which will call it every `interval` time
    /// units starting now.
    pub fn register(self, env: &mut Environment) -> LoggerHandle<T>
    where
        T: 'static,
    {
        let handle = LoggerHandle(Rc::new(RefCell::new(self)));
        env.process(Box::new(LogProcess(handle.clone())));
        handle
    }

    fn derive_limit(&self, first: &T) -> Result<usize, LogError> {
        Ok(match self.capacity {
            Capacity::Items(items) => items.max(1),
            Capacity::Bytes(budget) => {
                let size = serde_json::to_vec(first)?.len().max(1);
                (budget / size).max(1)
            }
        })
    }
}

impl<T> Logger<T> {
    pub fn interval(&self) -> SimTime {
        self.interval
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    /// Item limit, known once the first observation is stored.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Observations currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Observations stored since creation.
    pub fn stored(&self) -> usize {
        self.stored
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn is_finalized(&self) -> bool {
        self.sink.is_none()
    }

    /// File being written, if any.
    pub fn path(&self) -> Option<&Path> {
        match &self.sink {
            Some(Sink::File { path, .. }) => Some(path),
            _ => None,
        }
    }
}

impl<T> fmt::Debug for Logger<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("interval", &self.interval)
            .field("capacity", &self.capacity)
            .field("limit", &self.limit)
            .field("buffered", &self.buffer.len())
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

/// Shared handle to a registered logger.
pub struct LoggerHandle<T>(Rc<RefCell<Logger<T>>>);

impl<T> Clone for LoggerHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Serialize> LoggerHandle<T> {
    pub fn finalize(&self) -> Result<LogOutput<T>, LogError> {
        self.0.borrow_mut().finalize()
    }

    /// Run `f` against the logger.
    pub fn with<R>(&self, f: impl FnOnce(&Logger<T>) -> R) -> R {
        f(&self.0.borrow())
    }
}

impl<T> fmt::Debug for LoggerHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoggerHandle").field(&self.0.borrow()).finish()
    }
}

/// The recurring observation, as scheduled on the environment.
struct LogProcess<T>(LoggerHandle<T>);

impl<T: Serialize> Process for LogProcess<T> {
    fn resume(&mut self, ctx: &mut Context<'_>) -> Result<Step, ProcessError> {
        let mut logger = self.0 .0.borrow_mut();
        let state = logger.get_state(ctx.network());
        logger
            .store_state(state)
            .map_err(|e| ProcessError::Failed(format!("logging at t={}: {e}", ctx.now())))?;
        Ok(Step::Timeout(logger.interval))
    }
}
