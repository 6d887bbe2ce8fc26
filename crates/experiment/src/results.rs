//! Loading persisted logs back into memory.

use crate::{Grid, GridPoint};
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while loading results.
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("Results file not found: {0}")]
    NotFound(PathBuf),

    #[error("No file in {root} matches point hash {hash}")]
    NoMatchingFile { root: PathBuf, hash: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Result set is finalized")]
    Finalized,
}

/// Observations reconstructed from one log, in the order they were logged.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet<T> {
    observations: Vec<T>,
    open: bool,
}

impl<T: DeserializeOwned> ResultSet<T> {
    /// Load the log at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ResultsError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ResultsError::NotFound(path.to_path_buf()),
            _ => ResultsError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let results = Self::from_reader(file).map_err(|e| match e {
            ResultsError::Io { source, .. } => ResultsError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!(path = %path.display(), observations = results.len(), "Results loaded");
        Ok(results)
    }

    /// Read batches until the data ends.
    ///
    /// Each line holds one batch. A line that does not parse (a batch cut
    /// short by a crash, or garbage after the last batch) ends the data: it
    /// and everything after it are dropped with a warning.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, ResultsError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| ResultsError::Io {
                path: PathBuf::new(),
                source,
            })?;

        let mut results = Self::open();
        for (line_no, line) in bytes.split(|&b| b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<Vec<T>>(line) {
                Ok(batch) => results.extend(batch)?,
                Err(error) => {
                    warn!(batch = line_no, %error, "Unreadable batch; treating as end of data");
                    break;
                }
            }
        }
        results.finalize();
        Ok(results)
    }
}

impl<T> ResultSet<T> {
    fn open() -> Self {
        Self {
            observations: Vec::new(),
            open: true,
        }
    }

    fn extend(&mut self, batch: Vec<T>) -> Result<(), ResultsError> {
        if !self.open {
            return Err(ResultsError::Finalized);
        }
        self.observations.extend(batch);
        Ok(())
    }

    fn finalize(&mut self) {
        self.open = false;
    }

    /// Whether batches may still be appended. Always false once loaded.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.observations.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.observations
    }

    pub fn into_inner(self) -> Vec<T> {
        self.observations
    }
}

impl<'a, T> IntoIterator for &'a ResultSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Load the results of every point of `grid` from `root`.
///
/// The file for a point is the one whose name contains the point's short
/// hash; when several do, the lexicographically last (the latest timestamp)
/// is used. A point without a file gets its own error and does not affect
/// the others.
pub fn from_grid<T: DeserializeOwned>(
    grid: &Grid,
    root: impl AsRef<Path>,
) -> Result<Vec<(GridPoint, Result<ResultSet<T>, ResultsError>)>, ResultsError> {
    let root = root.as_ref();
    let io_err = |source: io::Error| match source.kind() {
        io::ErrorKind::NotFound => ResultsError::NotFound(root.to_path_buf()),
        _ => ResultsError::Io {
            path: root.to_path_buf(),
            source,
        },
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(root).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();

    Ok(grid
        .iter()
        .map(|point| {
            let hash = point.hash().short_hex();
            let result = match names.iter().rev().find(|name| name.contains(&hash)) {
                Some(name) => ResultSet::from_path(root.join(name)),
                None => Err(ResultsError::NoMatchingFile {
                    root: root.to_path_buf(),
                    hash,
                }),
            };
            (point, result)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing_test::traced_test;

    #[test]
    fn test_batches_concatenate_in_order() {
        let data = b"[1,2]\n[3]\n[]\n[4,5]\n";
        let results: ResultSet<u32> = ResultSet::from_reader(&data[..]).unwrap();
        assert_eq!(results.as_slice(), &[1, 2, 3, 4, 5]);
        assert!(!results.is_open());
    }

    #[traced_test]
    #[test]
    fn test_truncated_trailing_batch_is_end_of_data() {
        let data = b"[1,2]\n[3,4]\n[5,";
        let results: ResultSet<u32> = ResultSet::from_reader(&data[..]).unwrap();
        assert_eq!(results.into_inner(), vec![1, 2, 3, 4]);
        assert!(logs_contain("treating as end of data"));
    }

    #[test]
    fn test_empty_input() {
        let results: ResultSet<u32> = ResultSet::from_reader(&b""[..]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        match ResultSet::<u32>::from_path(&path) {
            Err(ResultsError::NotFound(p)) => assert_eq!(p, path),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_from_grid_matches_by_hash() {
        let dir = tempfile::tempdir().unwrap();
        let mut grid = Grid::new();
        grid.add_dimension("seed", [0i64, 1, 2], None);

        let points: Vec<_> = grid.iter().collect();
        // Seed 0 has an older and a newer file; seed 2 has none.
        let write = |point: &GridPoint, stamp: &str, body: &str| {
            let name = format!("log_sim_{}_{stamp}.json", point.hash().short_hex());
            let mut file = File::create(dir.path().join(name)).unwrap();
            file.write_all(body.as_bytes()).unwrap();
        };
        write(&points[0], "100", "[0]\n");
        write(&points[0], "200", "[10,11]\n");
        write(&points[1], "100", "[1]\n");

        let loaded = from_grid::<i64>(&grid, dir.path()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].0, points[0]);
        assert_eq!(loaded[0].1.as_ref().unwrap().as_slice(), &[10, 11]);
        assert_eq!(loaded[1].1.as_ref().unwrap().as_slice(), &[1]);
        assert!(matches!(loaded[2].1, Err(ResultsError::NoMatchingFile { .. })));

        let sub = grid.subgrid_from_indices([("seed", [1usize])]).unwrap();
        let loaded = from_grid::<i64>(&sub, dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].1.is_ok());
    }

    #[test]
    fn test_from_grid_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let grid = Grid::new();
        assert!(matches!(
            from_grid::<i64>(&grid, dir.path().join("nope")),
            Err(ResultsError::NotFound(_))
        ));
    }
}
