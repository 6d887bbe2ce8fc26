//! Parameter grids: named dimensions and their Cartesian product.

use indexmap::IndexMap;
use netsim_types::{Hash, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Errors raised by grid selections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Grid has no dimension named {0}")]
    UnknownDimension(String),

    #[error("Index {index} is out of range for dimension {dimension} of length {len}")]
    IndexOutOfRange {
        dimension: String,
        index: usize,
        len: usize,
    },

    #[error("Range {start}..{end} is invalid for dimension {dimension} of length {len}")]
    InvalidRange {
        dimension: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// One assignment of a value to every dimension of a grid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridPoint(IndexMap<String, Value>);

impl GridPoint {
    pub fn get(&self, dimension: &str) -> Option<&Value> {
        self.0.get(dimension)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }

    /// Content hash of the point, independent of dimension order.
    ///
    /// blake3 over the JSON encoding of the point with keys sorted.
    pub fn hash(&self) -> Hash {
        let sorted: BTreeMap<&str, &Value> = self.iter().collect();
        // Non-finite floats have no JSON form; their Debug text keeps them distinct.
        let bytes = serde_json::to_vec(&sorted).unwrap_or_else(|_| format!("{sorted:?}").into_bytes());
        Hash::from_bytes(&bytes)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for GridPoint {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

/// Named dimensions, each an ordered list of values, with optional
/// descriptions.
///
/// Equality compares the dimension and description maps; key order is
/// ignored, value order within a dimension is not.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Grid {
    dimensions: IndexMap<String, Vec<Value>>,
    descriptions: IndexMap<String, Option<String>>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dimension.
    pub fn add_dimension<V: Into<Value>>(
        &mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
        description: Option<&str>,
    ) -> &mut Self {
        let name = name.into();
        self.dimensions
            .insert(name.clone(), values.into_iter().map(Into::into).collect());
        self.descriptions
            .insert(name, description.map(str::to_string));
        self
    }

    pub fn add_description(
        &mut self,
        name: &str,
        description: impl Into<String>,
    ) -> Result<&mut Self, GridError> {
        let slot = self
            .descriptions
            .get_mut(name)
            .ok_or_else(|| GridError::UnknownDimension(name.to_string()))?;
        *slot = Some(description.into());
        Ok(self)
    }

    pub fn dimension(&self, name: &str) -> Option<&[Value]> {
        self.dimensions.get(name).map(Vec::as_slice)
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.descriptions.get(name).and_then(|d| d.as_deref())
    }

    /// Dimension names in insertion order.
    pub fn dimension_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.dimensions.keys().map(String::as_str)
    }

    pub fn number_of_dimensions(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of points: the product of the dimension lengths, saturating at
    /// `usize::MAX`.
    pub fn len(&self) -> usize {
        if self.dimensions.values().any(Vec::is_empty) {
            return 0;
        }
        self.dimensions
            .values()
            .try_fold(1usize, |acc, values| acc.checked_mul(values.len()))
            .unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the Cartesian product, last dimension varying fastest.
    ///
    /// Each call starts a fresh pass. A grid without dimensions has one
    /// empty point; a grid with an empty dimension has none.
    pub fn iter(&self) -> GridIter<'_> {
        GridIter {
            grid: self,
            cursor: vec![0; self.dimensions.len()],
            remaining: self.len(),
        }
    }

    /// Half-open slice of each named dimension.
    pub fn subgrid_from_range<S: AsRef<str>>(
        &self,
        selection: impl IntoIterator<Item = (S, Range<usize>)>,
    ) -> Result<Grid, GridError> {
        self.subgrid(selection, |name, values, range: Range<usize>| {
            if range.start > range.end || range.end > values.len() {
                return Err(GridError::InvalidRange {
                    dimension: name.to_string(),
                    start: range.start,
                    end: range.end,
                    len: values.len(),
                });
            }
            Ok(values[range].to_vec())
        })
    }

    /// Values at the given positions of each named dimension, in the order
    /// the positions are listed.
    pub fn subgrid_from_indices<S: AsRef<str>, I: AsRef<[usize]>>(
        &self,
        selection: impl IntoIterator<Item = (S, I)>,
    ) -> Result<Grid, GridError> {
        self.subgrid(selection, |name, values, indices: I| {
            indices
                .as_ref()
                .iter()
                .map(|&index| {
                    values.get(index).cloned().ok_or_else(|| GridError::IndexOutOfRange {
                        dimension: name.to_string(),
                        index,
                        len: values.len(),
                    })
                })
                .collect()
        })
    }

    /// Values of each named dimension that appear in the given list, in
    /// their original order.
    pub fn subgrid_from_values<S: AsRef<str>, L: AsRef<[Value]>>(
        &self,
        selection: impl IntoIterator<Item = (S, L)>,
    ) -> Result<Grid, GridError> {
        self.subgrid(selection, |_, values, keep: L| {
            Ok(values
                .iter()
                .filter(|v| keep.as_ref().contains(*v))
                .cloned()
                .collect())
        })
    }

    /// Only the named dimensions, unchanged, in the order given.
    pub fn subgrid_from_dimensions<S: AsRef<str>>(
        &self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Grid, GridError> {
        let mut grid = Grid::new();
        for name in names {
            let name = name.as_ref();
            let values = self
                .dimensions
                .get(name)
                .ok_or_else(|| GridError::UnknownDimension(name.to_string()))?;
            grid.dimensions.insert(name.to_string(), values.clone());
            grid.descriptions
                .insert(name.to_string(), self.descriptions.get(name).cloned().flatten());
        }
        Ok(grid)
    }

    /// Copy of this grid with each selected dimension's values replaced by
    /// `filter(name, values, arg)`. Unselected dimensions are kept as is.
    fn subgrid<S, A, F>(
        &self,
        selection: impl IntoIterator<Item = (S, A)>,
        filter: F,
    ) -> Result<Grid, GridError>
    where
        S: AsRef<str>,
        F: Fn(&str, &[Value], A) -> Result<Vec<Value>, GridError>,
    {
        let mut grid = self.clone();
        for (name, arg) in selection {
            let name = name.as_ref();
            let values = self
                .dimensions
                .get(name)
                .ok_or_else(|| GridError::UnknownDimension(name.to_string()))?;
            let selected = filter(name, values, arg)?;
            grid.dimensions.insert(name.to_string(), selected);
        }
        Ok(grid)
    }
}

impl<'a> IntoIterator for &'a Grid {
    type Item = GridPoint;
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> GridIter<'a> {
        self.iter()
    }
}

/// Iterator over the points of a [`Grid`].
#[derive(Debug, Clone)]
pub struct GridIter<'a> {
    grid: &'a Grid,
    cursor: Vec<usize>,
    remaining: usize,
}

impl Iterator for GridIter<'_> {
    type Item = GridPoint;

    fn next(&mut self) -> Option<GridPoint> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let point = GridPoint(
            self.grid
                .dimensions
                .iter()
                .zip(&self.cursor)
                .map(|((name, values), &i)| (name.clone(), values[i].clone()))
                .collect(),
        );

        // Odometer step, last dimension fastest.
        for (slot, values) in self
            .cursor
            .iter_mut()
            .zip(self.grid.dimensions.values())
            .rev()
        {
            *slot += 1;
            if *slot < values.len() {
                break;
            }
            *slot = 0;
        }

        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GridIter<'_> {}
