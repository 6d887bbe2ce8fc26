//! Edge list construction over an already-populated node set.

use crate::attributes::AttributeSampler;
use crate::distribution::{resolve, AttributeSpec, BoundSampler};
use crate::{BuildError, RandomStream};
use netsim_core::{Network, Node, SimRng};
use netsim_types::Attributes;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// `(source, destination, attributes)`.
pub type EdgeRecord = (Node, Node, Attributes);

/// Edge predicate: `(source, destination, network, rng) -> keep`.
///
/// The rng is the factory's stream when one was supplied.
pub type EdgeCallback = Arc<dyn Fn(&Node, &Node, &Network, Option<&mut SimRng>) -> bool>;

#[derive(Clone, Default)]
enum EdgeMode {
    /// No edge rule set: the list is empty.
    #[default]
    Unset,
    Distribution {
        sampler: BoundSampler,
        threshold: f64,
    },
    Callback(EdgeCallback),
}

/// Builds edges between every ordered pair of existing nodes, self pairs
/// included, keeping the pairs selected by the active rule.
///
/// Kept pairs are truncated to the edge limit, then given one attribute map
/// each, so attribute samples are drawn for exactly the edges returned.
#[derive(Clone, Default)]
pub struct EdgeListBuilder {
    stream: Option<RandomStream>,
    limit: Option<usize>,
    mode: EdgeMode,
    attributes: AttributeSampler,
}

impl EdgeListBuilder {
    pub fn new(stream: Option<RandomStream>) -> Self {
        Self {
            attributes: AttributeSampler::new(stream.clone()),
            stream,
            limit: None,
            mode: EdgeMode::Unset,
        }
    }

    /// Cap the number of edges returned. Excess candidates are dropped in
    /// pair order, never resampled.
    pub fn set_limit(&mut self, limit: Option<usize>) -> &mut Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        spec: impl Into<AttributeSpec>,
    ) -> Result<&mut Self, BuildError> {
        self.attributes.add(name, spec)?;
        Ok(self)
    }

    /// Keep a pair when its sample is strictly greater than `threshold`.
    ///
    /// Replaces any callback set earlier.
    pub fn from_distribution(
        &mut self,
        spec: impl Into<AttributeSpec>,
        threshold: f64,
    ) -> Result<&mut Self, BuildError> {
        let spec = match spec.into() {
            AttributeSpec::Distribution(spec) => spec,
            AttributeSpec::Constant(_) => return Err(BuildError::InvalidEdgeDistribution),
        };
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| BuildError::MissingRandomStream {
                attribute: "edges".into(),
            })?;
        self.mode = EdgeMode::Distribution {
            sampler: resolve(&spec, stream)?,
            threshold,
        };
        Ok(self)
    }

    /// Keep a pair when `predicate` returns true.
    ///
    /// Replaces any distribution set earlier.
    pub fn from_callback<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&Node, &Node, &Network, Option<&mut SimRng>) -> bool + 'static,
    {
        self.mode = EdgeMode::Callback(Arc::new(predicate));
        self
    }

    pub fn build(&self, network: &Network) -> Result<Vec<EdgeRecord>, BuildError> {
        let nodes: Vec<&Node> = network.nodes().collect();
        let pairs = || {
            nodes
                .iter()
                .flat_map(|&a| nodes.iter().map(move |&b| (a, b)))
        };

        let mut kept: Vec<(Node, Node)> = match &self.mode {
            EdgeMode::Unset => Vec::new(),
            EdgeMode::Distribution { sampler, threshold } => {
                let expected = nodes.len() * nodes.len();
                let samples = sampler.sample(expected);
                if samples.len() != expected {
                    return Err(BuildError::SizeMismatch {
                        attribute: "edges".to_string(),
                        expected,
                        actual: samples.len(),
                    });
                }
                let mut kept = Vec::new();
                for ((a, b), sample) in pairs().zip(samples) {
                    let value = sample.as_f64().ok_or_else(|| BuildError::NonNumericSample {
                        name: sampler.name().to_string(),
                    })?;
                    if value > *threshold {
                        kept.push((a.clone(), b.clone()));
                    }
                }
                kept
            }
            EdgeMode::Callback(predicate) => pairs()
                .filter(|&(a, b)| match &self.stream {
                    Some(stream) => stream.with(|rng| predicate(a, b, network, Some(rng))),
                    None => predicate(a, b, network, None),
                })
                .map(|(a, b)| (a.clone(), b.clone()))
                .collect(),
        };

        let candidates = kept.len();
        if let Some(limit) = self.limit {
            kept.truncate(limit);
        }
        trace!(candidates, kept = kept.len(), "Edge list filtered");

        let attributes = self.attributes.build(kept.len())?;
        Ok(kept
            .into_iter()
            .zip(attributes)
            .map(|((a, b), attrs)| (a, b, attrs))
            .collect())
    }
}

impl fmt::Debug for EdgeListBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match &self.mode {
            EdgeMode::Unset => "unset",
            EdgeMode::Distribution { .. } => "distribution",
            EdgeMode::Callback(_) => "callback",
        };
        f.debug_struct("EdgeListBuilder")
            .field("limit", &self.limit)
            .field("mode", &mode)
            .field("attributes", &self.attributes)
            .finish()
    }
}
