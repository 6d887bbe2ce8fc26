//! Unbounded generators of attribute maps and agents.
//!
//! Declarations go into an [`AttributeGeneratorBuilder`]; `compile` freezes
//! them into an [`AttributeGenerator`] with its own seeded stream. There is
//! no way to add declarations to a compiled generator.

use crate::distribution::{AttributeSpec, DistributionRegistry, DistributionSource};
use crate::{AttributeSampler, BuildError, RandomStream};
use indexmap::IndexMap;
use netsim_core::{Agent, Behavior};
use netsim_types::{AgentId, Attributes};
use std::sync::Arc;

/// Collects attribute declarations for an [`AttributeGenerator`].
#[derive(Debug, Clone, Default)]
pub struct AttributeGeneratorBuilder {
    declared: IndexMap<String, AttributeSpec>,
}

impl AttributeGeneratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute. Named distributions are checked against the
    /// built-in registry right away.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        spec: impl Into<AttributeSpec>,
    ) -> Result<&mut Self, BuildError> {
        let spec = spec.into();
        if let AttributeSpec::Distribution(distribution) = &spec {
            if let DistributionSource::Named(dist) = &distribution.source {
                if !DistributionRegistry::builtin().contains(dist) {
                    return Err(BuildError::UnknownDistribution { name: dist.clone() });
                }
            }
        }
        self.declared.insert(name.into(), spec);
        Ok(self)
    }

    /// Freeze the declarations behind a stream seeded with `seed`.
    pub fn compile(&self, seed: u64) -> Result<AttributeGenerator, BuildError> {
        let mut sampler = AttributeSampler::new(Some(RandomStream::from_seed(seed)));
        for (name, spec) in &self.declared {
            sampler.add(name.clone(), spec.clone())?;
        }
        Ok(AttributeGenerator { sampler })
    }
}

/// Endless sequence of attribute maps, one sample per stochastic attribute
/// per item.
#[derive(Debug, Clone)]
pub struct AttributeGenerator {
    sampler: AttributeSampler,
}

impl AttributeGenerator {
    /// Next map, or the sampling error that prevented it.
    pub fn try_next(&mut self) -> Result<Attributes, BuildError> {
        let mut batch = self.sampler.build(1)?;
        Ok(batch.pop().unwrap_or_default())
    }
}

impl Iterator for AttributeGenerator {
    type Item = Result<Attributes, BuildError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.try_next())
    }
}

/// Endless sequence of agents sharing one behaviour, with ids 0, 1, 2, ...
#[derive(Clone)]
pub struct AgentGenerator {
    behavior: Arc<dyn Behavior>,
    next_id: u64,
}

impl AgentGenerator {
    pub fn new(behavior: Arc<dyn Behavior>) -> Self {
        Self {
            behavior,
            next_id: 0,
        }
    }
}

impl Iterator for AgentGenerator {
    type Item = Agent;

    fn next(&mut self) -> Option<Agent> {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        Some(Agent::new(id, self.behavior.clone()))
    }
}
