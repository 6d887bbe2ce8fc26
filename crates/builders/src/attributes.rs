//! Per-item attribute sampling.

use crate::distribution::{resolve, AttributeSpec, BoundSampler};
use crate::{BuildError, RandomStream};
use indexmap::IndexMap;
use netsim_types::{Attributes, Value};

#[derive(Debug, Clone)]
enum Declared {
    Constant(Value),
    Sampled(BoundSampler),
}

/// Named attribute declarations turned into one attribute map per item.
///
/// Distributions are resolved when declared, so an unknown name or a
/// missing stream fails at [`add`](Self::add), not at [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct AttributeSampler {
    stream: Option<RandomStream>,
    declared: IndexMap<String, Declared>,
}

impl AttributeSampler {
    pub fn new(stream: Option<RandomStream>) -> Self {
        Self {
            stream,
            declared: IndexMap::new(),
        }
    }

    /// Declare `name`, replacing any earlier declaration of the same name.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        spec: impl Into<AttributeSpec>,
    ) -> Result<&mut Self, BuildError> {
        let name = name.into();
        let declared = match spec.into() {
            AttributeSpec::Constant(value) => Declared::Constant(value),
            AttributeSpec::Distribution(spec) => {
                let stream = self
                    .stream
                    .as_ref()
                    .ok_or_else(|| BuildError::MissingRandomStream {
                        attribute: name.clone(),
                    })?;
                Declared::Sampled(resolve(&spec, stream)?)
            }
        };
        self.declared.insert(name, declared);
        Ok(self)
    }

    /// Number of declared attributes.
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.declared.keys().map(String::as_str)
    }

    /// Produce `size` attribute maps.
    ///
    /// Each stochastic attribute draws exactly `size` values from the stream
    /// in declaration order; constants are copied into every map.
    pub fn build(&self, size: usize) -> Result<Vec<Attributes>, BuildError> {
        let mut items = vec![Attributes::with_capacity(self.declared.len()); size];

        for (name, declared) in &self.declared {
            match declared {
                Declared::Constant(value) => {
                    for item in &mut items {
                        item.insert(name.clone(), value.clone());
                    }
                }
                Declared::Sampled(sampler) => {
                    let samples = sampler.sample(size);
                    if samples.len() != size {
                        return Err(BuildError::SizeMismatch {
                            attribute: name.clone(),
                            expected: size,
                            actual: samples.len(),
                        });
                    }
                    for (item, sample) in items.iter_mut().zip(samples) {
                        item.insert(name.clone(), sample);
                    }
                }
            }
        }

        Ok(items)
    }
}
