//! Distribution specifications and their resolution to bound samplers.
//!
//! A [`DistributionSpec`] names a distribution and its parameters. Resolving
//! it against a [`RandomStream`] yields a [`BoundSampler`] producing any
//! number of values from that stream.
//!
//! Resolution order, first match wins:
//!
//! 1. a ready-made [`Sampler`] is bound to the stream as is;
//! 2. a name in the stream-method table (numpy-style names such as
//!    `normal`, `uniform`, `standard_normal`) builds a sampler from the
//!    positional and keyword arguments;
//! 3. a name in the family table (scipy-style names such as `norm`,
//!    `expon`, `bernoulli`) builds a sampler, which is then resolved again
//!    through rule 1.
//!
//! Anything else is [`BuildError::UnknownDistribution`].

use crate::families;
use crate::{BuildError, RandomStream};
use indexmap::IndexMap;
use netsim_core::SimRng;
use netsim_types::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Source of samples with its parameters already fixed.
pub trait Sampler {
    /// Draw exactly `size` values from `rng`.
    fn sample(&self, rng: &mut SimRng, size: usize) -> Vec<Value>;

    /// Human-readable distribution name, used in errors.
    fn name(&self) -> &str;
}

/// Builds a sampler from positional and keyword arguments.
pub type SamplerFactory = fn(&Params<'_>) -> Result<Arc<dyn Sampler>, BuildError>;

/// What a [`DistributionSpec`] refers to.
#[derive(Clone)]
pub enum DistributionSource {
    /// A distribution looked up by name.
    Named(String),

    /// A sampler with its parameters already fixed.
    Sampler(Arc<dyn Sampler>),
}

impl fmt::Debug for DistributionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionSource::Named(name) => f.debug_tuple("Named").field(name).finish(),
            DistributionSource::Sampler(s) => f.debug_tuple("Sampler").field(&s.name()).finish(),
        }
    }
}

/// A distribution identifier with positional and keyword arguments.
#[derive(Debug, Clone)]
pub struct DistributionSpec {
    pub source: DistributionSource,
    pub args: Vec<f64>,
    pub kwargs: IndexMap<String, f64>,
}

impl DistributionSpec {
    /// Spec for a distribution looked up by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            source: DistributionSource::Named(name.into()),
            args: Vec::new(),
            kwargs: IndexMap::new(),
        }
    }

    /// Spec for a ready-made sampler.
    pub fn sampler(sampler: Arc<dyn Sampler>) -> Self {
        Self {
            source: DistributionSource::Sampler(sampler),
            args: Vec::new(),
            kwargs: IndexMap::new(),
        }
    }

    /// Set the positional arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = f64>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Add one keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: f64) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }

    /// Name used in errors and logs.
    pub fn display_name(&self) -> &str {
        match &self.source {
            DistributionSource::Named(name) => name,
            DistributionSource::Sampler(s) => s.name(),
        }
    }
}

/// An attribute declaration: a constant broadcast to every item, or a
/// distribution sampled once per item.
#[derive(Debug, Clone)]
pub enum AttributeSpec {
    Constant(Value),
    Distribution(DistributionSpec),
}

impl AttributeSpec {
    pub fn is_stochastic(&self) -> bool {
        matches!(self, AttributeSpec::Distribution(_))
    }
}

impl From<DistributionSpec> for AttributeSpec {
    fn from(spec: DistributionSpec) -> Self {
        AttributeSpec::Distribution(spec)
    }
}

impl From<Value> for AttributeSpec {
    fn from(value: Value) -> Self {
        AttributeSpec::Constant(value)
    }
}

impl From<bool> for AttributeSpec {
    fn from(value: bool) -> Self {
        AttributeSpec::Constant(value.into())
    }
}

impl From<i64> for AttributeSpec {
    fn from(value: i64) -> Self {
        AttributeSpec::Constant(value.into())
    }
}

impl From<f64> for AttributeSpec {
    fn from(value: f64) -> Self {
        AttributeSpec::Constant(value.into())
    }
}

impl From<&str> for AttributeSpec {
    fn from(value: &str) -> Self {
        AttributeSpec::Constant(value.into())
    }
}

/// A sampler bound to a random stream.
#[derive(Clone)]
pub struct BoundSampler {
    sampler: Arc<dyn Sampler>,
    stream: RandomStream,
}

impl BoundSampler {
    /// Draw `size` values from the bound stream.
    pub fn sample(&self, size: usize) -> Vec<Value> {
        self.stream.with(|rng| self.sampler.sample(rng, size))
    }

    pub fn name(&self) -> &str {
        self.sampler.name()
    }

    pub fn stream(&self) -> &RandomStream {
        &self.stream
    }
}

impl fmt::Debug for BoundSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSampler")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Positional and keyword arguments of a spec, looked up by position or name.
pub struct Params<'a> {
    name: &'a str,
    args: &'a [f64],
    kwargs: &'a IndexMap<String, f64>,
}

impl<'a> Params<'a> {
    pub fn new(name: &'a str, args: &'a [f64], kwargs: &'a IndexMap<String, f64>) -> Self {
        Self { name, args, kwargs }
    }

    /// Argument at `position`, else keyword `key`, else `default`.
    ///
    /// NaN and infinite arguments are rejected.
    pub fn get(&self, position: usize, key: &str, default: Option<f64>) -> Result<f64, BuildError> {
        let value = match self.args.get(position) {
            Some(_) if self.kwargs.contains_key(key) => {
                return Err(self.invalid(format!("{key} given both positionally and by keyword")));
            }
            Some(value) => *value,
            None => self
                .kwargs
                .get(key)
                .copied()
                .or(default)
                .ok_or_else(|| self.invalid(format!("missing required argument {key}")))?,
        };
        if !value.is_finite() {
            return Err(self.invalid(format!("{key} must be finite, got {value}")));
        }
        Ok(value)
    }

    /// Whether the argument was given, positionally or by keyword.
    pub fn has(&self, position: usize, key: &str) -> bool {
        self.args.len() > position || self.kwargs.contains_key(key)
    }

    /// Reject arguments that no parameter consumed.
    pub fn expect_only(&self, keys: &[&str]) -> Result<(), BuildError> {
        if self.args.len() > keys.len() {
            return Err(self.invalid(format!(
                "takes at most {} positional arguments, got {}",
                keys.len(),
                self.args.len()
            )));
        }
        match self.kwargs.keys().find(|k| !keys.contains(&k.as_str())) {
            Some(extra) => Err(self.invalid(format!("unexpected keyword argument {extra}"))),
            None => Ok(()),
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Build an [`BuildError::InvalidDistributionParameters`] for this spec.
    pub fn invalid(&self, reason: impl Into<String>) -> BuildError {
        BuildError::InvalidDistributionParameters {
            name: self.name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Explicit name → sampler-factory tables used for resolution.
pub struct DistributionRegistry {
    stream_methods: IndexMap<&'static str, SamplerFactory>,
    families: IndexMap<&'static str, SamplerFactory>,
}

impl DistributionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            stream_methods: IndexMap::new(),
            families: IndexMap::new(),
        }
    }

    /// The built-in stream methods and families, shared process-wide.
    pub fn builtin() -> &'static DistributionRegistry {
        static BUILTIN: OnceLock<DistributionRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let mut registry = DistributionRegistry::new();
            families::register_stream_methods(&mut registry);
            families::register_families(&mut registry);
            registry
        })
    }

    pub fn register_stream_method(&mut self, name: &'static str, factory: SamplerFactory) {
        self.stream_methods.insert(name, factory);
    }

    pub fn register_family(&mut self, name: &'static str, factory: SamplerFactory) {
        self.families.insert(name, factory);
    }

    /// Whether `name` resolves through either table.
    pub fn contains(&self, name: &str) -> bool {
        self.stream_methods.contains_key(name) || self.families.contains_key(name)
    }

    /// Resolve `spec` to a sampler without binding it to a stream.
    pub fn sampler_for(&self, spec: &DistributionSpec) -> Result<Arc<dyn Sampler>, BuildError> {
        match &spec.source {
            DistributionSource::Sampler(sampler) => {
                if !spec.args.is_empty() || !spec.kwargs.is_empty() {
                    return Err(BuildError::InvalidDistributionParameters {
                        name: sampler.name().to_string(),
                        reason: "a ready-made sampler takes no arguments".into(),
                    });
                }
                Ok(sampler.clone())
            }
            DistributionSource::Named(name) => {
                let params = Params::new(name, &spec.args, &spec.kwargs);
                if let Some(factory) = self.stream_methods.get(name.as_str()) {
                    return factory(&params);
                }
                if let Some(factory) = self.families.get(name.as_str()) {
                    let family = factory(&params)?;
                    return self.sampler_for(&DistributionSpec::sampler(family));
                }
                Err(BuildError::UnknownDistribution { name: name.clone() })
            }
        }
    }

    /// Resolve `spec` and bind the result to `stream`.
    pub fn resolve(
        &self,
        spec: &DistributionSpec,
        stream: &RandomStream,
    ) -> Result<BoundSampler, BuildError> {
        Ok(BoundSampler {
            sampler: self.sampler_for(spec)?,
            stream: stream.clone(),
        })
    }
}

impl Default for DistributionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `spec` against the built-in registry.
pub fn resolve(spec: &DistributionSpec, stream: &RandomStream) -> Result<BoundSampler, BuildError> {
    DistributionRegistry::builtin().resolve(spec, stream)
}
