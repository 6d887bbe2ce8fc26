//! Built-in samplers: numpy-style stream methods and scipy-style families.
//!
//! Stream methods take their parameters the way a random stream's own
//! methods do (`normal(loc, scale)`, `gamma(shape, scale)`). Families take
//! shape parameters first, then the `loc` and `scale` every family accepts
//! (`gamma(a, loc, scale)`); a sample is `loc + scale * x` where `x` comes
//! from the standard form.

use crate::distribution::{DistributionRegistry, Params, Sampler};
use crate::BuildError;
use netsim_core::SimRng;
use netsim_types::Value;
use rand::distributions::{Bernoulli, Standard, Uniform};
use rand_distr::{Beta, Binomial, Distribution, Exp1, Gamma, LogNormal, Poisson, StandardNormal, Weibull};
use std::marker::PhantomData;
use std::sync::Arc;

/// Continuous distribution with a location/scale transform.
struct Continuous<D> {
    name: &'static str,
    dist: D,
    loc: f64,
    scale: f64,
}

impl<D: Distribution<f64>> Sampler for Continuous<D> {
    fn sample(&self, rng: &mut SimRng, size: usize) -> Vec<Value> {
        (0..size)
            .map(|_| Value::Float(self.loc + self.scale * self.dist.sample(rng)))
            .collect()
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Integer-valued sample types.
trait Count {
    fn count(self) -> i64;
}

impl Count for u64 {
    fn count(self) -> i64 {
        self as i64
    }
}

impl Count for i64 {
    fn count(self) -> i64 {
        self
    }
}

impl Count for f64 {
    fn count(self) -> i64 {
        self as i64
    }
}

impl Count for bool {
    fn count(self) -> i64 {
        self as i64
    }
}

/// Discrete distribution shifted by an integer location.
struct Discrete<D, T> {
    name: &'static str,
    dist: D,
    loc: i64,
    _sample: PhantomData<fn() -> T>,
}

impl<D, T> Discrete<D, T> {
    fn new(name: &'static str, dist: D, loc: i64) -> Self {
        Self {
            name,
            dist,
            loc,
            _sample: PhantomData,
        }
    }
}

impl<D, T> Sampler for Discrete<D, T>
where
    D: Distribution<T>,
    T: Count,
{
    fn sample(&self, rng: &mut SimRng, size: usize) -> Vec<Value> {
        (0..size)
            .map(|_| Value::Int(self.loc + self.dist.sample(rng).count()))
            .collect()
    }

    fn name(&self) -> &str {
        self.name
    }
}

type SamplerResult = Result<Arc<dyn Sampler>, BuildError>;

fn continuous<D: Distribution<f64> + 'static>(
    name: &'static str,
    dist: D,
    loc: f64,
    scale: f64,
) -> SamplerResult {
    Ok(Arc::new(Continuous {
        name,
        dist,
        loc,
        scale,
    }))
}

fn discrete<D, T>(name: &'static str, dist: D, loc: i64) -> SamplerResult
where
    D: Distribution<T> + 'static,
    T: Count + 'static,
{
    Ok(Arc::new(Discrete::new(name, dist, loc)))
}

fn require_positive(params: &Params<'_>, key: &str, value: f64) -> Result<f64, BuildError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(params.invalid(format!("{key} must be positive and finite, got {value}")))
    }
}

fn require_non_negative(params: &Params<'_>, key: &str, value: f64) -> Result<f64, BuildError> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(params.invalid(format!("{key} must be non-negative and finite, got {value}")))
    }
}

fn require_probability(params: &Params<'_>, value: f64) -> Result<f64, BuildError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(params.invalid(format!("p must lie in [0, 1], got {value}")))
    }
}

fn uniform_ints(params: &Params<'_>, low: f64, high: f64) -> Result<Uniform<i64>, BuildError> {
    let (low, high) = (low as i64, high as i64);
    if low >= high {
        return Err(params.invalid(format!("low ({low}) must be below high ({high})")));
    }
    Ok(Uniform::new(low, high))
}

// ═══════════════════════════════════════════════════════════════════════
// Stream methods
// ═══════════════════════════════════════════════════════════════════════

fn random(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&[])?;
    continuous("random", Standard, 0.0, 1.0)
}

fn standard_normal(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&[])?;
    continuous("standard_normal", StandardNormal, 0.0, 1.0)
}

fn standard_exponential(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&[])?;
    continuous("standard_exponential", Exp1, 0.0, 1.0)
}

fn normal(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["loc", "scale"])?;
    let loc = params.get(0, "loc", Some(0.0))?;
    let scale = require_non_negative(params, "scale", params.get(1, "scale", Some(1.0))?)?;
    continuous("normal", StandardNormal, loc, scale)
}

fn uniform(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["low", "high"])?;
    let low = params.get(0, "low", Some(0.0))?;
    let high = params.get(1, "high", Some(1.0))?;
    if low >= high || !(high - low).is_finite() {
        return Err(params.invalid(format!("low ({low}) must be below high ({high})")));
    }
    continuous("uniform", Standard, low, high - low)
}

fn exponential(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["scale"])?;
    let scale = require_positive(params, "scale", params.get(0, "scale", Some(1.0))?)?;
    continuous("exponential", Exp1, 0.0, scale)
}

fn gamma(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["shape", "scale"])?;
    let shape = require_positive(params, "shape", params.get(0, "shape", None)?)?;
    let scale = require_positive(params, "scale", params.get(1, "scale", Some(1.0))?)?;
    let dist = Gamma::new(shape, scale).map_err(|e| params.invalid(e.to_string()))?;
    continuous("gamma", dist, 0.0, 1.0)
}

fn beta(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["a", "b"])?;
    let a = require_positive(params, "a", params.get(0, "a", None)?)?;
    let b = require_positive(params, "b", params.get(1, "b", None)?)?;
    let dist = Beta::new(a, b).map_err(|e| params.invalid(e.to_string()))?;
    continuous("beta", dist, 0.0, 1.0)
}

fn binomial(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["n", "p"])?;
    let n = require_non_negative(params, "n", params.get(0, "n", None)?)?;
    let p = require_probability(params, params.get(1, "p", None)?)?;
    let dist = Binomial::new(n as u64, p).map_err(|e| params.invalid(e.to_string()))?;
    discrete::<_, u64>("binomial", dist, 0)
}

fn poisson(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["lam"])?;
    let lam = require_positive(params, "lam", params.get(0, "lam", Some(1.0))?)?;
    let dist = Poisson::new(lam).map_err(|e| params.invalid(e.to_string()))?;
    discrete::<_, f64>("poisson", dist, 0)
}

fn lognormal(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["mean", "sigma"])?;
    let mean = params.get(0, "mean", Some(0.0))?;
    let sigma = require_non_negative(params, "sigma", params.get(1, "sigma", Some(1.0))?)?;
    let dist = LogNormal::new(mean, sigma).map_err(|e| params.invalid(e.to_string()))?;
    continuous("lognormal", dist, 0.0, 1.0)
}

fn rayleigh(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["scale"])?;
    let scale = require_positive(params, "scale", params.get(0, "scale", Some(1.0))?)?;
    continuous("rayleigh", standard_rayleigh(params)?, 0.0, scale)
}

fn randint(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["low", "high"])?;
    let first = params.get(0, "low", None)?;
    // A single bound means [0, bound), as a stream's randint does.
    let (low, high) = if params.has(1, "high") {
        (first, params.get(1, "high", None)?)
    } else {
        (0.0, first)
    };
    discrete::<_, i64>("randint", uniform_ints(params, low, high)?, 0)
}

/// Rayleigh with sigma 1 is Weibull with shape 2 and scale sqrt(2).
fn standard_rayleigh(params: &Params<'_>) -> Result<Weibull<f64>, BuildError> {
    Weibull::new(std::f64::consts::SQRT_2, 2.0).map_err(|e| params.invalid(e.to_string()))
}

pub(crate) fn register_stream_methods(registry: &mut DistributionRegistry) {
    registry.register_stream_method("random", random);
    registry.register_stream_method("random_sample", random);
    registry.register_stream_method("rand", random);
    registry.register_stream_method("standard_normal", standard_normal);
    registry.register_stream_method("standard_exponential", standard_exponential);
    registry.register_stream_method("normal", normal);
    registry.register_stream_method("uniform", uniform);
    registry.register_stream_method("exponential", exponential);
    registry.register_stream_method("gamma", gamma);
    registry.register_stream_method("beta", beta);
    registry.register_stream_method("binomial", binomial);
    registry.register_stream_method("poisson", poisson);
    registry.register_stream_method("lognormal", lognormal);
    registry.register_stream_method("rayleigh", rayleigh);
    registry.register_stream_method("randint", randint);
}

// ═══════════════════════════════════════════════════════════════════════
// Families
// ═══════════════════════════════════════════════════════════════════════

/// `loc` and `scale` following `shapes` shape parameters.
fn loc_scale(params: &Params<'_>, shapes: usize) -> Result<(f64, f64), BuildError> {
    let loc = params.get(shapes, "loc", Some(0.0))?;
    let scale = require_positive(params, "scale", params.get(shapes + 1, "scale", Some(1.0))?)?;
    Ok((loc, scale))
}

/// Integer `loc` following `shapes` shape parameters.
fn int_loc(params: &Params<'_>, shapes: usize) -> Result<i64, BuildError> {
    Ok(params.get(shapes, "loc", Some(0.0))? as i64)
}

fn norm(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["loc", "scale"])?;
    let (loc, scale) = loc_scale(params, 0)?;
    continuous("norm", StandardNormal, loc, scale)
}

fn uniform_family(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["loc", "scale"])?;
    let (loc, scale) = loc_scale(params, 0)?;
    continuous("uniform", Standard, loc, scale)
}

fn expon(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["loc", "scale"])?;
    let (loc, scale) = loc_scale(params, 0)?;
    continuous("expon", Exp1, loc, scale)
}

fn gamma_family(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["a", "loc", "scale"])?;
    let a = require_positive(params, "a", params.get(0, "a", None)?)?;
    let (loc, scale) = loc_scale(params, 1)?;
    let dist = Gamma::new(a, 1.0).map_err(|e| params.invalid(e.to_string()))?;
    continuous("gamma", dist, loc, scale)
}

fn beta_family(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["a", "b", "loc", "scale"])?;
    let a = require_positive(params, "a", params.get(0, "a", None)?)?;
    let b = require_positive(params, "b", params.get(1, "b", None)?)?;
    let (loc, scale) = loc_scale(params, 2)?;
    let dist = Beta::new(a, b).map_err(|e| params.invalid(e.to_string()))?;
    continuous("beta", dist, loc, scale)
}

fn lognorm(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["s", "loc", "scale"])?;
    let s = require_positive(params, "s", params.get(0, "s", None)?)?;
    let (loc, scale) = loc_scale(params, 1)?;
    let dist = LogNormal::new(0.0, s).map_err(|e| params.invalid(e.to_string()))?;
    continuous("lognorm", dist, loc, scale)
}

fn rayleigh_family(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["loc", "scale"])?;
    let (loc, scale) = loc_scale(params, 0)?;
    continuous("rayleigh", standard_rayleigh(params)?, loc, scale)
}

fn bernoulli(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["p", "loc"])?;
    let p = require_probability(params, params.get(0, "p", Some(0.5))?)?;
    let loc = int_loc(params, 1)?;
    let dist = Bernoulli::new(p).map_err(|e| params.invalid(e.to_string()))?;
    discrete::<_, bool>("bernoulli", dist, loc)
}

fn binom(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["n", "p", "loc"])?;
    let n = require_non_negative(params, "n", params.get(0, "n", None)?)?;
    let p = require_probability(params, params.get(1, "p", None)?)?;
    let loc = int_loc(params, 2)?;
    let dist = Binomial::new(n as u64, p).map_err(|e| params.invalid(e.to_string()))?;
    discrete::<_, u64>("binom", dist, loc)
}

fn poisson_family(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["mu", "loc"])?;
    let mu = require_positive(params, "mu", params.get(0, "mu", None)?)?;
    let loc = int_loc(params, 1)?;
    let dist = Poisson::new(mu).map_err(|e| params.invalid(e.to_string()))?;
    discrete::<_, f64>("poisson", dist, loc)
}

fn randint_family(params: &Params<'_>) -> SamplerResult {
    params.expect_only(&["low", "high", "loc"])?;
    let low = params.get(0, "low", None)?;
    let high = params.get(1, "high", None)?;
    let loc = int_loc(params, 2)?;
    discrete::<_, i64>("randint", uniform_ints(params, low, high)?, loc)
}

pub(crate) fn register_families(registry: &mut DistributionRegistry) {
    registry.register_family("norm", norm);
    registry.register_family("uniform", uniform_family);
    registry.register_family("expon", expon);
    registry.register_family("gamma", gamma_family);
    registry.register_family("beta", beta_family);
    registry.register_family("lognorm", lognorm);
    registry.register_family("rayleigh", rayleigh_family);
    registry.register_family("bernoulli", bernoulli);
    registry.register_family("binom", binom);
    registry.register_family("poisson", poisson_family);
    registry.register_family("randint", randint_family);
}

#[cfg(test)]
mod tests {
    use crate::distribution::{resolve, DistributionSpec};
    use crate::{BuildError, RandomStream};
    use netsim_types::Value;

    fn floats(spec: DistributionSpec, size: usize) -> Vec<f64> {
        let stream = RandomStream::from_seed(2024);
        resolve(&spec, &stream)
            .unwrap()
            .sample(size)
            .iter()
            .map(|v| v.as_f64().unwrap())
            .collect()
    }

    fn mean(xs: &[f64]) -> f64 {
        xs.iter().sum::<f64>() / xs.len() as f64
    }

    fn variance(xs: &[f64]) -> f64 {
        let m = mean(xs);
        xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / xs.len() as f64
    }

    #[test]
    fn test_normal_moments() {
        let xs = floats(DistributionSpec::named("normal").args([2.0, 3.0]), 20_000);
        assert!((mean(&xs) - 2.0).abs() < 0.1);
        assert!((variance(&xs).sqrt() - 3.0).abs() < 0.1);
    }

    #[test]
    fn test_norm_family_loc_scale_kwargs() {
        let spec = DistributionSpec::named("norm")
            .kwarg("loc", 3.0)
            .kwarg("scale", 1.3);
        let xs = floats(spec, 20_000);
        assert!((mean(&xs) - 3.0).abs() < 0.05);
        assert!((variance(&xs).sqrt() - 1.3).abs() < 0.05);
    }

    #[test]
    fn test_uniform_bounds() {
        let xs = floats(DistributionSpec::named("uniform").args([-1.0, 1.0]), 5_000);
        assert!(xs.iter().all(|x| (-1.0..1.0).contains(x)));
        assert!(mean(&xs).abs() < 0.05);
    }

    #[test]
    fn test_gamma_mean() {
        let xs = floats(DistributionSpec::named("gamma").args([1.99]), 20_000);
        assert!(xs.iter().all(|x| *x > 0.0));
        assert!((mean(&xs) - 1.99).abs() < 0.1);
    }

    #[test]
    fn test_rayleigh_family_is_shifted() {
        let spec = DistributionSpec::named("rayleigh").kwarg("scale", 1.3);
        let xs = floats(spec, 20_000);
        // Mean of Rayleigh(sigma) is sigma * sqrt(pi / 2).
        let expected = 1.3 * (std::f64::consts::PI / 2.0).sqrt();
        assert!(xs.iter().all(|x| *x >= 0.0));
        assert!((mean(&xs) - expected).abs() < 0.05);
    }

    #[test]
    fn test_bernoulli_is_integer_valued() {
        let stream = RandomStream::from_seed(1);
        let samples = resolve(&DistributionSpec::named("bernoulli").args([0.2]), &stream)
            .unwrap()
            .sample(10_000);
        assert!(samples.iter().all(|v| matches!(v, Value::Int(0) | Value::Int(1))));
        let ones = samples.iter().filter(|v| **v == Value::Int(1)).count();
        assert!((ones as f64 / 10_000.0 - 0.2).abs() < 0.02);
    }

    #[test]
    fn test_randint_single_bound() {
        let stream = RandomStream::from_seed(1);
        let samples = resolve(&DistributionSpec::named("randint").args([4.0]), &stream)
            .unwrap()
            .sample(1_000);
        assert!(samples
            .iter()
            .all(|v| matches!(v.as_i64(), Some(x) if (0..4).contains(&x))));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let stream = RandomStream::from_seed(1);
        for spec in [
            DistributionSpec::named("normal").args([0.0, -1.0]),
            DistributionSpec::named("uniform").args([1.0, 1.0]),
            DistributionSpec::named("gamma"),
            DistributionSpec::named("bernoulli").args([1.5]),
            DistributionSpec::named("norm").kwarg("shape", 2.0),
            DistributionSpec::named("expon").args([0.0, 1.0, 2.0]),
        ] {
            assert!(
                matches!(
                    resolve(&spec, &stream),
                    Err(BuildError::InvalidDistributionParameters { .. })
                ),
                "{spec:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_finite_parameters_rejected() {
        let stream = RandomStream::from_seed(1);
        for spec in [
            DistributionSpec::named("uniform").args([0.0, f64::INFINITY]),
            DistributionSpec::named("uniform").args([-f64::MAX, f64::MAX]),
            DistributionSpec::named("normal").args([f64::NEG_INFINITY]),
            DistributionSpec::named("norm").kwarg("loc", f64::NAN),
            DistributionSpec::named("expon").kwarg("loc", f64::INFINITY),
            DistributionSpec::named("gamma").args([2.0, f64::INFINITY]),
            DistributionSpec::named("randint").args([0.0, f64::INFINITY]),
        ] {
            assert!(
                matches!(
                    resolve(&spec, &stream),
                    Err(BuildError::InvalidDistributionParameters { .. })
                ),
                "{spec:?} should be rejected"
            );
        }
    }
}
