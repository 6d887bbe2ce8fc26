//! Stochastic network construction.
//!
//! A [`StructureFactory`] turns node and edge declarations into a populated
//! [`netsim_core::Network`]:
//!
//! ```text
//! declarations ──► NodeListBuilder ──► add nodes ──► EdgeListBuilder ──► add edges
//!                        │                                 │
//!                        └──── AttributeSampler ◄──────────┘
//!                                     │
//!                              resolve(spec, stream)
//!                                     │
//!                     stream methods ─┴─ families ─ ready-made samplers
//! ```
//!
//! Every stochastic declaration is resolved against one [`RandomStream`]
//! when it is made, so configuration errors surface from the setters and
//! `build()` only fails on sampling or network errors.

mod attributes;
mod distribution;
mod edges;
mod error;
mod factory;
mod families;
mod generators;
mod nodes;
mod stream;

pub use attributes::AttributeSampler;
pub use distribution::{
    resolve, AttributeSpec, BoundSampler, DistributionRegistry, DistributionSource,
    DistributionSpec, Params, Sampler, SamplerFactory,
};
pub use edges::{EdgeCallback, EdgeListBuilder, EdgeRecord};
pub use error::BuildError;
pub use factory::StructureFactory;
pub use generators::{AgentGenerator, AttributeGenerator, AttributeGeneratorBuilder};
pub use nodes::{NodeListBuilder, NodeRecord};
pub use stream::RandomStream;
