//! Structure factory: nodes, then edges, into a fresh network.

use crate::distribution::AttributeSpec;
use crate::edges::EdgeListBuilder;
use crate::nodes::NodeListBuilder;
use crate::{BuildError, RandomStream};
use netsim_core::{Behavior, Network, NetworkKind, Node, SimRng};
use std::sync::Arc;
use tracing::debug;

/// Builds networks of one [`NetworkKind`] from node and edge declarations.
///
/// All stochastic declarations draw from the one stream given at
/// construction, in declaration order: node attributes, then the edge rule,
/// then edge attributes. The factory stays configurable after a build, and
/// each build continues the stream where the previous one left it.
#[derive(Debug, Clone)]
pub struct StructureFactory {
    kind: NetworkKind,
    nodes: NodeListBuilder,
    edges: EdgeListBuilder,
}

impl StructureFactory {
    pub fn new(kind: NetworkKind, stream: Option<RandomStream>) -> Self {
        Self {
            kind,
            nodes: NodeListBuilder::new(stream.clone()),
            edges: EdgeListBuilder::new(stream),
        }
    }

    /// Undirected simple graph.
    pub fn graph(stream: Option<RandomStream>) -> Self {
        Self::new(NetworkKind::Graph, stream)
    }

    /// Directed simple graph.
    pub fn digraph(stream: Option<RandomStream>) -> Self {
        Self::new(NetworkKind::DiGraph, stream)
    }

    pub fn multigraph(stream: Option<RandomStream>) -> Self {
        Self::new(NetworkKind::MultiGraph, stream)
    }

    pub fn multidigraph(stream: Option<RandomStream>) -> Self {
        Self::new(NetworkKind::MultiDiGraph, stream)
    }

    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    pub fn set_size(&mut self, size: usize) -> &mut Self {
        self.nodes.set_size(size);
        self
    }

    pub fn set_edge_limit(&mut self, limit: usize) -> &mut Self {
        self.edges.set_limit(Some(limit));
        self
    }

    /// Populate nodes with agents running `behavior`.
    pub fn set_agent(&mut self, behavior: Arc<dyn Behavior>) -> &mut Self {
        self.nodes.set_agent(behavior);
        self
    }

    pub fn set_node_attribute(
        &mut self,
        name: impl Into<String>,
        spec: impl Into<AttributeSpec>,
    ) -> Result<&mut Self, BuildError> {
        self.nodes.add(name, spec)?;
        Ok(self)
    }

    pub fn set_edge_attribute(
        &mut self,
        name: impl Into<String>,
        spec: impl Into<AttributeSpec>,
    ) -> Result<&mut Self, BuildError> {
        self.edges.add(name, spec)?;
        Ok(self)
    }

    /// Add an edge for every ordered pair whose sample exceeds `threshold`.
    pub fn set_edge_by_distribution(
        &mut self,
        spec: impl Into<AttributeSpec>,
        threshold: f64,
    ) -> Result<&mut Self, BuildError> {
        self.edges.from_distribution(spec, threshold)?;
        Ok(self)
    }

    /// Add an edge for every ordered pair accepted by `predicate`.
    pub fn set_edge_by_callback<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&Node, &Node, &Network, Option<&mut SimRng>) -> bool + 'static,
    {
        self.edges.from_callback(predicate);
        self
    }

    /// Build a new network.
    pub fn build(&self) -> Result<Network, BuildError> {
        let mut network = Network::new(self.kind);

        for record in self.nodes.build()? {
            let (node, attributes) = record.into_parts();
            network.add_node(node, attributes);
        }

        for (source, destination, attributes) in self.edges.build(&network)? {
            network.add_edge(&source, &destination, Some(attributes))?;
        }

        debug!(
            kind = ?self.kind,
            nodes = network.node_count(),
            edges = network.edge_count(),
            "Network built"
        );
        Ok(network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionSpec;
    use netsim_core::{Agent, Context, Process, ProcessError, Step};
    use netsim_types::Value;
    use tracing_test::traced_test;

    struct Idle;

    impl Behavior for Idle {
        fn run(&self, _agent: &Agent) -> Box<dyn Process> {
            Box::new(|_ctx: &mut Context<'_>| -> Result<Step, ProcessError> { Ok(Step::Finished) })
        }
    }

    /// Abramowitz and Stegun 7.1.26, absolute error below 1.5e-7.
    fn erf(x: f64) -> f64 {
        let sign = if x < 0.0 { -1.0 } else { 1.0 };
        let x = x.abs();
        let t = 1.0 / (1.0 + 0.327_591_1 * x);
        let poly = t
            * (0.254_829_592
                + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
        sign * (1.0 - poly * (-x * x).exp())
    }

    fn normal_cdf(x: f64, loc: f64, scale: f64) -> f64 {
        0.5 * (1.0 + erf((x - loc) / (scale * std::f64::consts::SQRT_2)))
    }

    fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
        let n = xs.len() as f64;
        let (mx, my) = (xs.iter().sum::<f64>() / n, ys.iter().sum::<f64>() / n);
        let cov: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
        let vx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
        let vy: f64 = ys.iter().map(|y| (y - my).powi(2)).sum();
        cov / (vx.sqrt() * vy.sqrt())
    }

    #[traced_test]
    #[test]
    fn test_node_attribute_follows_declared_distribution() {
        let mut factory = StructureFactory::graph(Some(RandomStream::from_seed(0)));
        factory
            .set_size(10_000)
            .set_node_attribute("x", DistributionSpec::named("norm").kwarg("loc", 3.0).kwarg("scale", 1.3))
            .unwrap();
        let network = factory.build().unwrap();

        let mut xs: Vec<f64> = network
            .nodes_with_attributes()
            .filter_map(|(_, attrs)| attrs.get("x").and_then(Value::as_f64))
            .collect();
        assert_eq!(xs.len(), 10_000);
        xs.sort_by(f64::total_cmp);

        let ecdf: Vec<f64> = (1..=xs.len()).map(|i| i as f64 / xs.len() as f64).collect();
        let cdf: Vec<f64> = xs.iter().map(|&x| normal_cdf(x, 3.0, 1.3)).collect();
        assert!(pearson(&ecdf, &cdf) >= 0.99);
    }

    #[test]
    fn test_same_seed_same_network() {
        let build = |seed| {
            let mut factory = StructureFactory::digraph(Some(RandomStream::from_seed(seed)));
            factory
                .set_size(12)
                .set_node_attribute("score", DistributionSpec::named("standard_normal"))
                .unwrap()
                .set_edge_by_distribution(DistributionSpec::named("uniform"), 0.8)
                .unwrap()
                .set_edge_attribute("weight", DistributionSpec::named("gamma").args([2.0]))
                .unwrap();
            factory.build().unwrap().snapshot()
        };
        assert_eq!(build(5), build(5));
        assert_ne!(build(5), build(6));
    }

    #[test]
    fn test_agents_populate_nodes() {
        let mut factory = StructureFactory::graph(None);
        factory.set_size(3).set_agent(Arc::new(Idle)).set_node_attribute("alive", true).unwrap();
        let network = factory.build().unwrap();
        assert_eq!(network.node_count(), 3);
        for (node, attrs) in network.nodes_with_attributes() {
            assert!(node.as_agent().is_some());
            assert_eq!(attrs.get("alive"), Some(&Value::Bool(true)));
        }
    }

    #[test]
    fn test_undirected_simple_graph_deduplicates() {
        let mut factory = StructureFactory::graph(None);
        factory.set_size(4).set_edge_by_callback(|a, b, _, _| a != b);
        let network = factory.build().unwrap();
        // 12 ordered pairs collapse to 6 undirected edges.
        assert_eq!(network.edge_count(), 6);

        let mut factory = StructureFactory::digraph(None);
        factory.set_size(4).set_edge_by_callback(|a, b, _, _| a != b);
        assert_eq!(factory.build().unwrap().edge_count(), 12);

        let mut factory = StructureFactory::multigraph(None);
        factory.set_size(4).set_edge_by_callback(|a, b, _, _| a != b);
        assert_eq!(factory.build().unwrap().edge_count(), 12);
    }

    #[test]
    fn test_edge_limit_applies() {
        let mut factory = StructureFactory::multidigraph(None);
        factory
            .set_size(5)
            .set_edge_limit(7)
            .set_edge_by_callback(|_, _, _, _| true);
        assert_eq!(factory.build().unwrap().edge_count(), 7);
    }

    #[test]
    fn test_callback_sees_populated_nodes() {
        let mut factory = StructureFactory::digraph(None);
        factory
            .set_size(3)
            .set_node_attribute("alive", true)
            .unwrap()
            .set_edge_by_callback(|a, _, network, _| {
                network.node_count() == 3
                    && network.node_attributes(a).and_then(|attrs| attrs.get("alive")).is_some()
            });
        assert_eq!(factory.build().unwrap().edge_count(), 9);
    }

    #[test]
    fn test_declaration_errors_surface_from_setters() {
        let mut factory = StructureFactory::graph(None);
        assert!(matches!(
            factory.set_node_attribute("x", DistributionSpec::named("normal")),
            Err(BuildError::MissingRandomStream { .. })
        ));

        let mut factory = StructureFactory::graph(Some(RandomStream::from_seed(1)));
        assert!(matches!(
            factory.set_edge_by_distribution(1.0, 0.5),
            Err(BuildError::InvalidEdgeDistribution)
        ));
        assert!(matches!(
            factory.set_edge_attribute("w", DistributionSpec::named("nonexistent")),
            Err(BuildError::UnknownDistribution { .. })
        ));
    }

    #[test]
    fn test_empty_factory_builds_empty_network() {
        let network = StructureFactory::multigraph(None).build().unwrap();
        assert_eq!(network.node_count(), 0);
        assert_eq!(network.edge_count(), 0);
        assert_eq!(network.kind(), NetworkKind::MultiGraph);
    }
}
