//! The flip model: agents toggle a boolean `state` attribute at random.

use crate::config::{ConfigError, FlipConfig};
use netsim_builders::{DistributionSpec, RandomStream, StructureFactory};
use netsim_core::{Agent, Behavior, Context, Network, NetworkSnapshot, Node, Process, ProcessError, Step};
use netsim_experiment::{CaseError, Experiment, Grid, GridPoint, LoggerFactory, LoggerHandle};
use netsim_simulation::Environment;
use netsim_types::Value;
use std::sync::Arc;
use tracing::trace;

/// Name of the node attribute the agents toggle.
pub const STATE: &str = "state";

/// Once per time unit, flip the agent's own `state` if a standard normal
/// draw exceeds the threshold.
#[derive(Debug, Clone, Copy)]
pub struct Flipper {
    threshold: f64,
}

impl Flipper {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Behavior for Flipper {
    fn run(&self, agent: &Agent) -> Box<dyn Process> {
        let threshold = self.threshold;
        let node = Node::Agent(agent.clone());
        let id = agent.id();
        Box::new(move |ctx: &mut Context<'_>| -> Result<Step, ProcessError> {
            if ctx.draw("normal")? > threshold {
                let missing = || ProcessError::Attribute {
                    agent: id,
                    attribute: STATE.to_string(),
                };
                let attrs = ctx.network_mut().node_attributes_mut(&node).ok_or_else(missing)?;
                let current = attrs.get(STATE).and_then(Value::as_bool).ok_or_else(missing)?;
                attrs.insert(STATE.to_string(), Value::Bool(!current));
                trace!(agent = id.0, state = !current, "Flipped");
            }
            Ok(Step::Timeout(1))
        })
    }

    fn kind(&self) -> &'static str {
        "flipper"
    }
}

/// A sweep over seeds of the flip model on a random graph.
#[derive(Debug, Clone)]
pub struct FlipExperiment {
    config: FlipConfig,
    seeds: Vec<i64>,
}

impl FlipExperiment {
    /// Fails if a seed cannot be carried by the grid.
    pub fn new(config: FlipConfig) -> Result<Self, ConfigError> {
        let seeds = config.grid_seeds()?;
        Ok(Self { config, seeds })
    }

    pub fn config(&self) -> &FlipConfig {
        &self.config
    }
}

/// Seed carried by a grid point.
pub fn seed_of(point: &GridPoint) -> Result<u64, CaseError> {
    point
        .get("seed")
        .and_then(Value::as_i64)
        .and_then(|seed| u64::try_from(seed).ok())
        .ok_or_else(|| CaseError::Config(format!("point {point} has no usable seed")))
}

impl Experiment for FlipExperiment {
    type State = NetworkSnapshot;

    fn grid(&self) -> Grid {
        let mut grid = Grid::new();
        grid.add_dimension(
            "seed",
            self.seeds.iter().copied(),
            Some("seed of the structure and environment random streams"),
        );
        grid
    }

    fn build_structure(&self, point: &GridPoint) -> Result<Network, CaseError> {
        let stream = RandomStream::from_seed(seed_of(point)?);
        let mut factory = StructureFactory::graph(Some(stream));
        factory
            .set_size(self.config.nodes)
            .set_agent(Arc::new(Flipper::new(self.config.flip_threshold)))
            .set_node_attribute(STATE, false)?
            .set_edge_by_distribution(DistributionSpec::named("uniform"), self.config.edge_threshold)?;
        Ok(factory.build()?)
    }

    fn build_environment(&self, network: Network, point: &GridPoint) -> Result<Environment, CaseError> {
        Ok(Environment::new(network, 0, Some(seed_of(point)?)))
    }

    fn attach_logger(
        &self,
        env: &mut Environment,
        point: &GridPoint,
    ) -> Result<LoggerHandle<NetworkSnapshot>, CaseError> {
        let logger = LoggerFactory::new(&self.config.results_dir)
            .with_name("flip")
            .with_point(point)
            .with_interval(self.config.interval)
            .with_capacity(self.config.capacity)
            .with_replace_previous(self.config.replace_previous)
            .build()?;
        Ok(logger.register(env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiment(nodes: usize) -> FlipExperiment {
        FlipExperiment::new(FlipConfig::new(nodes, [3, 4]).with_results_dir("unused")).unwrap()
    }

    #[test]
    fn test_grid_has_one_point_per_seed() {
        let grid = experiment(5).grid();
        let seeds: Vec<u64> = grid.iter().map(|p| seed_of(&p).unwrap()).collect();
        assert_eq!(seeds, vec![3, 4]);
    }

    #[test]
    fn test_structure_starts_all_off() {
        let exp = experiment(20);
        let point = exp.grid().iter().next().unwrap();
        let network = exp.build_structure(&point).unwrap();
        let snapshot = network.snapshot();
        assert_eq!(snapshot.node_count(), 20);
        assert_eq!(snapshot.count_true(STATE), 0);
        assert!(network.nodes().all(|n| n.as_agent().is_some_and(|a| a.kind() == "flipper")));
        // 190 unordered pairs at a 0.9 threshold: far fewer than all of them.
        assert!(snapshot.edge_count() < 190);
    }

    #[test]
    fn test_agents_flip_their_own_state() {
        let exp = experiment(30);
        let point = exp.grid().iter().next().unwrap();
        let network = exp.build_structure(&point).unwrap();
        let mut env = exp.build_environment(network, &point).unwrap();
        env.run_until(5).unwrap();
        let on = env.network().snapshot().count_true(STATE);
        // P(N(0,1) > 0.5) is about 0.31 per step, so some but not all flip.
        assert!(on > 0 && on < 30, "{on} agents on");
    }

    #[test]
    fn test_missing_state_fails_the_process() {
        let mut network = Network::new(netsim_core::NetworkKind::Graph);
        let agent = Agent::new(0usize, Arc::new(Flipper::new(f64::NEG_INFINITY)));
        network.add_node(Node::Agent(agent), None);
        let mut env = Environment::new(network, 0, Some(1));
        assert!(env.run_until(3).is_err());
    }

    #[test]
    fn test_largest_seeds_survive_the_grid() {
        let exp = FlipExperiment::new(FlipConfig::new(2, [0, i64::MAX as u64])).unwrap();
        let seeds: Vec<u64> = exp.grid().iter().map(|p| seed_of(&p).unwrap()).collect();
        assert_eq!(seeds, vec![0, i64::MAX as u64]);

        assert!(matches!(
            FlipExperiment::new(FlipConfig::new(2, [u64::MAX])),
            Err(ConfigError::SeedOutOfRange(u64::MAX))
        ));
    }

    #[test]
    fn test_bad_seed_is_config_error() {
        let point: GridPoint = [("seed", -1i64)].into_iter().collect();
        assert!(matches!(seed_of(&point), Err(CaseError::Config(_))));
    }
}
