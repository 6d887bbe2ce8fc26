//! The simulation environment: clock, event queue and process table.

use crate::{EventKey, SimulationError};
use netsim_core::{draw, Context, Network, Process, ProcessError, SimRng, Step};
use netsim_types::{ProcessId, SimTime};
use rand::SeedableRng;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

/// Counters collected while running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    /// Number of process resumptions.
    pub events_processed: u64,

    /// Number of processes that returned [`Step::Finished`].
    pub processes_finished: u64,
}

/// Discrete-event environment bound to one network.
///
/// On construction every agent node's behaviour is scheduled as a process
/// at the initial time, in node order. Processes scheduled later (for
/// example a logger) run after them at equal times.
pub struct Environment {
    now: SimTime,
    network: Network,
    rng: SimRng,
    queue: BTreeSet<EventKey>,
    processes: HashMap<ProcessId, Box<dyn Process>>,
    next_process: u64,
    next_sequence: u64,
    stats: SimulationStats,
}

impl Environment {
    /// Create an environment around `network`.
    ///
    /// Without a seed the random stream is seeded from OS entropy and runs
    /// are not reproducible.
    pub fn new(network: Network, initial_time: SimTime, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SimRng::seed_from_u64(seed),
            None => SimRng::from_entropy(),
        };

        let mut env = Self {
            now: initial_time,
            network,
            rng,
            queue: BTreeSet::new(),
            processes: HashMap::new(),
            next_process: 0,
            next_sequence: 0,
            stats: SimulationStats::default(),
        };

        let agents: Vec<_> = env
            .network
            .nodes()
            .filter_map(|node| node.as_agent().cloned())
            .collect();
        for agent in &agents {
            env.process(agent.run());
        }
        debug!(agents = agents.len(), initial_time, "Environment created");

        env
    }

    /// Schedule a process to start at the current time.
    pub fn process(&mut self, process: Box<dyn Process>) -> ProcessId {
        let id = ProcessId(self.next_process);
        self.next_process += 1;
        self.processes.insert(id, process);
        self.schedule(id, self.now);
        id
    }

    /// Advance until simulated time reaches `horizon`.
    ///
    /// Events scheduled strictly before the horizon are processed; the clock
    /// then stands at the horizon. A process error stops the run at the time
    /// it occurred.
    pub fn run_until(&mut self, horizon: SimTime) -> Result<SimulationStats, SimulationError> {
        if horizon < self.now {
            return Err(SimulationError::HorizonInPast {
                horizon,
                now: self.now,
            });
        }

        while let Some(&key) = self.queue.first() {
            if key.time >= horizon {
                break;
            }
            self.queue.pop_first();
            self.now = key.time;

            let Some(mut process) = self.processes.remove(&key.process) else {
                continue;
            };

            let step = {
                let mut ctx = Context::new(self.now, &mut self.network, &mut self.rng);
                process.resume(&mut ctx)
            };
            self.stats.events_processed += 1;

            match step {
                Ok(Step::Timeout(delay)) => {
                    let Some(wake) = self.now.checked_add(delay) else {
                        return Err(SimulationError::Process {
                            time: self.now,
                            process: key.process,
                            source: ProcessError::Failed(format!("timeout of {delay} overflows the clock")),
                        });
                    };
                    trace!(process = %key.process, time = self.now, delay, "Process suspended");
                    self.processes.insert(key.process, process);
                    self.schedule(key.process, wake);
                }
                Ok(Step::Finished) => {
                    trace!(process = %key.process, time = self.now, "Process finished");
                    self.stats.processes_finished += 1;
                }
                Err(source) => {
                    return Err(SimulationError::Process {
                        time: self.now,
                        process: key.process,
                        source,
                    });
                }
            }
        }

        self.now = horizon;
        Ok(self.stats)
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Give the network back, dropping all pending processes.
    pub fn into_network(self) -> Network {
        self.network
    }

    /// One sample from the fixed table of named distributions.
    pub fn draw(&mut self, name: &str) -> Result<f64, SimulationError> {
        draw(&mut self.rng, name).ok_or_else(|| SimulationError::UnknownDistribution(name.into()))
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    fn schedule(&mut self, process: ProcessId, time: SimTime) {
        let key = EventKey {
            time,
            sequence: self.next_sequence,
            process,
        };
        self.next_sequence += 1;
        self.queue.insert(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netsim_core::{Agent, Behavior, Node, NetworkKind};
    use netsim_types::{AgentId, Value};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use tracing_test::traced_test;

    /// Toggles its node's `state` attribute every time unit.
    struct Toggle;

    impl Behavior for Toggle {
        fn run(&self, agent: &Agent) -> Box<dyn Process> {
            let me = Node::Agent(agent.clone());
            Box::new(move |ctx: &mut Context<'_>| -> Result<Step, ProcessError> {
                let attrs = ctx
                    .network_mut()
                    .node_attributes_mut(&me)
                    .ok_or_else(|| ProcessError::Failed("missing node".into()))?;
                let state = attrs.get("state").and_then(Value::as_bool).unwrap_or(false);
                attrs.insert("state".into(), Value::Bool(!state));
                Ok(Step::Timeout(1))
            })
        }
    }

    /// Fails on its first resumption.
    struct Broken;

    impl Behavior for Broken {
        fn run(&self, _agent: &Agent) -> Box<dyn Process> {
            Box::new(|_ctx: &mut Context<'_>| -> Result<Step, ProcessError> {
                Err(ProcessError::Failed("boom".into()))
            })
        }
    }

    fn network_of(behavior: Arc<dyn Behavior>, size: usize) -> Network {
        let mut network = Network::new(NetworkKind::Graph);
        for i in 0..size {
            let agent = Agent::new(AgentId(i as u64), behavior.clone());
            network.add_node(Node::Agent(agent), None);
        }
        network
    }

    fn recorder(log: Rc<RefCell<Vec<SimTime>>>, every: SimTime) -> Box<dyn Process> {
        Box::new(move |ctx: &mut Context<'_>| -> Result<Step, ProcessError> {
            log.borrow_mut().push(ctx.now());
            Ok(Step::Timeout(every))
        })
    }

    #[traced_test]
    #[test]
    fn test_agents_are_scheduled_at_start() {
        let mut env = Environment::new(network_of(Arc::new(Toggle), 3), 0, Some(1));
        assert_eq!(env.pending(), 3);

        let stats = env.run_until(4).unwrap();
        assert_eq!(stats.events_processed, 12);
        assert_eq!(env.now(), 4);

        // Four toggles leave every node where it started.
        for (_, attrs) in env.network().nodes_with_attributes() {
            assert_eq!(attrs.get("state"), Some(&Value::Bool(false)));
        }
    }

    #[test]
    fn test_horizon_is_exclusive() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut env = Environment::new(Network::new(NetworkKind::Graph), 0, Some(1));
        env.process(recorder(log.clone(), 3));

        env.run_until(10).unwrap();
        assert_eq!(*log.borrow(), vec![0, 3, 6, 9]);

        env.run_until(12).unwrap();
        assert_eq!(*log.borrow(), vec![0, 3, 6, 9]);
        env.run_until(13).unwrap();
        assert_eq!(*log.borrow(), vec![0, 3, 6, 9, 12]);
    }

    #[test]
    fn test_initial_time_offsets_schedule() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut env = Environment::new(Network::new(NetworkKind::Graph), 5, Some(1));
        env.process(recorder(log.clone(), 2));

        env.run_until(10).unwrap();
        assert_eq!(*log.borrow(), vec![5, 7, 9]);
    }

    #[test]
    fn test_finished_processes_are_dropped() {
        let mut env = Environment::new(Network::new(NetworkKind::Graph), 0, Some(1));
        env.process(Box::new(|_ctx: &mut Context<'_>| -> Result<Step, ProcessError> {
            Ok(Step::Finished)
        }));

        let stats = env.run_until(10).unwrap();
        assert_eq!(stats.processes_finished, 1);
        assert_eq!(env.pending(), 0);
    }

    #[test]
    fn test_process_error_stops_run() {
        let mut env = Environment::new(network_of(Arc::new(Broken), 1), 0, Some(1));
        let err = env.run_until(10).unwrap_err();
        match err {
            SimulationError::Process { time, .. } => assert_eq!(time, 0),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_timeout_past_end_of_clock_fails_the_process() {
        let mut env = Environment::new(Network::new(NetworkKind::Graph), 5, Some(1));
        let id = env.process(Box::new(|_ctx: &mut Context<'_>| -> Result<Step, ProcessError> {
            Ok(Step::Timeout(SimTime::MAX))
        }));
        match env.run_until(10) {
            Err(SimulationError::Process { time, process, source }) => {
                assert_eq!(time, 5);
                assert_eq!(process, id);
                assert!(source.to_string().contains("overflows the clock"));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_horizon_in_past_rejected() {
        let mut env = Environment::new(Network::new(NetworkKind::Graph), 5, Some(1));
        assert!(matches!(
            env.run_until(3),
            Err(SimulationError::HorizonInPast { horizon: 3, now: 5 })
        ));
    }

    #[test]
    fn test_draw_is_seeded() {
        let mut a = Environment::new(Network::new(NetworkKind::Graph), 0, Some(42));
        let mut b = Environment::new(Network::new(NetworkKind::Graph), 0, Some(42));
        assert_eq!(a.draw("normal").unwrap(), b.draw("normal").unwrap());
        assert!(matches!(
            a.draw("zipf"),
            Err(SimulationError::UnknownDistribution(_))
        ));
    }
}
