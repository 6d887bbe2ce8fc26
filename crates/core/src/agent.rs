//! Agents and node identifiers.

use crate::{Behavior, Process};
use netsim_types::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An identity plus a shared behaviour.
///
/// Equality and hashing use the id together with the behaviour kind, so two
/// agents with the same id but different behaviours are distinct nodes.
#[derive(Clone)]
pub struct Agent {
    id: AgentId,
    behavior: Arc<dyn Behavior>,
}

impl Agent {
    pub fn new(id: impl Into<AgentId>, behavior: Arc<dyn Behavior>) -> Self {
        Self {
            id: id.into(),
            behavior,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn kind(&self) -> &'static str {
        self.behavior.kind()
    }

    /// Create this agent's resumable action.
    pub fn run(&self) -> Box<dyn Process> {
        self.behavior.run(self)
    }
}

impl PartialEq for Agent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind() == other.kind()
    }
}

impl Eq for Agent {}

impl Hash for Agent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.kind().hash(state);
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id.0)
            .field("kind", &self.kind())
            .finish()
    }
}

/// A node identifier: a dense index or an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Index(usize),
    Agent(Agent),
}

impl Node {
    pub fn as_agent(&self) -> Option<&Agent> {
        match self {
            Node::Agent(agent) => Some(agent),
            Node::Index(_) => None,
        }
    }

    /// Serialisable description of this node.
    pub fn label(&self) -> NodeLabel {
        match self {
            Node::Index(index) => NodeLabel::Index(*index),
            Node::Agent(agent) => NodeLabel::Agent {
                id: agent.id(),
                kind: agent.kind().to_string(),
            },
        }
    }
}

impl From<usize> for Node {
    fn from(index: usize) -> Self {
        Node::Index(index)
    }
}

impl From<Agent> for Node {
    fn from(agent: Agent) -> Self {
        Node::Agent(agent)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Index(index) => write!(f, "Node({index})"),
            Node::Agent(agent) => write!(f, "{}", agent.id()),
        }
    }
}

/// Behaviour-free view of a [`Node`], used in persisted snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLabel {
    Index(usize),
    Agent { id: AgentId, kind: String },
}
