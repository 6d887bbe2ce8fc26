//! Node list construction.

use crate::attributes::AttributeSampler;
use crate::distribution::AttributeSpec;
use crate::{BuildError, RandomStream};
use netsim_core::{Agent, Behavior, Node};
use netsim_types::{AgentId, Attributes};
use std::sync::Arc;

/// One entry of a built node list.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeRecord {
    /// No attributes were declared.
    Bare(Node),
    WithAttributes(Node, Attributes),
}

impl NodeRecord {
    pub fn node(&self) -> &Node {
        match self {
            NodeRecord::Bare(node) | NodeRecord::WithAttributes(node, _) => node,
        }
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self {
            NodeRecord::Bare(_) => None,
            NodeRecord::WithAttributes(_, attributes) => Some(attributes),
        }
    }

    pub fn into_parts(self) -> (Node, Option<Attributes>) {
        match self {
            NodeRecord::Bare(node) => (node, None),
            NodeRecord::WithAttributes(node, attributes) => (node, Some(attributes)),
        }
    }
}

/// Builds `size` nodes with dense indices `0..size`.
///
/// With an agent behaviour set, node `i` is an agent with id `i`; otherwise
/// it is the bare index.
#[derive(Clone, Default)]
pub struct NodeListBuilder {
    size: usize,
    agent: Option<Arc<dyn Behavior>>,
    attributes: AttributeSampler,
}

impl NodeListBuilder {
    pub fn new(stream: Option<RandomStream>) -> Self {
        Self {
            size: 0,
            agent: None,
            attributes: AttributeSampler::new(stream),
        }
    }

    pub fn set_size(&mut self, size: usize) -> &mut Self {
        self.size = size;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn set_agent(&mut self, behavior: Arc<dyn Behavior>) -> &mut Self {
        self.agent = Some(behavior);
        self
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        spec: impl Into<AttributeSpec>,
    ) -> Result<&mut Self, BuildError> {
        self.attributes.add(name, spec)?;
        Ok(self)
    }

    pub fn build(&self) -> Result<Vec<NodeRecord>, BuildError> {
        let node = |index: usize| match &self.agent {
            Some(behavior) => Node::Agent(Agent::new(AgentId::from(index), behavior.clone())),
            None => Node::Index(index),
        };

        if self.attributes.is_empty() {
            return Ok((0..self.size).map(|i| NodeRecord::Bare(node(i))).collect());
        }

        let attributes = self.attributes.build(self.size)?;
        Ok(attributes
            .into_iter()
            .enumerate()
            .map(|(i, attrs)| NodeRecord::WithAttributes(node(i), attrs))
            .collect())
    }
}

impl std::fmt::Debug for NodeListBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeListBuilder")
            .field("size", &self.size)
            .field("agent", &self.agent.as_ref().map(|b| b.kind()))
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DistributionSpec;
    use netsim_core::{Context, Process, ProcessError, Step};
    use netsim_types::Value;

    struct Idle;

    impl Behavior for Idle {
        fn run(&self, _agent: &Agent) -> Box<dyn Process> {
            Box::new(|_ctx: &mut Context<'_>| -> Result<Step, ProcessError> { Ok(Step::Finished) })
        }
    }

    #[test]
    fn test_bare_indices() {
        let mut builder = NodeListBuilder::new(None);
        builder.set_size(3);
        let nodes = builder.build().unwrap();
        assert_eq!(
            nodes,
            vec![
                NodeRecord::Bare(Node::Index(0)),
                NodeRecord::Bare(Node::Index(1)),
                NodeRecord::Bare(Node::Index(2)),
            ]
        );
    }

    #[test]
    fn test_agents_carry_dense_ids() {
        let mut builder = NodeListBuilder::new(None);
        builder.set_size(4).set_agent(Arc::new(Idle));
        let ids: Vec<_> = builder
            .build()
            .unwrap()
            .iter()
            .map(|r| r.node().as_agent().map(Agent::id))
            .collect();
        assert_eq!(ids, (0..4u64).map(|i| Some(AgentId(i))).collect::<Vec<_>>());
    }

    #[test]
    fn test_attributes_attached_per_node() {
        let mut builder = NodeListBuilder::new(Some(RandomStream::from_seed(3)));
        builder
            .set_size(5)
            .add("alive", true)
            .unwrap()
            .add("score", DistributionSpec::named("standard_normal"))
            .unwrap();
        let nodes = builder.build().unwrap();
        assert_eq!(nodes.len(), 5);
        for record in &nodes {
            let attrs = record.attributes().unwrap();
            assert_eq!(attrs.get("alive"), Some(&Value::Bool(true)));
            assert!(attrs.contains_key("score"));
        }
    }

    #[test]
    fn test_zero_size() {
        let mut builder = NodeListBuilder::new(None);
        builder.add("alive", true).unwrap();
        assert!(builder.build().unwrap().is_empty());
    }
}
