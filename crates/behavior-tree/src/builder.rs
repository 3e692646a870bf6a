//! Fluent template construction with auto-generated keys.

use crate::node::{NodeKind, NodeTemplate};

/// Builds [`NodeTemplate`] trees, generating a unique key per node unless
/// the caller supplies one.
///
/// Generated keys are `{kind}_{n}` with a builder-wide counter, so sibling
/// and cousin keys never collide within one builder.
pub struct TreeBuilder {
    counter: u64,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    fn next_key(&mut self, kind: NodeKind) -> String {
        self.counter += 1;
        format!("{}_{}", kind.to_string().to_lowercase(), self.counter)
    }

    /// A node with an explicit key.
    pub fn keyed<T, C>(
        &mut self,
        key: impl Into<String>,
        kind: NodeKind,
        node_type: T,
        config: C,
        children: Vec<NodeTemplate<T, C>>,
    ) -> NodeTemplate<T, C> {
        NodeTemplate {
            key: key.into(),
            kind,
            node_type,
            config,
            children,
        }
    }

    /// A node with a generated key.
    pub fn node<T, C>(
        &mut self,
        kind: NodeKind,
        node_type: T,
        config: C,
        children: Vec<NodeTemplate<T, C>>,
    ) -> NodeTemplate<T, C> {
        let key = self.next_key(kind);
        self.keyed(key, kind, node_type, config, children)
    }

    pub fn sequence<T, C>(
        &mut self,
        node_type: T,
        config: C,
        children: Vec<NodeTemplate<T, C>>,
    ) -> NodeTemplate<T, C> {
        self.node(NodeKind::Sequence, node_type, config, children)
    }

    pub fn selector<T, C>(
        &mut self,
        node_type: T,
        config: C,
        children: Vec<NodeTemplate<T, C>>,
    ) -> NodeTemplate<T, C> {
        self.node(NodeKind::Selector, node_type, config, children)
    }

    pub fn condition<T, C>(&mut self, node_type: T, config: C) -> NodeTemplate<T, C> {
        self.node(NodeKind::Condition, node_type, config, Vec::new())
    }

    pub fn action<T, C>(&mut self, node_type: T, config: C) -> NodeTemplate<T, C> {
        self.node(NodeKind::Action, node_type, config, Vec::new())
    }

    pub fn until<T, C>(
        &mut self,
        node_type: T,
        config: C,
        children: Vec<NodeTemplate<T, C>>,
    ) -> NodeTemplate<T, C> {
        self.node(NodeKind::Until, node_type, config, children)
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
