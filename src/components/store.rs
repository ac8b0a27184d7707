use crate::graph::NodeIndex;
use crate::tree::EdgeTree;
use crate::util::{sorted, NaturalOrInfinite};
use crate::Graph;
use std::collections::HashSet;

/// A full component: a tree spanning a subset of terminals (its leaves) plus
/// possibly some Steiner points, together with the fractional weight
/// (`extra`) the LP relaxation assigns to it.
#[derive(Clone, Debug)]
pub struct FullComponent {
    terminals: Vec<NodeIndex>,
    tree: EdgeTree,
    cost: NaturalOrInfinite,
    extra: f64,
}

impl FullComponent {
    pub fn new(terminals: Vec<NodeIndex>, tree: EdgeTree, cost: NaturalOrInfinite) -> Self {
        debug_assert!(sorted(&terminals));
        debug_assert!(terminals.len() >= 2);
        debug_assert!(tree.is_tree());
        FullComponent {
            terminals,
            tree,
            cost,
            extra: 0.0,
        }
    }

    /// The terminals spanned by this component, sorted ascending.
    pub fn terminals(&self) -> &[NodeIndex] {
        &self.terminals
    }

    pub fn tree(&self) -> &EdgeTree {
        &self.tree
    }

    pub fn cost(&self) -> NaturalOrInfinite {
        self.cost
    }

    /// Fractional LP weight; zero until the LP has been solved.
    pub fn extra(&self) -> f64 {
        self.extra
    }

    pub fn set_extra(&mut self, extra: f64) {
        self.extra = extra;
    }

    /// All nodes of the component, terminals and Steiner points alike.
    pub fn nodes(&self) -> HashSet<NodeIndex> {
        self.tree.nodes()
    }

    /// The component's non-terminal (Steiner) nodes.
    pub fn steiner_nodes(&self, graph: &Graph) -> Vec<NodeIndex> {
        let mut nodes = self
            .nodes()
            .into_iter()
            .filter(|&v| !graph.is_terminal(v))
            .collect::<Vec<_>>();
        nodes.sort_unstable();
        nodes
    }
}

/// Container of full components with stable positional ids in `0..len()`.
/// Removing id `i` shifts all ids above `i` down by one, so batch removals
/// must walk ids in descending order.
#[derive(Clone, Debug, Default)]
pub struct FullComponentStore {
    components: Vec<FullComponent>,
}

impl FullComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, component: FullComponent) -> usize {
        self.components.push(component);
        self.components.len() - 1
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, id: usize) -> &FullComponent {
        &self.components[id]
    }

    pub fn remove(&mut self, id: usize) -> FullComponent {
        self.components.remove(id)
    }

    pub fn extra(&self, id: usize) -> f64 {
        self.components[id].extra()
    }

    pub fn set_extra(&mut self, id: usize, extra: f64) {
        self.components[id].set_extra(extra);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FullComponent> {
        self.components.iter()
    }

    /// Remove every component whose `extra` weight is at most `epsilon`.
    pub fn remove_inactive(&mut self, epsilon: f64) {
        for id in (0..self.len()).rev() {
            if self.extra(id) <= epsilon {
                self.remove(id);
            }
        }
    }
}
