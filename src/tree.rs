use crate::graph::NodeIndex;
use crate::shortest_paths::ShortestPath;
use crate::util::NaturalOrInfinite;
use crate::Graph;
use std::collections::{HashMap, HashSet, VecDeque};
use std::iter;

/// A subgraph represented as a set of normalized `(min, max)` node pairs.
/// Most of the algorithms produce trees, but the type itself only guarantees
/// a simple undirected edge set; see [`EdgeTree::is_tree`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeTree {
    edges: HashSet<(NodeIndex, NodeIndex)>,
}

impl EdgeTree {
    /// The edges of a shortest path walked from `start`.
    pub fn new(path: &ShortestPath, start: NodeIndex) -> Self {
        Self {
            edges: path.edges_from(start).collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            edges: HashSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn insert(&mut self, a: NodeIndex, b: NodeIndex) {
        debug_assert_ne!(a, b);
        self.edges.insert((a.min(b), a.max(b)));
    }

    pub fn remove(&mut self, a: NodeIndex, b: NodeIndex) {
        self.edges.remove(&(a.min(b), a.max(b)));
    }

    pub fn contains(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.edges.contains(&(a.min(b), a.max(b)))
    }

    pub fn extend(&mut self, other: &Self) {
        self.edges.extend(other.edges.iter());
    }

    pub fn edges(&self) -> &HashSet<(NodeIndex, NodeIndex)> {
        &self.edges
    }

    pub fn nodes(&self) -> HashSet<NodeIndex> {
        self.edges
            .iter()
            .flat_map(|&(a, b)| iter::once(a).chain(iter::once(b)))
            .collect()
    }

    pub fn contains_node(&self, node: NodeIndex) -> bool {
        self.edges.iter().any(|&(a, b)| a == node || b == node)
    }

    pub fn degree(&self, node: NodeIndex) -> usize {
        self.edges
            .iter()
            .filter(|&&(a, b)| a == node || b == node)
            .count()
    }

    pub fn weight_in(&self, graph: &Graph) -> NaturalOrInfinite {
        self.edges.iter().map(|&(a, b)| graph.weight(a, b)).sum()
    }

    fn adjacency(&self) -> HashMap<NodeIndex, Vec<NodeIndex>> {
        let mut adjacency: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        for &(a, b) in &self.edges {
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }
        adjacency
    }

    /// Whether the edge set forms a tree (connected and acyclic).
    /// The empty edge set counts as a tree.
    pub fn is_tree(&self) -> bool {
        if self.edges.is_empty() {
            return true;
        }
        let adjacency = self.adjacency();
        let num_nodes = adjacency.len();
        if self.edges.len() != num_nodes - 1 {
            return false;
        }
        // connected + |E| = |V| - 1 implies acyclic
        let &start = adjacency.keys().next().unwrap();
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            for &w in &adjacency[&v] {
                if seen.insert(w) {
                    queue.push_back(w);
                }
            }
        }
        seen.len() == num_nodes
    }

    pub fn find_leaves(&self) -> Vec<NodeIndex> {
        let mut leaves = self
            .nodes()
            .into_iter()
            .filter(|&v| self.degree(v) == 1)
            .collect::<Vec<_>>();
        leaves.sort_unstable();
        leaves
    }

    /// Repeatedly remove leaf nodes for which `keep` is false, together with
    /// their incident edge. Used to strip Steiner points that ended up as
    /// dead ends.
    pub fn prune_leaves(&mut self, keep: impl Fn(NodeIndex) -> bool) {
        loop {
            let prunable = self
                .find_leaves()
                .into_iter()
                .filter(|&v| !keep(v))
                .collect::<Vec<_>>();
            if prunable.is_empty() {
                return;
            }
            for leaf in prunable {
                if let Some(&(a, b)) = self
                    .edges
                    .iter()
                    .find(|&&(a, b)| a == leaf || b == leaf)
                {
                    self.edges.remove(&(a, b));
                }
            }
        }
    }
}
