//! Enumeration of minimum-cost full components for every terminal subset up
//! to a size bound, via Dreyfus-Wagner dynamic programming over sorted
//! terminal-subset keys.

use crate::components::store::FullComponent;
use crate::graph::NodeIndex;
use crate::shortest_paths::ShortestPathMatrix;
use crate::tree::EdgeTree;
use crate::util::{combinations, non_trivial_subsets, sorted, sorted_insert, NaturalOrInfinite};
use crate::Graph;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

/// Stable handle of a partial solution in the generator's arena.
///
/// Partial solutions reference each other (a DAG, since several subsets may
/// share a sub-solution); ids into a grow-only `Vec` stay valid across
/// insertions, unlike references into the hash table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SolutionId(usize);

/// A partial solution of the subset DP: the minimum-cost tree spanning one
/// subset-plus-attachment-node key. `edges` are concrete graph edges to add;
/// `children` are sub-solutions to splice in recursively.
#[derive(Clone, Debug)]
struct DwmSolution {
    cost: NaturalOrInfinite,
    edges: Vec<(NodeIndex, NodeIndex)>,
    children: Vec<SolutionId>,
}

impl DwmSolution {
    /// An invalid record represents infeasibility at this juncture (e.g. no
    /// admissible terminal-avoiding path), distinct from a zero-cost record.
    fn valid(&self) -> bool {
        self.cost == 0u32.into() || (self.cost.is_finite() && !(self.edges.is_empty() && self.children.is_empty()))
    }
}

/// Memoized best split of a subset at a given node.
#[derive(Clone, Copy, Debug)]
struct Split {
    cost: NaturalOrInfinite,
    parts: Option<(SolutionId, SolutionId)>,
}

pub struct FullComponentGeneratorDreyfusWagner<'a> {
    graph: &'a Graph,
    /// Terminal-avoiding all-pairs shortest paths.
    distances: &'a ShortestPathMatrix,
    arena: Vec<DwmSolution>,
    table: HashMap<Vec<NodeIndex>, SolutionId>,
    splits: HashMap<(NodeIndex, Vec<NodeIndex>), Split>,
}

impl<'a> FullComponentGeneratorDreyfusWagner<'a> {
    /// Initialize the DP table with all terminal-and-one-other-node base
    /// entries. `distances` must be the terminal-avoiding matrix of `graph`.
    pub fn new(graph: &'a Graph, distances: &'a ShortestPathMatrix) -> Self {
        let mut generator = FullComponentGeneratorDreyfusWagner {
            graph,
            distances,
            arena: Vec::new(),
            table: HashMap::new(),
            splits: HashMap::new(),
        };
        for &t in graph.terminals() {
            for v in graph.node_indices() {
                if v == t {
                    continue;
                }
                let key = vec![t.min(v), t.max(v)];
                if generator.table.contains_key(&key) {
                    continue;
                }
                let sp = &distances[t][v];
                let solution = DwmSolution {
                    cost: sp.distance(),
                    edges: sp.edges_from(t).collect(),
                    children: vec![],
                };
                generator.insert(key, solution);
            }
        }
        generator
    }

    fn insert(&mut self, key: Vec<NodeIndex>, solution: DwmSolution) -> SolutionId {
        let id = SolutionId(self.arena.len());
        self.arena.push(solution);
        let previous = self.table.insert(key, id);
        debug_assert!(previous.is_none());
        id
    }

    /// Minimum cost of a tree spanning the given sorted node set, infinite if
    /// unknown or infeasible. Two-element keys take a direct distance lookup
    /// instead of a hash lookup.
    pub fn cost_of(&self, key: &[NodeIndex]) -> NaturalOrInfinite {
        debug_assert!(sorted(key));
        if key.len() == 2 {
            return self.distances[key[0]][key[1]].distance();
        }
        match self.table.get(key) {
            Some(&id) if self.arena[id.0].valid() => self.arena[id.0].cost,
            _ => NaturalOrInfinite::infinity(),
        }
    }

    /// Run the DP for all terminal subsets of sizes `2..=restricted`.
    ///
    /// Rounds go from small to large subsets since a subset's solution only
    /// depends on strictly smaller ones; for the same reason a key that is
    /// already present is never recomputed, within or across calls.
    pub fn generate(&mut self, restricted: usize) {
        let terminals = self.graph.terminals().to_vec();
        for size in 2..restricted {
            // Solutions of the maximal size are only ever read back for pure
            // terminal subsets, so the last round skips non-terminal
            // attachment nodes.
            let last_round = size + 1 == restricted;
            for subset in combinations(&terminals, size) {
                let candidates: Vec<NodeIndex> = if last_round {
                    terminals
                        .iter()
                        .copied()
                        .filter(|v| subset.binary_search(v).is_err())
                        .collect()
                } else {
                    self.graph
                        .node_indices()
                        .filter(|v| subset.binary_search(v).is_err())
                        .collect()
                };
                for v in candidates {
                    let key = sorted_insert(&subset, v);
                    if self.table.contains_key(&key) {
                        continue;
                    }
                    let solution = self.compute_solution(&subset, v);
                    trace!("dp key {key:?}: cost {:?}", solution.cost);
                    self.insert(key, solution);
                }
            }
        }
        debug!(
            "dreyfus-wagner table holds {} partial solutions after restriction {restricted}",
            self.arena.len()
        );
    }

    /// Best way to span `subset` plus the attachment node `v`: either connect
    /// `v` to the tree spanning `subset` at one of its terminals, or route
    /// `v` to a split node carrying two disjoint halves of the subset.
    fn compute_solution(&mut self, subset: &[NodeIndex], v: NodeIndex) -> DwmSolution {
        let mut best = DwmSolution {
            cost: NaturalOrInfinite::infinity(),
            edges: vec![],
            children: vec![],
        };
        if let Some(&sub_id) = self.table.get(subset) {
            if self.arena[sub_id.0].valid() {
                let sub_cost = self.arena[sub_id.0].cost;
                for &w in subset {
                    let sp = &self.distances[v][w];
                    let candidate = sp.distance() + sub_cost;
                    if candidate < best.cost {
                        let edges: Vec<(NodeIndex, NodeIndex)> = sp.edges_from(v).collect();
                        if !self.edges_disjoint(&edges, &[sub_id]) {
                            continue;
                        }
                        best = DwmSolution {
                            cost: candidate,
                            edges,
                            children: vec![sub_id],
                        };
                    }
                }
            }
        }
        let split_nodes: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|w| subset.binary_search(w).is_err())
            .collect();
        for w in split_nodes {
            let distance = if w == v {
                0u32.into()
            } else {
                self.distances[v][w].distance()
            };
            if !distance.is_finite() {
                continue;
            }
            let split = self.split(subset, w);
            let Some((first, second)) = split.parts else {
                continue;
            };
            let candidate = distance + split.cost;
            if candidate < best.cost {
                let edges: Vec<(NodeIndex, NodeIndex)> = if w == v {
                    vec![]
                } else {
                    self.distances[v][w].edges_from(v).collect()
                };
                if !self.edges_disjoint(&edges, &[first, second]) {
                    continue;
                }
                best = DwmSolution {
                    cost: candidate,
                    edges,
                    children: vec![first, second],
                };
            }
        }
        best
    }

    /// Cheapest bipartition of `subset` into two halves both attached at `w`
    /// (`w` itself must not be in the subset). Memoized per (node, subset);
    /// safe across rounds since smaller solutions are immutable.
    fn split(&mut self, subset: &[NodeIndex], w: NodeIndex) -> Split {
        debug_assert!(subset.binary_search(&w).is_err());
        let memo_key = (w, subset.to_vec());
        if let Some(&memoized) = self.splits.get(&memo_key) {
            return memoized;
        }
        let mut best = Split {
            cost: NaturalOrInfinite::infinity(),
            parts: None,
        };
        for part in non_trivial_subsets(subset) {
            let complement: Vec<NodeIndex> = subset
                .iter()
                .copied()
                .filter(|e| part.binary_search(e).is_err())
                .collect();
            let first_key = sorted_insert(&part, w);
            let second_key = sorted_insert(&complement, w);
            let (Some(&first), Some(&second)) =
                (self.table.get(&first_key), self.table.get(&second_key))
            else {
                continue;
            };
            if !self.arena[first.0].valid() || !self.arena[second.0].valid() {
                continue;
            }
            let candidate = self.arena[first.0].cost + self.arena[second.0].cost;
            if candidate < best.cost && self.edges_disjoint(&[], &[first, second]) {
                best = Split {
                    cost: candidate,
                    parts: Some((first, second)),
                };
            }
        }
        self.splits.insert(memo_key, best);
        best
    }

    /// Whether the attachment edges and the edge sets of the given
    /// sub-solutions are pairwise disjoint. A candidate reusing an edge
    /// across its parts would count that edge's weight more than once, so
    /// its cost would not match any actual tree; such candidates are
    /// discarded. Every tree admits an edge-disjoint decomposition, so no
    /// optimum is lost.
    fn edges_disjoint(&self, edges: &[(NodeIndex, NodeIndex)], children: &[SolutionId]) -> bool {
        let mut seen: HashSet<(NodeIndex, NodeIndex)> = edges.iter().copied().collect();
        if seen.len() != edges.len() {
            return false;
        }
        children.iter().all(|&child| self.insert_edges(child, &mut seen))
    }

    fn insert_edges(&self, id: SolutionId, seen: &mut HashSet<(NodeIndex, NodeIndex)>) -> bool {
        let solution = &self.arena[id.0];
        solution.edges.iter().all(|&edge| seen.insert(edge))
            && solution.children.iter().all(|&child| self.insert_edges(child, seen))
    }

    /// Reconstruct the tree for an exact terminal subset by unioning the
    /// recorded edges of its solution and all referenced sub-solutions.
    pub fn steiner_tree_for(
        &self,
        terminal_subset: &[NodeIndex],
    ) -> Option<(NaturalOrInfinite, EdgeTree)> {
        debug_assert!(sorted(terminal_subset));
        let &id = self.table.get(terminal_subset)?;
        if !self.arena[id.0].valid() {
            return None;
        }
        let mut tree = EdgeTree::empty();
        self.collect_edges(id, &mut tree);
        Some((self.arena[id.0].cost, tree))
    }

    fn collect_edges(&self, id: SolutionId, tree: &mut EdgeTree) {
        let solution = &self.arena[id.0];
        for &(a, b) in &solution.edges {
            tree.insert(a, b);
        }
        for &child in &solution.children {
            self.collect_edges(child, tree);
        }
    }

    /// Enumerate valid full components for all terminal subsets of sizes
    /// `2..=restricted`. [`generate`](Self::generate) must have been called
    /// with at least the same restriction.
    pub fn find_full_components(&self, restricted: usize) -> Vec<FullComponent> {
        let mut components = Vec::new();
        for size in 2..=restricted {
            for subset in combinations(self.graph.terminals(), size) {
                let Some((cost, tree)) = self.steiner_tree_for(&subset) else {
                    continue;
                };
                if tree.is_empty() || !tree.is_tree() || !is_valid_component(&tree, self.graph) {
                    continue;
                }
                let mut tree_terminals: Vec<NodeIndex> = tree
                    .nodes()
                    .into_iter()
                    .filter(|&v| self.graph.is_terminal(v))
                    .collect();
                tree_terminals.sort_unstable();
                if tree_terminals != subset {
                    continue;
                }
                debug_assert_eq!(tree.weight_in(self.graph), cost, "subset {subset:?}");
                components.push(FullComponent::new(subset, tree, cost));
            }
        }
        debug!("{} full components up to size {restricted}", components.len());
        components
    }
}

/// A constructed component is a valid full component iff every terminal in it
/// is a leaf; Steiner nodes may have any degree.
pub fn is_valid_component(tree: &EdgeTree, graph: &Graph) -> bool {
    tree.nodes()
        .into_iter()
        .all(|v| !graph.is_terminal(v) || tree.degree(v) == 1)
}

/// Full components spanning exactly two terminals: one per terminal pair
/// joined by an admissible (terminal-avoiding) shortest path.
pub fn find_full_2_components(
    graph: &Graph,
    distances: &ShortestPathMatrix,
) -> Vec<FullComponent> {
    let mut components = Vec::new();
    for pair in combinations(graph.terminals(), 2) {
        let sp = &distances[pair[0]][pair[1]];
        if !sp.exists() {
            continue;
        }
        let tree = EdgeTree::new(sp, pair[0]);
        debug_assert!(is_valid_component(&tree, graph));
        let cost = sp.distance();
        components.push(FullComponent::new(pair, tree, cost));
    }
    components
}

/// Full components spanning exactly three terminals: the best non-terminal
/// center joined to all three by admissible shortest paths. Unions whose
/// paths overlap into a non-tree are discarded.
pub fn find_full_3_components(
    graph: &Graph,
    distances: &ShortestPathMatrix,
) -> Vec<FullComponent> {
    let mut components = Vec::new();
    for triple in combinations(graph.terminals(), 3) {
        let mut best: Option<(NaturalOrInfinite, NodeIndex)> = None;
        for center in graph.node_indices().filter(|&v| !graph.is_terminal(v)) {
            let total: NaturalOrInfinite = triple
                .iter()
                .map(|&t| distances[center][t].distance())
                .sum();
            if total.is_finite() && best.map_or(true, |(cost, _)| total < cost) {
                best = Some((total, center));
            }
        }
        let Some((_, center)) = best else {
            continue;
        };
        let mut tree = EdgeTree::empty();
        for &t in &triple {
            tree.extend(&EdgeTree::new(&distances[center][t], center));
        }
        if !tree.is_tree() || !is_valid_component(&tree, graph) {
            continue;
        }
        let weight = tree.weight_in(graph);
        components.push(FullComponent::new(triple, tree, weight));
    }
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{k4_unit, shortcut_test_graph, star5, steiner_example_wiki};

    fn generator_for(
        graph: &Graph,
        distances: &ShortestPathMatrix,
        restricted: usize,
    ) -> Vec<FullComponent> {
        // helper building a fresh generator and running it once
        let mut generator = FullComponentGeneratorDreyfusWagner::new(graph, distances);
        generator.generate(restricted);
        generator.find_full_components(restricted)
    }

    #[test]
    fn test_pair_components_shortcut() {
        let graph = shortcut_test_graph();
        let distances = ShortestPathMatrix::terminal_avoiding(&graph);
        let components = find_full_2_components(&graph, &distances);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].terminals(), &[0, 2]);
        assert_eq!(components[0].cost(), 2.into());
    }

    #[test]
    fn test_k4_components() {
        let graph = k4_unit();
        let distances = ShortestPathMatrix::terminal_avoiding(&graph);
        let components = generator_for(&graph, &distances, 3);
        // every pair is a unit-cost component; no triple survives the
        // terminals-as-leaves filter since K4 has no Steiner nodes
        assert_eq!(components.len(), 6);
        assert!(components.iter().all(|c| c.cost() == 1.into()));
        assert!(components.iter().all(|c| c.terminals().len() == 2));
    }

    #[test]
    fn test_star_components() {
        let graph = star5();
        let distances = ShortestPathMatrix::terminal_avoiding(&graph);
        let components = generator_for(&graph, &distances, 3);
        let pairs = components
            .iter()
            .filter(|c| c.terminals().len() == 2)
            .count();
        let triples = components
            .iter()
            .filter(|c| c.terminals().len() == 3)
            .count();
        assert_eq!(pairs, 10);
        assert_eq!(triples, 10);
        for component in &components {
            let expected = component.terminals().len() as u32;
            assert_eq!(component.cost(), expected.into());
            assert_eq!(component.steiner_nodes(&graph), vec![0]);
        }
    }

    #[test]
    fn test_direct_3_components_match_dp() {
        let graph = star5();
        let distances = ShortestPathMatrix::terminal_avoiding(&graph);
        let direct = find_full_3_components(&graph, &distances);
        let mut generator = FullComponentGeneratorDreyfusWagner::new(&graph, &distances);
        generator.generate(3);
        for component in &direct {
            let (cost, _) = generator.steiner_tree_for(component.terminals()).unwrap();
            assert_eq!(cost, component.cost());
        }
    }

    #[test]
    fn test_reconstruction_weight_matches_cost() {
        let graph = steiner_example_wiki();
        let distances = ShortestPathMatrix::terminal_avoiding(&graph);
        let mut generator = FullComponentGeneratorDreyfusWagner::new(&graph, &distances);
        generator.generate(4);
        for size in 2..=4usize {
            for subset in combinations(graph.terminals(), size) {
                if let Some((cost, tree)) = generator.steiner_tree_for(&subset) {
                    assert_eq!(tree.weight_in(&graph), cost, "subset {subset:?}");
                    assert!(tree.is_tree(), "subset {subset:?}");
                }
            }
        }
    }

    #[test]
    fn test_candidates_sharing_edges_are_discarded() {
        // connecting terminal 0 to {7, 11} through terminal 8 looks cheapest
        // but reuses the edge (8, 10) in two parts of the decomposition; the
        // cheapest edge-disjoint tree routes 0-1-5-7 and 7-9-10-11 for 220
        let graph = steiner_example_wiki();
        let distances = ShortestPathMatrix::terminal_avoiding(&graph);
        let mut generator = FullComponentGeneratorDreyfusWagner::new(&graph, &distances);
        generator.generate(3);
        assert_eq!(generator.cost_of(&[0, 7, 11]), 220.into());
        let (cost, tree) = generator.steiner_tree_for(&[0, 7, 11]).unwrap();
        assert_eq!(cost, 220.into());
        assert_eq!(tree.weight_in(&graph), cost);
        assert!(tree.is_tree());
    }

    #[test]
    fn test_generation_idempotent() {
        let graph = steiner_example_wiki();
        let distances = ShortestPathMatrix::terminal_avoiding(&graph);
        let mut generator = FullComponentGeneratorDreyfusWagner::new(&graph, &distances);
        generator.generate(3);
        let before: Vec<_> = combinations(graph.terminals(), 3)
            .map(|s| generator.cost_of(&s))
            .collect();
        generator.generate(3);
        let after: Vec<_> = combinations(graph.terminals(), 3)
            .map(|s| generator.cost_of(&s))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_terminal_hub_invalidates_pairs() {
        // terminal center: leaf terminals can only reach each other through
        // it, so no pair component between leaves exists
        let graph = Graph::new(3, &[(0, 1, 1), (0, 2, 1)], &[0, 1, 2]);
        let distances = ShortestPathMatrix::terminal_avoiding(&graph);
        let components = find_full_2_components(&graph, &distances);
        let pairs: Vec<_> = components.iter().map(|c| c.terminals().to_vec()).collect();
        assert!(pairs.contains(&vec![0, 1]));
        assert!(pairs.contains(&vec![0, 2]));
        assert!(!pairs.contains(&vec![1, 2]));
    }
}
