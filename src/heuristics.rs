//! Steiner tree heuristics: the Takahashi-Matsuyama 2-approximation (used as
//! an upper bound and fallback) and the assembly of a concrete tree over a
//! marked terminal set (metric-closure MST, path expansion, subgraph MST,
//! leaf pruning), in the style of Kou et al.

use crate::graph::NodeIndex;
use crate::shortest_paths::ShortestPathMatrix;
use crate::tree::EdgeTree;
use crate::util::{NaturalOrInfinite, UnionFind};
use crate::Graph;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Takahashi-Matsuyama: grow a tree from the first terminal by repeatedly
/// attaching the remaining terminal closest to the current tree along a
/// shortest path. Guarantees weight at most twice the optimum.
pub fn takahashi_matsuyama_steiner_approximation(graph: &Graph) -> EdgeTree {
    let apsp = ShortestPathMatrix::new(graph);
    let terminals = graph.terminals();
    let mut tree = EdgeTree::empty();
    if terminals.len() <= 1 {
        return tree;
    }
    let mut tree_nodes: HashSet<NodeIndex> = HashSet::from([terminals[0]]);
    let mut remaining: Vec<NodeIndex> = terminals[1..].to_vec();
    while !remaining.is_empty() {
        let mut best: Option<(NaturalOrInfinite, NodeIndex, usize)> = None;
        for (index, &terminal) in remaining.iter().enumerate() {
            for &node in &tree_nodes {
                let distance = apsp[node][terminal].distance();
                if best.map_or(true, |(d, _, _)| distance < d) {
                    best = Some((distance, node, index));
                }
            }
        }
        let Some((distance, from, index)) = best else {
            break;
        };
        if !distance.is_finite() {
            debug!("terminal {} unreachable from the tree", remaining[index]);
            break;
        }
        let segment = EdgeTree::new(&apsp[from][remaining[index]], from);
        for node in segment.nodes() {
            tree_nodes.insert(node);
        }
        tree.extend(&segment);
        // the path may have picked up further terminals along the way
        remaining.retain(|t| !tree_nodes.contains(t));
    }
    tree
}

/// Assemble a Steiner tree over all nodes flagged in `is_new_terminal`:
/// Kruskal over the metric closure of the flagged nodes, expansion of the
/// chosen closure edges into concrete shortest paths, a second MST pass over
/// the expanded subgraph (path expansion can close cycles), and finally
/// pruning of non-terminal dead ends.
pub fn obtain_final_steiner_tree(
    graph: &Graph,
    is_new_terminal: &[bool],
    apsp: &ShortestPathMatrix,
) -> EdgeTree {
    let marked: Vec<NodeIndex> = graph.node_indices().filter(|&v| is_new_terminal[v]).collect();
    let mut expanded = EdgeTree::empty();
    if marked.len() <= 1 {
        return expanded;
    }

    let mut closure: Vec<(NaturalOrInfinite, usize, usize)> = Vec::new();
    for i in 0..marked.len() {
        for j in i + 1..marked.len() {
            let distance = apsp[marked[i]][marked[j]].distance();
            if distance.is_finite() {
                closure.push((distance, i, j));
            }
        }
    }
    closure.sort_unstable();
    let mut closure_sets = UnionFind::new(marked.len());
    for (_, i, j) in closure {
        if closure_sets.union(i, j) {
            expanded.extend(&EdgeTree::new(&apsp[marked[i]][marked[j]], marked[i]));
        }
    }

    let nodes: Vec<NodeIndex> = {
        let mut nodes: Vec<_> = expanded.nodes().into_iter().collect();
        nodes.sort_unstable();
        nodes
    };
    let position: HashMap<NodeIndex, usize> =
        nodes.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let mut subgraph: Vec<(NaturalOrInfinite, NodeIndex, NodeIndex)> = expanded
        .edges()
        .iter()
        .map(|&(a, b)| (graph.weight(a, b), a, b))
        .collect();
    subgraph.sort_unstable();
    let mut node_sets = UnionFind::new(nodes.len());
    let mut tree = EdgeTree::empty();
    for (_, a, b) in subgraph {
        if node_sets.union(position[&a], position[&b]) {
            tree.insert(a, b);
        }
    }

    tree.prune_leaves(|v| graph.is_terminal(v));
    debug!(
        "assembled tree over {} marked nodes: weight {:?}",
        marked.len(),
        tree.weight_in(graph)
    );
    tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{k4_unit, shortcut_test_graph, star5, steiner_example_wiki};

    fn contains_all_terminals(tree: &EdgeTree, graph: &Graph) -> bool {
        graph.terminals().iter().all(|&t| tree.contains_node(t))
    }

    #[test]
    fn test_takahashi_matsuyama_small() {
        let graph = shortcut_test_graph();
        let tree = takahashi_matsuyama_steiner_approximation(&graph);
        assert!(tree.is_tree());
        assert!(contains_all_terminals(&tree, &graph));
        assert_eq!(tree.weight_in(&graph), 2.into());
    }

    #[test]
    fn test_takahashi_matsuyama_star() {
        let graph = star5();
        let tree = takahashi_matsuyama_steiner_approximation(&graph);
        assert!(tree.is_tree());
        assert!(contains_all_terminals(&tree, &graph));
        assert_eq!(tree.weight_in(&graph), 5.into());
    }

    #[test]
    fn test_takahashi_matsuyama_wiki() {
        let graph = steiner_example_wiki();
        let tree = takahashi_matsuyama_steiner_approximation(&graph);
        assert!(tree.is_tree());
        assert!(contains_all_terminals(&tree, &graph));
        let total: u32 = graph.edges().map(|(_, _, w)| w).sum();
        assert!(tree.weight_in(&graph) < total.into());
    }

    #[test]
    fn test_single_terminal_yields_empty_tree() {
        let graph = Graph::new(3, &[(0, 1, 1), (1, 2, 1)], &[1]);
        assert!(takahashi_matsuyama_steiner_approximation(&graph).is_empty());
    }

    #[test]
    fn test_assembly_k4() {
        let graph = k4_unit();
        let apsp = ShortestPathMatrix::new(&graph);
        let marked = vec![true; 4];
        let tree = obtain_final_steiner_tree(&graph, &marked, &apsp);
        assert!(tree.is_tree());
        assert!(contains_all_terminals(&tree, &graph));
        assert_eq!(tree.weight_in(&graph), 3.into());
    }

    #[test]
    fn test_assembly_star_without_center() {
        // the center is not marked but the paths route through it anyway
        let graph = star5();
        let apsp = ShortestPathMatrix::new(&graph);
        let mut marked = vec![false; graph.num_nodes()];
        for &t in graph.terminals() {
            marked[t] = true;
        }
        let tree = obtain_final_steiner_tree(&graph, &marked, &apsp);
        assert!(tree.is_tree());
        assert!(contains_all_terminals(&tree, &graph));
        assert_eq!(tree.weight_in(&graph), 5.into());
    }

    #[test]
    fn test_assembly_prunes_dangling_steiner_nodes() {
        // a marked non-terminal spur off the 0-1-2 path gets pruned
        let graph = Graph::new(4, &[(0, 1, 1), (1, 2, 1), (1, 3, 1)], &[0, 2]);
        let apsp = ShortestPathMatrix::new(&graph);
        let marked = vec![true, false, true, true];
        let tree = obtain_final_steiner_tree(&graph, &marked, &apsp);
        assert!(tree.is_tree());
        assert!(!tree.contains_node(3));
        assert_eq!(tree.weight_in(&graph), 2.into());
    }
}
