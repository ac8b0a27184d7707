use crate::graph::NodeIndex;
use crate::util::NaturalOrInfinite;
use crate::Graph;
use std::cmp::Ordering;
use std::mem;
use std::ops::{Index, IndexMut, Range};

/// A shortest path to some target node. The path is stored without its start
/// node and ends with the target node; an unreachable target has infinite
/// distance and an empty path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortestPath {
    distance: NaturalOrInfinite,
    path: Vec<NodeIndex>,
}

impl ShortestPath {
    pub fn new(path: Vec<NodeIndex>, distance: NaturalOrInfinite) -> Self {
        Self { path, distance }
    }

    pub fn empty() -> Self {
        Self {
            path: vec![],
            distance: 0.into(),
        }
    }

    pub fn distance(&self) -> NaturalOrInfinite {
        self.distance
    }

    pub fn path(&self) -> &[NodeIndex] {
        &self.path
    }

    /// Whether a path exists at all. Under the terminal-avoiding convention
    /// this is the admissibility test: an inadmissible pair looks exactly
    /// like an unreachable one.
    pub fn exists(&self) -> bool {
        self.distance.is_finite()
    }

    /// The edges of the path when walked from `start`, as normalized
    /// `(min, max)` node pairs.
    pub fn edges_from(&self, start: NodeIndex) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        std::iter::once(start)
            .chain(self.path.iter().copied())
            .zip(self.path.iter().copied())
            .map(|(a, b)| (a.min(b), a.max(b)))
    }
}

impl Default for ShortestPath {
    fn default() -> Self {
        Self {
            distance: NaturalOrInfinite::infinity(),
            path: vec![],
        }
    }
}

impl Ord for ShortestPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance().cmp(&other.distance())
    }
}

impl PartialOrd for ShortestPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// All-pairs shortest paths computed by the Floyd-Warshall algorithm,
/// storing distance and explicit path per node pair.
pub struct ShortestPathMatrix {
    paths: Vec<ShortestPath>,
    dimension: usize,
}

impl ShortestPathMatrix {
    /// All-pairs shortest paths without any restriction on the paths.
    pub fn new(graph: &Graph) -> Self {
        Self::with_intermediates(graph, |_| true)
    }

    /// All-pairs shortest paths where the *interior* nodes of every path must
    /// be non-terminals. Used by the full-component enumeration, where
    /// terminals may only appear as leaves: a pair without such a path gets
    /// infinite distance even if the nodes are connected through terminals.
    pub fn terminal_avoiding(graph: &Graph) -> Self {
        Self::with_intermediates(graph, |v| !graph.is_terminal(v))
    }

    fn with_intermediates(graph: &Graph, admissible: impl Fn(NodeIndex) -> bool) -> Self {
        let n = graph.num_nodes();
        let mut res = ShortestPathMatrix {
            paths: vec![ShortestPath::default(); n * n],
            dimension: n,
        };
        res.floyd_warshall(graph, admissible);
        res
    }

    /// Based on the pseudo-code
    /// [on Wikipedia](https://en.wikipedia.org/wiki/Floyd%E2%80%93Warshall_algorithm);
    /// intermediate nodes are restricted to those accepted by `admissible`.
    fn floyd_warshall(&mut self, graph: &Graph, admissible: impl Fn(NodeIndex) -> bool) {
        for (from, to, weight) in graph.edges() {
            self[from][to] = ShortestPath::new(vec![to], weight.into());
            self[to][from] = ShortestPath::new(vec![from], weight.into());
        }
        for n in graph.node_indices() {
            self[n][n] = ShortestPath::new(vec![], 0.into());
        }
        for k in graph.node_indices().filter(|&k| admissible(k)) {
            for i in graph.node_indices() {
                for j in graph.node_indices() {
                    let new_dist = self[i][k].distance() + self[k][j].distance();
                    if new_dist < self[i][j].distance() {
                        self[i][j].distance = new_dist;
                        let mut ij = mem::take(&mut self[i][j].path);
                        ij.clear();
                        ij.extend_from_slice(self[i][k].path());
                        ij.extend_from_slice(self[k][j].path());
                        self[i][j].path = ij;
                        debug_assert!(self[i][j].path.ends_with(&[j]));
                    }
                }
            }
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn index_range(&self, index: usize) -> Range<usize> {
        let start = index * self.dimension;
        start..start + self.dimension
    }
}

/// This allows for neat two-dimensional indexing (e.g. `spm[a][b]`).
impl Index<usize> for ShortestPathMatrix {
    type Output = [ShortestPath];

    fn index(&self, index: usize) -> &Self::Output {
        &self.paths[self.index_range(index)]
    }
}

/// This allows for neat two-dimensional indexing (e.g. `spm[a][b] = c`).
impl IndexMut<usize> for ShortestPathMatrix {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let range = self.index_range(index);
        &mut self.paths[range]
    }
}
