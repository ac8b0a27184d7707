use crate::util::NaturalOrInfinite;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

pub type NodeIndex = usize;
pub type EdgeWeight = u32;

/// Undirected edge-weighted graph with a distinguished set of terminal nodes.
///
/// Stored as an adjacency vector; the terminal list is kept sorted and
/// deduplicated, with an additional boolean array for O(1) membership tests.
#[derive(Eq, PartialEq, Clone, Debug)]
pub struct Graph {
    adjacency: Vec<Vec<(NodeIndex, EdgeWeight)>>,
    terminals: Vec<NodeIndex>,
    terminal_flags: Vec<bool>,
}

impl Graph {
    /// Build a graph from an edge list and a terminal list.
    ///
    /// Duplicate edges and terminals are ignored; self-loops are rejected.
    ///
    /// # Panics
    /// If an edge endpoint or terminal index is out of range or an edge is a
    /// self-loop.
    pub fn new(
        num_nodes: usize,
        edges: &[(NodeIndex, NodeIndex, EdgeWeight)],
        terminals: &[NodeIndex],
    ) -> Self {
        let mut adjacency = vec![vec![]; num_nodes];
        for &(from, to, weight) in edges {
            assert!(
                from < num_nodes && to < num_nodes,
                "edge endpoint out of range"
            );
            assert_ne!(from, to, "self-loops are not allowed");
            if !adjacency[from].iter().any(|&(v, _)| v == to) {
                adjacency[from].push((to, weight));
                adjacency[to].push((from, weight));
            }
        }
        for list in &mut adjacency {
            list.sort_unstable_by_key(|&(v, _)| v);
        }
        let mut terminals = terminals.to_vec();
        terminals.sort_unstable();
        terminals.dedup();
        let mut terminal_flags = vec![false; num_nodes];
        for &t in &terminals {
            assert!(t < num_nodes, "terminal index out of range");
            terminal_flags[t] = true;
        }
        Graph {
            adjacency,
            terminals,
            terminal_flags,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    /// Iterator over the node indices.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        0..self.num_nodes()
    }

    /// Return an iterator over all edges. Only edges `(a, b)` with `a < b` are
    /// returned since this is an undirected graph.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, EdgeWeight)> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(from, list)| list.iter().map(move |&(to, weight)| (from, to, weight)))
            .filter(|&(from, to, _)| from < to)
    }

    pub fn neighbors(
        &self,
        node: NodeIndex,
    ) -> impl Iterator<Item = (NodeIndex, EdgeWeight)> + '_ {
        self.adjacency[node].iter().copied()
    }

    /// Sorted, duplicate-free list of terminal nodes.
    pub fn terminals(&self) -> &[NodeIndex] {
        &self.terminals
    }

    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    pub fn is_terminal(&self, node: NodeIndex) -> bool {
        self.terminal_flags[node]
    }

    pub fn weight(&self, from: NodeIndex, to: NodeIndex) -> NaturalOrInfinite {
        self.adjacency[from]
            .iter()
            .find(|&&(v, _)| v == to)
            .map(|&(_, w)| NaturalOrInfinite::from(w))
            .unwrap_or_else(NaturalOrInfinite::infinity)
    }

    /// Whether all terminals lie in one connected component.
    /// Non-terminal nodes unreachable from the terminals are irrelevant.
    pub fn terminals_connected(&self) -> bool {
        let Some(&start) = self.terminals.first() else {
            return true;
        };
        let mut seen = vec![false; self.num_nodes()];
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        while let Some(v) = queue.pop_front() {
            for (w, _) in self.neighbors(v) {
                if !seen[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
        self.terminals.iter().all(|&t| seen[t])
    }
}

impl FromStr for Graph {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_graph(s)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseError {
    line: usize,
    message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError {
            line,
            message: message.into(),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (line {})", self.message, self.line + 1)
    }
}

impl Error for ParseError {}

/// Cursor over the non-empty lines of a PACE-format file.
struct Lines<'a> {
    lines: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .map(|(n, l)| (n, l.trim()))
            .filter(|(_, l)| !l.is_empty())
            .collect();
        Lines { lines, pos: 0 }
    }

    fn next(&mut self) -> Result<(usize, &'a str), ParseError> {
        let item = self.lines.get(self.pos).copied().ok_or_else(|| {
            ParseError::new(
                self.lines.last().map_or(0, |&(n, _)| n),
                "unexpected end of input",
            )
        })?;
        self.pos += 1;
        Ok(item)
    }

    fn expect(&mut self, keyword: &str) -> Result<(), ParseError> {
        let (n, line) = self.next()?;
        let mut words = line.split_ascii_whitespace();
        if keyword
            .split_ascii_whitespace()
            .all(|k| words.next() == Some(k))
        {
            Ok(())
        } else {
            Err(ParseError::new(
                n,
                format!("expected '{keyword}' but got '{line}'"),
            ))
        }
    }

    /// Parse a line of the form `NAME v1 v2 ...` into its values.
    fn values<T: FromStr>(&mut self, keyword: &str, count: usize) -> Result<Vec<T>, ParseError> {
        let (n, line) = self.next()?;
        let mut words = line.split_ascii_whitespace();
        if words.next() != Some(keyword) {
            return Err(ParseError::new(
                n,
                format!("expected '{keyword}' but got '{line}'"),
            ));
        }
        let values = words
            .map(|w| w.parse::<T>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ParseError::new(n, format!("could not parse values of '{line}'")))?;
        if values.len() != count {
            return Err(ParseError::new(
                n,
                format!(
                    "expected {count} values after '{keyword}' but got {}",
                    values.len()
                ),
            ));
        }
        Ok(values)
    }
}

/// Convert a 1-based node index from the PACE format to the 0-based indexing
/// used internally.
fn to_internal(raw: usize, num_nodes: usize, line: usize) -> Result<NodeIndex, ParseError> {
    if raw == 0 || raw > num_nodes {
        Err(ParseError::new(
            line,
            format!("node index {raw} out of range 1..={num_nodes}"),
        ))
    } else {
        Ok(raw - 1)
    }
}

/// Parse a graph in the PACE `.gr` format.
/// Since we're dealing with an NP-hard problem the instances are not going to
/// be huge, so expecting the whole file in memory is acceptable.
pub fn parse_graph(text: &str) -> Result<Graph, ParseError> {
    let mut lines = Lines::new(text);
    lines.expect("SECTION Graph")?;
    let num_nodes = lines.values::<usize>("Nodes", 1)?[0];
    let num_edges = lines.values::<usize>("Edges", 1)?[0];
    let mut edges = Vec::with_capacity(num_edges);
    for _ in 0..num_edges {
        let line = lines.pos;
        let raw = lines.values::<usize>("E", 3)?;
        let from = to_internal(raw[0], num_nodes, line)?;
        let to = to_internal(raw[1], num_nodes, line)?;
        let weight = EdgeWeight::try_from(raw[2])
            .map_err(|_| ParseError::new(line, "edge weight out of range"))?;
        if from == to {
            return Err(ParseError::new(line, "self-loops are not allowed"));
        }
        edges.push((from, to, weight));
    }
    lines.expect("END")?;
    lines.expect("SECTION Terminals")?;
    let num_terminals = lines.values::<usize>("Terminals", 1)?[0];
    let mut terminals = Vec::with_capacity(num_terminals);
    for _ in 0..num_terminals {
        let line = lines.pos;
        let raw = lines.values::<usize>("T", 1)?[0];
        terminals.push(to_internal(raw, num_nodes, line)?);
    }
    lines.expect("END")?;
    lines.expect("EOF")?;
    Ok(Graph::new(num_nodes, &edges, &terminals))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::util::TestResult;

    /// ```text
    ///     1
    /// 0 ----- 1
    ///  \     /
    /// 3 \   / 2
    ///    \ /
    ///     2
    /// ```
    /// Terminals: `0, 2`
    pub(crate) fn small_test_graph() -> Graph {
        Graph::new(3, &[(0, 1, 1), (1, 2, 2), (2, 0, 3)], &[0, 2])
    }

    /// ```text
    ///    1
    ///  0----1
    ///  |  / |
    /// 7| /1 |2
    ///  |/   |
    ///  2----3
    ///    4
    /// ```
    /// Terminals: `0, 2`
    pub(crate) fn shortcut_test_graph() -> Graph {
        Graph::new(
            4,
            &[(1, 0, 1), (1, 3, 2), (1, 2, 1), (3, 2, 4), (0, 2, 7)],
            &[0, 2],
        )
    }

    /// From [Wikipedia](https://de.wikipedia.org/wiki/Steinerbaumproblem#/media/Datei:Steinerbaum_Beispiel_Graph.svg).
    pub(crate) fn steiner_example_wiki() -> Graph {
        Graph::new(
            12,
            &[
                (0, 1, 15),
                (1, 2, 30),
                (2, 3, 50),
                (3, 6, 30),
                (0, 4, 25),
                (1, 8, 50),
                (1, 5, 45),
                (2, 5, 40),
                (5, 7, 60),
                (6, 7, 20),
                (4, 8, 30),
                (8, 10, 15),
                (7, 9, 50),
                (10, 9, 40),
                (11, 10, 10),
            ],
            &[0, 6, 7, 8, 11],
        )
    }

    /// Complete graph on 4 nodes, unit weights, every node a terminal.
    pub(crate) fn k4_unit() -> Graph {
        Graph::new(
            4,
            &[
                (0, 1, 1),
                (0, 2, 1),
                (0, 3, 1),
                (1, 2, 1),
                (1, 3, 1),
                (2, 3, 1),
            ],
            &[0, 1, 2, 3],
        )
    }

    /// Non-terminal center 0 connected to five terminal leaves by unit edges.
    pub(crate) fn star5() -> Graph {
        Graph::new(
            6,
            &[(0, 1, 1), (0, 2, 1), (0, 3, 1), (0, 4, 1), (0, 5, 1)],
            &[1, 2, 3, 4, 5],
        )
    }

    #[test]
    fn test_parse_small_graph() -> TestResult {
        let graph: Graph = "SECTION Graph\n\
            Nodes 3\n\
            Edges 3\n\
            E 1 2 1\n\
            E 2 3 2\n\
            E 3 1 3\n\
            END\n\
            \n\
            SECTION Terminals\n\
            Terminals 2\n\
            T 1\n\
            T 3\n\
            END\n\
            \n\
            EOF\n"
            .parse()?;
        assert_eq!(graph, small_test_graph());
        Ok(())
    }

    #[test]
    fn test_parse_errors() {
        let missing = "SECTION Graph\nNodes 2\nEdges 1\n".parse::<Graph>();
        assert!(missing.is_err());
        let bad_index = "SECTION Graph\nNodes 2\nEdges 1\nE 1 3 1\nEND\n\
            SECTION Terminals\nTerminals 1\nT 1\nEND\nEOF\n"
            .parse::<Graph>();
        assert!(bad_index.is_err());
    }

    #[test]
    fn test_edges() {
        let mut edges = shortcut_test_graph().edges().collect::<Vec<_>>();
        edges.sort_by_key(|&(a, b, _)| [a, b]);
        assert_eq!(
            edges,
            vec![(0, 1, 1), (0, 2, 7), (1, 2, 1), (1, 3, 2), (2, 3, 4)]
        );
    }

    #[test]
    fn test_weight() {
        let graph = shortcut_test_graph();
        assert_eq!(graph.weight(0, 2), 7.into());
        assert_eq!(graph.weight(2, 0), 7.into());
        assert_eq!(graph.weight(3, 0), NaturalOrInfinite::infinity());
    }

    #[test]
    fn test_terminals_sorted_unique() {
        let graph = Graph::new(3, &[(0, 1, 1), (1, 2, 1)], &[2, 0, 2]);
        assert_eq!(graph.terminals(), &[0, 2]);
        assert!(graph.is_terminal(0));
        assert!(!graph.is_terminal(1));
    }

    #[test]
    fn test_terminals_connected() {
        assert!(small_test_graph().terminals_connected());
        let split = Graph::new(4, &[(0, 1, 1), (2, 3, 1)], &[0, 3]);
        assert!(!split.terminals_connected());
        let isolated_steiner = Graph::new(4, &[(0, 1, 1)], &[0, 1]);
        assert!(isolated_steiner.terminals_connected());
    }
}
