//! Flow oracles for the gammoid computations of the rounding procedure:
//! max-flow (rank of a restricted gammoid) and min-cost flow (maximum-weight
//! basis). The networks involved are tiny, so a straightforward
//! augmenting-path implementation over paired residual arcs is used.

use log::trace;
use std::collections::VecDeque;

pub type ArcId = usize;

#[derive(Clone, Debug)]
struct Arc {
    to: usize,
    /// Remaining residual capacity.
    capacity: i64,
    cost: i64,
}

/// A directed flow network with per-arc capacities and costs.
///
/// Arcs are stored in pairs: arc `2i` is the forward arc, arc `2i ^ 1` its
/// residual reverse. The flow on a forward arc equals the capacity
/// accumulated on its reverse arc.
#[derive(Clone, Debug)]
pub struct FlowNetwork {
    num_nodes: usize,
    arcs: Vec<Arc>,
    adjacency: Vec<Vec<ArcId>>,
}

impl FlowNetwork {
    pub fn new(num_nodes: usize) -> Self {
        FlowNetwork {
            num_nodes,
            arcs: Vec::new(),
            adjacency: vec![Vec::new(); num_nodes],
        }
    }

    /// Add an arc, returning its id. The reverse residual arc is created
    /// automatically with zero capacity and negated cost.
    pub fn add_arc(&mut self, from: usize, to: usize, capacity: i64, cost: i64) -> ArcId {
        debug_assert!(from < self.num_nodes && to < self.num_nodes);
        debug_assert!(capacity >= 0);
        let id = self.arcs.len();
        self.arcs.push(Arc { to, capacity, cost });
        self.arcs.push(Arc {
            to: from,
            capacity: 0,
            cost: -cost,
        });
        self.adjacency[from].push(id);
        self.adjacency[to].push(id + 1);
        id
    }

    /// Current flow on a forward arc.
    pub fn flow(&self, arc: ArcId) -> i64 {
        debug_assert_eq!(arc % 2, 0);
        self.arcs[arc ^ 1].capacity
    }

    /// Edmonds-Karp: repeatedly augment along a BFS-shortest residual path.
    /// Returns the max-flow value. Costs are ignored.
    pub fn max_flow(&mut self, source: usize, sink: usize) -> i64 {
        let mut total = 0;
        while let Some(parent) = self.bfs_path(source, sink) {
            let mut bottleneck = i64::MAX;
            let mut v = sink;
            while v != source {
                let arc = parent[v].unwrap();
                bottleneck = bottleneck.min(self.arcs[arc].capacity);
                v = self.arcs[arc ^ 1].to;
            }
            self.apply(&parent, source, sink, bottleneck);
            total += bottleneck;
        }
        trace!("max flow {source} -> {sink}: {total}");
        total
    }

    /// Successive shortest paths: send exactly `amount` units from `source`
    /// to `sink` at minimum total cost. Returns the cost, or `None` if the
    /// network cannot carry that amount. Negative arc costs are supported as
    /// long as the *original* network is acyclic, which holds for all
    /// gammoid instances built by the rounding procedure.
    pub fn min_cost_flow(&mut self, source: usize, sink: usize, amount: i64) -> Option<i64> {
        let mut remaining = amount;
        let mut total_cost = 0;
        while remaining > 0 {
            let parent = self.cheapest_path(source, sink)?;
            let mut bottleneck = remaining;
            let mut v = sink;
            while v != source {
                let arc = parent[v].unwrap();
                bottleneck = bottleneck.min(self.arcs[arc].capacity);
                v = self.arcs[arc ^ 1].to;
            }
            let mut v = sink;
            while v != source {
                let arc = parent[v].unwrap();
                total_cost += self.arcs[arc].cost * bottleneck;
                v = self.arcs[arc ^ 1].to;
            }
            self.apply(&parent, source, sink, bottleneck);
            remaining -= bottleneck;
        }
        trace!("min cost flow {source} -> {sink}, amount {amount}: cost {total_cost}");
        Some(total_cost)
    }

    /// Self-check: all residual capacities non-negative and flow conserved at
    /// every node except `source` and `sink`.
    pub fn check_flow(&self, source: usize, sink: usize) -> bool {
        if self.arcs.iter().any(|a| a.capacity < 0) {
            return false;
        }
        let mut balance = vec![0i64; self.num_nodes];
        for (id, arc) in self.arcs.iter().enumerate().step_by(2) {
            let from = self.arcs[id ^ 1].to;
            let flow = self.flow(id);
            balance[from] -= flow;
            balance[arc.to] += flow;
        }
        (0..self.num_nodes).all(|v| v == source || v == sink || balance[v] == 0)
    }

    fn bfs_path(&self, source: usize, sink: usize) -> Option<Vec<Option<ArcId>>> {
        let mut parent: Vec<Option<ArcId>> = vec![None; self.num_nodes];
        let mut seen = vec![false; self.num_nodes];
        seen[source] = true;
        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            for &arc in &self.adjacency[v] {
                let to = self.arcs[arc].to;
                if self.arcs[arc].capacity > 0 && !seen[to] {
                    seen[to] = true;
                    parent[to] = Some(arc);
                    if to == sink {
                        return Some(parent);
                    }
                    queue.push_back(to);
                }
            }
        }
        None
    }

    /// Bellman-Ford over the residual network (handles the negative-cost
    /// source arcs).
    fn cheapest_path(&self, source: usize, sink: usize) -> Option<Vec<Option<ArcId>>> {
        let mut dist = vec![i64::MAX; self.num_nodes];
        let mut parent: Vec<Option<ArcId>> = vec![None; self.num_nodes];
        dist[source] = 0;
        for _ in 0..self.num_nodes {
            let mut changed = false;
            for v in 0..self.num_nodes {
                if dist[v] == i64::MAX {
                    continue;
                }
                for &arc in &self.adjacency[v] {
                    let to = self.arcs[arc].to;
                    if self.arcs[arc].capacity > 0 && dist[v] + self.arcs[arc].cost < dist[to] {
                        dist[to] = dist[v] + self.arcs[arc].cost;
                        parent[to] = Some(arc);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        if dist[sink] == i64::MAX {
            None
        } else {
            Some(parent)
        }
    }

    fn apply(&mut self, parent: &[Option<ArcId>], source: usize, sink: usize, amount: i64) {
        let mut v = sink;
        while v != source {
            let arc = parent[v].unwrap();
            self.arcs[arc].capacity -= amount;
            self.arcs[arc ^ 1].capacity += amount;
            v = self.arcs[arc ^ 1].to;
        }
    }
}
