//! The blowup of a fractional component selection.
//!
//! All fractional weights are scaled by a common factor `N` so that every
//! component occurs an integral number of times ("cores"). Terminals live in
//! contractible equivalence classes; a core linking two or more classes is a
//! degree of freedom the rounding loop may still spend. Maximum-weight bases
//! of the induced gammoid are computed with flow over a small auxiliary
//! network (source, cores, classes, sink).

use crate::components::store::FullComponentStore;
use crate::flow::FlowNetwork;
use crate::graph::NodeIndex;
use crate::util::UnionFind;
use crate::Graph;
use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// One scaled occurrence bundle of a full component.
#[derive(Clone, Debug)]
struct Core {
    /// Id of the underlying component in the store (stable during rounding).
    component: usize,
    /// How many scaled occurrences are still available.
    capacity: u64,
    /// Integral cost of the underlying component.
    cost: u64,
    /// Positions of the component's terminals in the original terminal list.
    terminals: Vec<usize>,
}

/// A rounding candidate: a core that still links at least two terminal
/// classes, together with its current class set.
#[derive(Clone, Debug)]
pub struct BlowupComponent {
    pub core: usize,
    /// Store id of the underlying full component.
    pub component: usize,
    pub cost: u64,
    /// Distinct terminal-class representatives, sorted.
    pub classes: Vec<usize>,
}

pub struct BlowupGraph {
    scale: u64,
    cores: Vec<Core>,
    classes: UnionFind,
    num_terminals: usize,
}

/// Scale factor that turns the fractional weights into (approximately)
/// integral multiplicities: the least common multiple of the best small
/// rational approximation of every weight, capped to keep capacities sane.
fn lcm_scale<I: Iterator<Item = f64>>(extras: I) -> u64 {
    const MAX_DENOMINATOR: u64 = 100;
    const MAX_SCALE: u64 = 1 << 20;
    let mut scale = 1u64;
    for extra in extras {
        let mut best = (f64::INFINITY, 1u64);
        for denominator in 1..=MAX_DENOMINATOR {
            let scaled = extra * denominator as f64;
            let error = (scaled - scaled.round()).abs();
            if error + 1e-12 < best.0 {
                best = (error, denominator);
                if error < 1e-9 {
                    break;
                }
            }
        }
        let candidate = scale / gcd(scale, best.1) * best.1;
        if candidate <= MAX_SCALE {
            scale = candidate;
        }
    }
    scale
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl BlowupGraph {
    /// Build the blowup of all components currently in the store. The core
    /// order is shuffled with the injected generator; the rounding loop
    /// prefers earlier cores among equally good candidates, and a fixed
    /// order could be degenerate on symmetric instances.
    pub fn new<R: Rng>(graph: &Graph, store: &FullComponentStore, rng: &mut R) -> Self {
        let scale = lcm_scale(store.iter().map(|c| c.extra()));
        let terminal_position: HashMap<NodeIndex, usize> = graph
            .terminals()
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, i))
            .collect();
        let mut cores: Vec<Core> = store
            .iter()
            .enumerate()
            .map(|(component, c)| Core {
                component,
                capacity: ((c.extra() * scale as f64).round() as u64).max(1),
                cost: c.cost().finite_value(),
                terminals: c
                    .terminals()
                    .iter()
                    .map(|t| terminal_position[t])
                    .collect(),
            })
            .collect();
        cores.shuffle(rng);
        debug!(
            "blowup graph: scale {scale}, {} cores over {} terminals",
            cores.len(),
            graph.num_terminals()
        );
        BlowupGraph {
            scale,
            cores,
            classes: UnionFind::new(graph.num_terminals()),
            num_terminals: graph.num_terminals(),
        }
    }

    pub fn scale(&self) -> u64 {
        self.scale
    }

    pub fn num_cores(&self) -> usize {
        self.cores.len()
    }

    /// Distinct terminal classes remaining; the rounding loop runs until
    /// this reaches one (or no core links two classes anymore).
    pub fn num_terminal_classes(&mut self) -> usize {
        let mut roots: Vec<usize> = (0..self.num_terminals)
            .map(|t| self.classes.find(t))
            .collect();
        roots.sort_unstable();
        roots.dedup();
        roots.len()
    }

    fn core_classes(&mut self, core: usize) -> Vec<usize> {
        let mut roots: Vec<usize> = self.cores[core]
            .terminals
            .clone()
            .into_iter()
            .map(|t| self.classes.find(t))
            .collect();
        roots.sort_unstable();
        roots.dedup();
        roots
    }

    /// The rounding candidates: every core still spanning at least two
    /// terminal classes, in core order.
    pub fn components(&mut self) -> Vec<BlowupComponent> {
        (0..self.cores.len())
            .filter_map(|core| {
                let classes = self.core_classes(core);
                (classes.len() >= 2).then(|| BlowupComponent {
                    core,
                    component: self.cores[core].component,
                    cost: self.cores[core].cost,
                    classes,
                })
            })
            .collect()
    }

    /// Slack between the connectivity the remaining cores could still
    /// provide and what is needed to merge the remaining classes. Positive
    /// slack means basis extraction still has freedom; at zero the terminal
    /// phase takes over.
    pub fn get_y(&mut self) -> i64 {
        let remaining_classes = self.num_terminal_classes() as i64;
        let supply: i64 = (0..self.cores.len())
            .map(|core| {
                let classes = self.core_classes(core).len() as i64;
                self.cores[core].capacity as i64 * (classes - 1)
            })
            .sum();
        supply - self.scale as i64 * (remaining_classes - 1)
    }

    /// Rank and maximum-weight basis of the gammoid restricted to the given
    /// component's classes: a flow network with one node per core and per
    /// class, arcs source -> core (capacity, cost -core cost), core -> each
    /// of its classes, and the component's classes -> sink (capacity `N`).
    /// Rank is the max-flow value; the basis is the support of a min-cost
    /// flow of `rank` units (costs are negated, so it maximizes weight).
    ///
    /// Returns `(rank, basis weight, per-core counts)`.
    pub fn max_weight_basis(&mut self, component: &BlowupComponent) -> (i64, i64, Vec<(usize, u64)>) {
        let mut class_nodes: HashMap<usize, usize> = HashMap::new();
        let mut core_class_lists = Vec::with_capacity(self.cores.len());
        for core in 0..self.cores.len() {
            let classes = self.core_classes(core);
            for &class in &classes {
                let next = 2 + self.cores.len() + class_nodes.len();
                class_nodes.entry(class).or_insert(next);
            }
            core_class_lists.push(classes);
        }
        let (source, sink) = (0, 1);
        let mut network = FlowNetwork::new(2 + self.cores.len() + class_nodes.len());
        let mut core_arcs = Vec::with_capacity(self.cores.len());
        for (core, classes) in core_class_lists.iter().enumerate() {
            let core_node = 2 + core;
            let capacity = self.cores[core].capacity as i64;
            core_arcs.push(network.add_arc(
                source,
                core_node,
                capacity,
                -(self.cores[core].cost as i64),
            ));
            for &class in classes {
                network.add_arc(core_node, class_nodes[&class], capacity, 0);
            }
        }
        for &class in &component.classes {
            network.add_arc(class_nodes[&class], sink, self.scale as i64, 0);
        }

        let rank = network.clone().max_flow(source, sink);
        if rank == 0 {
            return (0, 0, Vec::new());
        }
        let cost = network
            .min_cost_flow(source, sink, rank)
            .expect("max-flow certified that `rank` units are routable");
        debug_assert!(network.check_flow(source, sink));
        let basis: Vec<(usize, u64)> = core_arcs
            .iter()
            .enumerate()
            .filter_map(|(core, &arc)| {
                let count = network.flow(arc);
                (count > 0).then_some((core, count as u64))
            })
            .collect();
        trace!(
            "basis for core {}: rank {rank}, weight {}",
            component.core,
            -cost
        );
        (rank, -cost, basis)
    }

    /// Every remaining core at its full capacity; the basis of the terminal
    /// phase, where no flow computation is needed.
    pub fn remaining_basis(&self) -> Vec<(usize, u64)> {
        self.cores
            .iter()
            .enumerate()
            .map(|(core, c)| (core, c.capacity))
            .collect()
    }

    /// Merge all given classes into one.
    pub fn contract(&mut self, classes: &[usize]) {
        for window in classes.windows(2) {
            self.classes.union(window[0], window[1]);
        }
    }

    /// Deduct the basis from the core capacities. Exhausted cores are
    /// deleted outright; partially used cores keep their remaining fraction.
    /// Full removals are applied before fractional deductions, fractional
    /// ones in descending count order.
    pub fn remove_basis(&mut self, basis: &[(usize, u64)]) {
        let mut full: Vec<usize> = Vec::new();
        let mut fractional: Vec<(usize, u64)> = Vec::new();
        for &(core, count) in basis {
            debug_assert!(count <= self.cores[core].capacity);
            if count == self.cores[core].capacity {
                full.push(core);
            } else {
                fractional.push((core, count));
            }
        }
        fractional.sort_unstable_by(|a, b| b.1.cmp(&a.1));
        for (core, count) in fractional {
            self.cores[core].capacity -= count;
        }
        full.sort_unstable();
        for core in full.into_iter().rev() {
            self.cores.remove(core);
        }
    }

    /// Drop cores that can no longer contribute: zero capacity or fewer than
    /// two distinct terminal classes (all their terminals already merged).
    pub fn cleanup(&mut self) {
        for core in (0..self.cores.len()).rev() {
            if self.cores[core].capacity == 0 || self.core_classes(core).len() < 2 {
                self.cores.remove(core);
            }
        }
    }
}
