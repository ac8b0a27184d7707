//! Orchestration of the approximation pipeline: distance matrices, component
//! enumeration, LP relaxation, preprocessing, rounding, final assembly, and
//! reconciliation against the 2-approximation upper bound.

use crate::components::dreyfus_wagner::{
    find_full_2_components, find_full_3_components, FullComponentGeneratorDreyfusWagner,
};
use crate::components::store::FullComponentStore;
use crate::error::SteinerTreeError;
use crate::goemans::approximation;
use crate::heuristics::{obtain_final_steiner_tree, takahashi_matsuyama_steiner_approximation};
use crate::lp::{solve_component_lp, LpOptions};
use crate::shortest_paths::ShortestPathMatrix;
use crate::tree::EdgeTree;
use crate::util::NaturalOrInfinite;
use crate::Graph;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Clone, Debug)]
pub struct SteinerTreeOptions {
    /// Maximum number of terminals a full component may span, clamped to the
    /// number of terminals. Larger values improve the approximation ratio at
    /// steep enumeration cost.
    pub max_component_size: usize,
    /// Seed for all randomization (core shuffling in the rounding phase).
    pub seed: u64,
    /// Compute a Takahashi-Matsuyama tree first, pass its weight to the LP
    /// as an upper bound, and return it whenever it beats the rounded tree.
    pub use_2approx: bool,
    /// Commit components shielded from the rest of the selection before
    /// rounding.
    pub preprocessing: bool,
    /// Strengthen the LP with pairwise cycle-separation rows.
    pub separate_cycles: bool,
    /// Numerical tolerance for LP weights and basis comparisons.
    pub epsilon: f64,
}

impl Default for SteinerTreeOptions {
    fn default() -> Self {
        SteinerTreeOptions {
            max_component_size: 3,
            seed: 1337,
            use_2approx: false,
            preprocessing: true,
            separate_cycles: false,
            epsilon: 1e-6,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SteinerTreeResult {
    pub cost: NaturalOrInfinite,
    pub tree: EdgeTree,
}

/// Run the pipeline with default options.
pub fn goemans_steiner_approximation(graph: &Graph) -> Result<SteinerTreeResult, SteinerTreeError> {
    goemans_steiner_approximation_with(graph, &SteinerTreeOptions::default())
}

pub fn goemans_steiner_approximation_with(
    graph: &Graph,
    options: &SteinerTreeOptions,
) -> Result<SteinerTreeResult, SteinerTreeError> {
    if graph.num_terminals() == 0 {
        return Err(SteinerTreeError::NoTerminals);
    }
    if !graph.terminals_connected() {
        return Err(SteinerTreeError::Disconnected);
    }
    if graph.num_terminals() == 1 {
        return Ok(SteinerTreeResult {
            cost: 0u32.into(),
            tree: EdgeTree::empty(),
        });
    }

    let upper_bound_tree = options
        .use_2approx
        .then(|| takahashi_matsuyama_steiner_approximation(graph));

    let restricted = options.max_component_size.clamp(2, graph.num_terminals());
    let avoiding = ShortestPathMatrix::terminal_avoiding(graph);
    let mut store = FullComponentStore::new();
    if restricted >= 4 {
        let mut generator = FullComponentGeneratorDreyfusWagner::new(graph, &avoiding);
        generator.generate(restricted);
        for component in generator.find_full_components(restricted) {
            store.insert(component);
        }
    } else {
        for component in find_full_2_components(graph, &avoiding) {
            store.insert(component);
        }
        if restricted == 3 {
            for component in find_full_3_components(graph, &avoiding) {
                store.insert(component);
            }
        }
    }
    info!(
        "{} full components of up to {restricted} terminals",
        store.len()
    );

    let lp_options = LpOptions {
        separate_cycles: options.separate_cycles,
        upper_bound: upper_bound_tree
            .as_ref()
            .map(|t| t.weight_in(graph).finite_value() as f64 + options.epsilon),
        epsilon: options.epsilon,
    };
    if !solve_component_lp(graph, &mut store, &lp_options) {
        // relaxation infeasible (or bounded away by the upper bound): fall
        // back to the 2-approximation if one was computed
        return match upper_bound_tree {
            Some(tree) => {
                info!("falling back to the 2-approximation");
                let cost = tree.weight_in(graph);
                Ok(SteinerTreeResult { cost, tree })
            }
            None => Err(SteinerTreeError::LpInfeasible),
        };
    }
    store.remove_inactive(options.epsilon);
    debug!("{} components active after the LP", store.len());

    let mut is_new_terminal = vec![false; graph.num_nodes()];
    for &t in graph.terminals() {
        is_new_terminal[t] = true;
    }

    if options.preprocessing {
        preprocess(&mut store, &mut is_new_terminal);
    }

    if !store.is_empty() {
        let mut rng = StdRng::seed_from_u64(options.seed);
        approximation::solve(graph, &store, options.epsilon, &mut rng, &mut is_new_terminal);
    }

    let apsp = ShortestPathMatrix::new(graph);
    let tree = obtain_final_steiner_tree(graph, &is_new_terminal, &apsp);
    let cost = tree.weight_in(graph);
    info!("rounded tree weight {cost:?}");

    Ok(match upper_bound_tree {
        Some(fallback) if fallback.weight_in(graph) < cost => {
            info!("2-approximation beats the rounded tree, returning it instead");
            let cost = fallback.weight_in(graph);
            SteinerTreeResult {
                cost,
                tree: fallback,
            }
        }
        _ => SteinerTreeResult { cost, tree },
    })
}

/// Number of the component's terminals that also occur in another component.
fn shared_terminal_count(store: &FullComponentStore, id: usize) -> usize {
    store
        .get(id)
        .terminals()
        .iter()
        .filter(|&&t| {
            store
                .iter()
                .enumerate()
                .any(|(other, c)| other != id && c.terminals().binary_search(&t).is_ok())
        })
        .count()
}

/// Commit components that at most one other component competes with: if no
/// more than one of a component's terminals is shared, the component can be
/// taken integrally without loss. Committing one component can shield the
/// next, so this iterates to a fixpoint.
pub(crate) fn preprocess(store: &mut FullComponentStore, is_new_terminal: &mut [bool]) {
    let mut committed = 0;
    while let Some(id) = (0..store.len()).find(|&id| shared_terminal_count(store, id) <= 1) {
        let component = store.remove(id);
        debug!(
            "preprocessing commits the component spanning {:?}",
            component.terminals()
        );
        for node in component.nodes() {
            is_new_terminal[node] = true;
        }
        committed += 1;
    }
    if committed > 0 {
        debug!("preprocessing committed {committed} components, {} remain", store.len());
    }
}
