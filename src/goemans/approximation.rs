//! The rounding loop: repeatedly pick a blowup component whose scaled cost is
//! covered by the weight of a maximum basis, commit the underlying full
//! component (marking its nodes as new terminals), deduct the basis and
//! contract the committed terminals, until a single terminal class remains.

use crate::components::store::FullComponentStore;
use crate::goemans::blowup::{BlowupComponent, BlowupGraph};
use crate::Graph;
use log::{debug, warn};
use rand::Rng;

/// Round the fractional selection in `store` into committed components.
///
/// Every node of a committed component is flagged in `is_new_terminal`; the
/// caller assembles the final tree over the flagged set afterwards. The store
/// itself is not modified. Termination: every iteration either merges at
/// least two terminal classes or exits, so at most `num_terminals` rounds
/// run (a generous guard is kept nonetheless).
pub fn solve<R: Rng>(
    graph: &Graph,
    store: &FullComponentStore,
    epsilon: f64,
    rng: &mut R,
    is_new_terminal: &mut [bool],
) {
    let mut blowup = BlowupGraph::new(graph, store, rng);
    let max_iterations = graph.num_terminals() + store.len() + 1;
    let mut iterations = 0;
    while blowup.num_terminal_classes() > 1 {
        iterations += 1;
        if iterations > max_iterations {
            warn!("rounding did not converge within {max_iterations} iterations");
            break;
        }
        let components = blowup.components();
        if components.is_empty() {
            // the remaining fractional support does not link the leftover
            // classes; the final assembly bridges them via shortest paths
            debug!(
                "rounding stalled with {} terminal classes left",
                blowup.num_terminal_classes()
            );
            break;
        }
        let (chosen, basis) = if blowup.get_y() > 0 {
            find_component_and_max_basis(&mut blowup, &components, epsilon)
        } else {
            find_cheapest_component_and_remaining_basis(&blowup, &components)
        };
        debug!(
            "committing component {} (cost {}, {} classes)",
            chosen.component,
            chosen.cost,
            chosen.classes.len()
        );
        for node in store.get(chosen.component).nodes() {
            is_new_terminal[node] = true;
        }
        blowup.remove_basis(&basis);
        blowup.contract(&chosen.classes);
        blowup.cleanup();
    }
    debug!("rounding finished after {iterations} iterations");
}

type Choice = (BlowupComponent, Vec<(usize, u64)>);

/// Scan the components in order and take the first whose scaled cost is at
/// most the weight of a maximum basis of its restricted gammoid. The LP
/// optimality of the fractional weights guarantees such a component exists;
/// should numerical tolerances break that, the best-scoring component is
/// taken instead of aborting, since only the cost bound is at stake.
fn find_component_and_max_basis(
    blowup: &mut BlowupGraph,
    components: &[BlowupComponent],
    epsilon: f64,
) -> Choice {
    let mut best: Option<(f64, Choice)> = None;
    for component in components {
        let (rank, weight, basis) = blowup.max_weight_basis(component);
        if rank == 0 {
            continue;
        }
        let scaled_cost = component.cost as i64 * blowup.scale() as i64;
        if scaled_cost as f64 <= weight as f64 + epsilon {
            return (component.clone(), basis);
        }
        let score = weight as f64 - scaled_cost as f64;
        if best.as_ref().map_or(true, |(s, _)| score > *s) {
            best = Some((score, (component.clone(), basis)));
        }
    }
    if let Some((score, choice)) = best {
        warn!("no component satisfies the basis inequality (best margin {score:.3}); taking the best one");
        return choice;
    }
    // cleanup never leaves an exhausted core behind, so every candidate can
    // route at least one unit through its own classes
    unreachable!("a rounding candidate produced an empty basis")
}

/// Terminal phase (no slack left): take the most expensive component and use
/// every remaining core at full capacity as the basis.
fn find_cheapest_component_and_remaining_basis(
    blowup: &BlowupGraph,
    components: &[BlowupComponent],
) -> Choice {
    let chosen = components
        .iter()
        .max_by_key(|c| c.cost)
        .expect("caller checked non-emptiness")
        .clone();
    let basis = blowup.remaining_basis();
    (chosen, basis)
}
