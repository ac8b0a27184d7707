//! End-to-end scenarios for the approximation pipeline.

use goemans_steiner::{
    goemans_steiner_approximation, goemans_steiner_approximation_with,
    takahashi_matsuyama_steiner_approximation, EdgeTree, Graph, SteinerTreeOptions,
};

fn valid_steiner_tree(tree: &EdgeTree, graph: &Graph) -> bool {
    tree.is_tree() && graph.terminals().iter().all(|&t| tree.contains_node(t))
}

/// Complete graph on 4 nodes, unit weights, every node a terminal.
fn k4_unit() -> Graph {
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

/// Non-terminal center connected to five terminal leaves by unit edges.
fn star5() -> Graph {
    Graph::new(
        6,
        &[(0, 1, 1), (0, 2, 1), (0, 3, 1), (0, 4, 1), (0, 5, 1)],
        &[1, 2, 3, 4, 5],
    )
}

/// The example instance from the German Wikipedia article on the Steiner
/// tree problem; the optimum routes 0-4-8-10-11 and 10-9-7-6 for weight 190.
fn steiner_example_wiki() -> Graph {
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

#[test]
fn k4_spanning_tree_weight() {
    let graph = k4_unit();
    let result = goemans_steiner_approximation(&graph).unwrap();
    assert!(valid_steiner_tree(&result.tree, &graph));
    assert_eq!(result.cost, 3.into());
    assert_eq!(result.tree.weight_in(&graph), 3.into());
}

#[test]
fn star_weight_is_independent_of_seed() {
    let graph = star5();
    for seed in [0u64, 7, 123, 1337, 99999] {
        let options = SteinerTreeOptions {
            seed,
            ..SteinerTreeOptions::default()
        };
        let result = goemans_steiner_approximation_with(&graph, &options).unwrap();
        assert!(valid_steiner_tree(&result.tree, &graph), "seed {seed}");
        assert_eq!(result.cost, 5.into(), "seed {seed}");
    }
}

#[test]
fn wiki_instance_with_upper_bound() {
    let graph = steiner_example_wiki();
    let baseline = takahashi_matsuyama_steiner_approximation(&graph);
    assert_eq!(baseline.weight_in(&graph), 190.into());
    let options = SteinerTreeOptions {
        use_2approx: true,
        ..SteinerTreeOptions::default()
    };
    let result = goemans_steiner_approximation_with(&graph, &options).unwrap();
    assert!(valid_steiner_tree(&result.tree, &graph));
    assert!(result.cost <= 190.into());
    assert_eq!(result.cost, result.tree.weight_in(&graph));
}

#[test]
fn same_seed_reproduces_identical_tree() {
    let graph = steiner_example_wiki();
    let options = SteinerTreeOptions {
        seed: 2024,
        ..SteinerTreeOptions::default()
    };
    let first = goemans_steiner_approximation_with(&graph, &options).unwrap();
    let second = goemans_steiner_approximation_with(&graph, &options).unwrap();
    assert_eq!(first.cost, second.cost);
    assert_eq!(first.tree, second.tree);
}

#[test]
fn option_variations_all_yield_valid_trees() {
    let graph = steiner_example_wiki();
    let variations = [
        SteinerTreeOptions {
            max_component_size: 2,
            ..SteinerTreeOptions::default()
        },
        SteinerTreeOptions {
            max_component_size: 4,
            ..SteinerTreeOptions::default()
        },
        SteinerTreeOptions {
            preprocessing: false,
            ..SteinerTreeOptions::default()
        },
        SteinerTreeOptions {
            separate_cycles: true,
            ..SteinerTreeOptions::default()
        },
        SteinerTreeOptions {
            use_2approx: true,
            separate_cycles: true,
            ..SteinerTreeOptions::default()
        },
    ];
    for (i, options) in variations.iter().enumerate() {
        let result = goemans_steiner_approximation_with(&graph, options).unwrap();
        assert!(valid_steiner_tree(&result.tree, &graph), "variation {i}");
        assert_eq!(result.cost, result.tree.weight_in(&graph), "variation {i}");
    }
}

#[test]
fn parse_and_solve_pace_instance() {
    let input = "SECTION Graph\n\
        Nodes 6\n\
        Edges 5\n\
        E 1 2 1\n\
        E 1 3 1\n\
        E 1 4 1\n\
        E 1 5 1\n\
        E 1 6 1\n\
        END\n\
        \n\
        SECTION Terminals\n\
        Terminals 5\n\
        T 2\n\
        T 3\n\
        T 4\n\
        T 5\n\
        T 6\n\
        END\n\
        \n\
        EOF\n";
    let graph: Graph = input.parse().unwrap();
    let result = goemans_steiner_approximation(&graph).unwrap();
    assert!(valid_steiner_tree(&result.tree, &graph));
    assert_eq!(result.cost, 5.into());
}
