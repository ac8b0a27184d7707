//! A (1.39+ε)-approximation pipeline for the Steiner tree problem after
//! Goemans, Olver, Rothvoß and Zenklusen: full components are enumerated with
//! Dreyfus-Wagner dynamic programming, selected fractionally by an LP
//! relaxation, and rounded into an integral tree via iterative
//! maximum-weight-basis extraction over a blowup of the fractional solution.

mod components;
mod error;
mod flow;
mod goemans;
mod graph;
mod heuristics;
mod lp;
mod shortest_paths;
mod solver;
mod tree;
mod util;

pub use error::SteinerTreeError;
pub use graph::{parse_graph, EdgeWeight, Graph, NodeIndex, ParseError};
pub use heuristics::takahashi_matsuyama_steiner_approximation;
pub use solver::{
    goemans_steiner_approximation, goemans_steiner_approximation_with, SteinerTreeOptions,
    SteinerTreeResult,
};
pub use tree::EdgeTree;
pub use util::NaturalOrInfinite;
