//! Full components (trees spanning a terminal subset with terminals as
//! leaves) and their enumeration.

pub mod dreyfus_wagner;
pub mod store;
