//! Matroid-based rounding of the fractional component selection: a scaled
//! blowup of the fractional solution ([`blowup`]) and the iterative
//! basis-extraction loop over it ([`approximation`]).

pub mod approximation;
pub mod blowup;
