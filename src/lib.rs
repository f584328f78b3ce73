//! Modeling front-end for well-mixed stochastic chemical kinetics.
//!
//! Build a [`Model`] out of species, parameters and reactions, exchange it
//! with StochKit-compatible solvers as StochML via [`StochMLDocument`], and
//! shell out to such a solver through [`solver`].

pub mod document;
pub mod expression;
pub mod model;
pub mod parameter;
pub mod reaction;
pub mod solver;
pub mod species;

pub mod errors;

// Re-export the model-building surface for convenience
pub use document::StochMLDocument;
pub use model::{Model, Units};
pub use parameter::{Parameter, Resolution};
pub use reaction::{Reaction, ReactionKind};
pub use solver::{simulate, simulate_file, SimulationSettings};
pub use species::Species;
