//! Error types for model construction, registration, resolution, StochML
//! parsing and solver invocation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised when constructing or mutating a `Species`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpeciesError {
    #[error("species '{name}': initial value must be non-negative, got {value}")]
    NegativeInitialValue { name: String, value: f64 },
}

/// Errors raised when constructing or resolving a `Parameter`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("parameter '{0}' has no expression")]
    MissingExpression(String),
    #[error("could not resolve parameter '{name}' to a scalar value: {reason}")]
    Unresolved { name: String, reason: String },
}

/// Errors raised when constructing or mutating a `Reaction`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReactionError {
    /// Mass-action propensities are only meaningful up to second order.
    #[error("reaction '{name}': mass-action kinetics cover at most second-order reactions, got total reactant stoichiometry {total}")]
    OrderTooHigh { name: String, total: u64 },
    #[error("reaction '{reaction}': stoichiometry for species '{species}' must be a positive integer")]
    ZeroStoichiometry { reaction: String, species: String },
    #[error("customized reaction '{0}' has no propensity function")]
    MissingPropensity(String),
}

/// Errors raised by `Model` registration and lookup operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("a species named '{0}' already exists in the model")]
    DuplicateSpecies(String),
    #[error("a parameter named '{0}' already exists in the model")]
    DuplicateParameter(String),
    #[error("a reaction named '{0}' already exists in the model")]
    DuplicateReaction(String),
    #[error("no species named '{0}'")]
    UnknownSpecies(String),
    #[error("no parameter named '{0}'")]
    UnknownParameter(String),
    #[error("no reaction named '{0}'")]
    UnknownReaction(String),
    #[error("reaction '{reaction}' references species '{species}' which is not in the model")]
    UnregisteredSpecies { reaction: String, species: String },
    #[error("mass-action reaction '{reaction}' uses rate parameter '{parameter}' which is not in the model")]
    UnregisteredRateParameter { reaction: String, parameter: String },
    #[error(transparent)]
    Species(#[from] SpeciesError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Reaction(#[from] ReactionError),
}

/// Convenience type for `Result<T, ModelError>`.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while writing or reading a StochML document.
#[derive(Error, Debug)]
pub enum StochMLError {
    #[error("invalid StochML: {0}")]
    Parse(#[from] roxmltree::Error),
    #[error("expected root element 'Model', found '{0}'")]
    UnexpectedRoot(String),
    #[error("document does not name the model and no name was supplied")]
    MissingModelName,
    #[error("species element has no Id")]
    MissingSpeciesId,
    #[error("species '{0}' has no InitialPopulation")]
    MissingInitialPopulation(String),
    #[error("species '{name}': invalid InitialPopulation '{raw}'")]
    InvalidInitialPopulation { name: String, raw: String },
    #[error("parameter element has no Id")]
    MissingParameterId,
    #[error("parameter '{0}' has no Expression")]
    MissingParameterExpression(String),
    #[error("reaction element has no Id")]
    MissingReactionId,
    #[error("no reaction type specified for reaction '{0}'")]
    MissingReactionType(String),
    #[error("unsupported reaction type '{kind}' for reaction '{reaction}'")]
    UnsupportedReactionType { reaction: String, kind: String },
    #[error("mass-action reaction '{0}' has no Rate")]
    MissingRate(String),
    #[error("customized reaction '{0}' has no PropensityFunction expression")]
    MissingPropensityFunction(String),
    #[error("reaction '{reaction}': SpeciesReference has no '{attribute}' attribute")]
    MissingSpeciesReferenceAttribute {
        reaction: String,
        attribute: &'static str,
    },
    #[error("reaction '{reaction}': invalid stoichiometry '{raw}' for species '{species}' (must be a positive integer)")]
    InvalidStoichiometry {
        reaction: String,
        species: String,
        raw: String,
    },
    /// Writing requires every parameter to hold a resolved scalar value.
    #[error("parameter '{0}' must be resolved before the model can be written")]
    UnresolvedParameter(String),
    #[error(transparent)]
    Species(#[from] SpeciesError),
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Reaction(#[from] ReactionError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while invoking the external solver or collecting its output.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("no '{0}' executable found; pass stochkit_home, set STOCHKIT_HOME, or add it to PATH")]
    ExecutableNotFound(String),
    #[error("solver execution failed: {command}: {details}")]
    SolverFailed { command: String, details: String },
    #[error("could not identify file '{0}' in the solver trajectory output")]
    UnexpectedOutputFile(PathBuf),
    #[error("trajectory file '{path}': {details}")]
    MalformedTrajectory { path: PathBuf, details: String },
    #[error(transparent)]
    StochML(#[from] StochMLError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
