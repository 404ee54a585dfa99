use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between reading the inputs and emitting a
/// solution record.
///
/// Input, binding and configuration errors name the input at fault and are
/// reported at the boundary. `SolverFailure` is surfaced as its own kind and
/// is never retried. `Internal` means an invariant of the tree model was
/// violated and indicates a bug, not bad input.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed Newick, GeoJSON, CSV or instance JSON.
    #[error("cannot parse {input}: {message}")]
    InputParse { input: &'static str, message: String },

    /// Leaves and sites could not be paired up.
    #[error("binding mismatch: {0}")]
    BindingMismatch(String),

    /// An option value is outside its domain.
    #[error("invalid value for {field}: {message}")]
    ConfigInvalid { field: &'static str, message: String },

    #[error("solver failure: {0}")]
    SolverFailure(#[from] SolverError),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// Terminal outcomes of the MILP oracle.
///
/// The assembled model is always feasible while slack variables exist, so
/// `Infeasible` here points at a bug in model assembly rather than at the
/// input data.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("model reported infeasible")]
    Infeasible,
    #[error("model reported unbounded")]
    Unbounded,
    #[error("node budget exhausted before optimality was proven")]
    Timeout,
}

impl Error {
    /// Process exit code for the CLI: 1 for input-side errors, 2 for solver errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::SolverFailure(_) => 2,
            _ => 1,
        }
    }

    pub(crate) fn input(input: &'static str, message: impl Into<String>) -> Self {
        Error::InputParse { input, message: message.into() }
    }

    pub(crate) fn config(field: &'static str, message: impl Into<String>) -> Self {
        Error::ConfigInvalid { field, message: message.into() }
    }
}
