use thiserror::Error;

/// Errors produced while building or integrating a dynamical system.
///
/// Every variant is fatal for the current evaluation or integration call; no
/// partial results are returned alongside an error.
#[derive(Error, Debug)]
pub enum SimError {
    // ─────────────────────────────────────────────────────────────────────────
    // Quantities and drivers
    // ─────────────────────────────────────────────────────────────────────────
    /// Lookup of a quantity that is not defined
    #[error("Quantity '{name}' not found")]
    QuantityNotFound { name: String },

    /// Driver slice requested past the available time points
    #[error("Time index {index} is out of range for drivers with {ntimes} time points")]
    IndexOutOfRange { index: f64, ntimes: usize },

    /// Drivers of one system must all have the same length
    #[error("Driver '{name}' has {len} values but '{reference}' has {expected}")]
    DriverLengthMismatch {
        name: String,
        len: usize,
        reference: String,
        expected: usize,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Modules
    // ─────────────────────────────────────────────────────────────────────────
    /// Module name is not registered in the factory
    #[error("Module '{0}' not found in the module factory")]
    ModuleNotFound(String),

    /// Two creators registered under the same name
    #[error("Module '{0}' is already registered")]
    DuplicateModule(String),

    /// A module descriptor is malformed
    #[error("Module '{module}' is invalid: {reason}")]
    InvalidModule { module: String, reason: String },

    /// A module tried to write an output it did not declare
    #[error("Module '{module}' wrote undeclared output '{name}'")]
    UndeclaredOutput { module: String, name: String },

    // ─────────────────────────────────────────────────────────────────────────
    // System construction and evaluation
    // ─────────────────────────────────────────────────────────────────────────
    /// Steady-state resolution could not satisfy every module's inputs
    #[error(
        "Steady-state module '{module}' is missing inputs {missing:?} after {passes} resolution passes"
    )]
    UnresolvedSteadyStateDependency {
        module: String,
        missing: Vec<String>,
        passes: usize,
    },

    /// A derivative module's output has no initial value
    #[error("Derivative module '{module}' outputs '{name}', which is not in the initial state")]
    UndefinedDifferentialQuantity { module: String, name: String },

    /// A steady-state output collides with an already defined quantity
    #[error("Module '{module}' redefines quantity '{name}'")]
    QuantityRedefined { module: String, name: String },

    /// Structural problem with the system definition
    #[error("Invalid dynamical system: {0}")]
    InvalidSystem(String),

    /// A module produced a NaN or infinite rate
    #[error("Derivative of '{name}' is not finite at time index {time}")]
    NonFiniteDerivative { name: String, time: f64 },

    // ─────────────────────────────────────────────────────────────────────────
    // Solvers
    // ─────────────────────────────────────────────────────────────────────────
    /// An adaptive solver was requested for a system that needs fixed steps
    #[error("The '{solver}' solver cannot integrate a system that requires the Euler solver")]
    SolverIncompatible { solver: String },

    /// The adaptive solver ran out of steps
    #[error("Tolerances not met after {max_steps} steps in the interval ending at time index {time}")]
    ToleranceNotMet { max_steps: usize, time: f64 },

    /// Solver name is not registered
    #[error("Solver '{0}' not found")]
    SolverNotFound(String),

    /// Solver configuration has an invalid value
    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),

    // ─────────────────────────────────────────────────────────────────────────
    // I/O
    // ─────────────────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    /// Create a quantity not found error
    pub fn quantity_not_found(name: impl Into<String>) -> Self {
        Self::QuantityNotFound { name: name.into() }
    }

    /// Create an invalid module error
    pub fn invalid_module(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidModule {
            module: module.into(),
            reason: reason.into(),
        }
    }
}
