//! ODE solvers for [DynamicalSystem]
//!
//! Time is measured in driver time indices. Fixed-step solvers advance one
//! index per step and record a row at every native time point. The adaptive
//! solver chooses its own steps and records a row every
//! [SolverConfig::output_step_size] indices.
mod auto;
mod cash_karp;
mod euler;
mod factory;
mod rk4;

pub use auto::Auto;
pub use cash_karp::RkCashKarp54;
pub use euler::Euler;
pub use factory::{create_solver, solver_names};
pub use rk4::Rk4;

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::simulator::{DynamicalSystem, SimulationResult, T, V};
use crate::SimError;

/// Report returned before a solver has integrated anything
pub const NOT_RUN_MESSAGE: &str = "The ode_solver has not been called yet";

/// Settings shared by all solvers
///
/// Fixed-step solvers ignore everything but the validation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    /// Spacing of recorded rows for the adaptive solver, in time indices
    pub output_step_size: f64,
    /// Relative error tolerance
    pub rtol: f64,
    /// Absolute error tolerance
    pub atol: f64,
    /// Maximum number of step attempts between two recorded rows
    pub max_steps: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            output_step_size: 1.0,
            rtol: 1e-4,
            atol: 1e-4,
            max_steps: 200,
        }
    }
}

impl SolverConfig {
    pub fn new(output_step_size: f64, rtol: f64, atol: f64, max_steps: usize) -> Self {
        SolverConfig {
            output_step_size,
            rtol,
            atol,
            max_steps,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.output_step_size.is_finite() && self.output_step_size > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "output_step_size must be positive, got {}",
                self.output_step_size
            )));
        }
        for (name, value) in [("rtol", self.rtol), ("atol", self.atol)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidConfig(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Counters collected during one integration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IntegrationReport {
    pub solver: String,
    /// Accepted steps
    pub steps: usize,
    /// Steps rejected by error control
    pub rejected_steps: usize,
    /// Derivative evaluations of the system
    pub evaluations: usize,
    /// Recorded rows
    pub rows: usize,
    /// Time index of the last recorded row
    pub final_time: T,
}

impl fmt::Display for IntegrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "The {} solver required {} steps to integrate the system",
            self.solver, self.steps
        )?;
        writeln!(
            f,
            "{} steps were rejected by the error control",
            self.rejected_steps
        )?;
        writeln!(f, "The system was evaluated {} times", self.evaluations)?;
        write!(
            f,
            "{} rows were recorded, ending at time index {}",
            self.rows, self.final_time
        )
    }
}

/// Where a solver is in its lifecycle
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SolverStatus {
    #[default]
    NotRun,
    Completed(IntegrationReport),
    Failed(String),
}

/// Integrates a [DynamicalSystem] over its driver time span
///
/// Every call to [integrate](OdeSolver::integrate) starts from the system's
/// initial state and replaces the previous status.
pub trait OdeSolver: Send {
    fn name(&self) -> &str;

    fn config(&self) -> &SolverConfig;

    fn status(&self) -> &SolverStatus;

    /// Whether the solver takes fixed one-index Euler steps
    fn is_euler(&self) -> bool {
        false
    }

    /// Fail if the solver cannot integrate `system`
    fn check_compatible(&self, system: &DynamicalSystem) -> Result<(), SimError> {
        if system.requires_euler_ode_solver() && !self.is_euler() {
            return Err(SimError::SolverIncompatible {
                solver: self.name().to_string(),
            });
        }
        Ok(())
    }

    fn integrate(&mut self, system: &mut DynamicalSystem) -> Result<SimulationResult, SimError>;

    /// Human-readable summary of the last integration
    fn integrate_report(&self) -> String {
        match self.status() {
            SolverStatus::NotRun => NOT_RUN_MESSAGE.to_string(),
            SolverStatus::Completed(report) => report.to_string(),
            SolverStatus::Failed(reason) => {
                format!("The {} solver failed: {}", self.name(), reason)
            }
        }
    }
}

/// Common preamble of every integration: validate, check and reset
pub(crate) fn prepare(
    solver: &dyn OdeSolver,
    system: &mut DynamicalSystem,
) -> Result<(V, SimulationResult), SimError> {
    solver.config().validate()?;
    solver.check_compatible(system)?;
    system.reset();
    let state = system.initial_state_vector()?;
    let result = SimulationResult::new(system.output_quantity_names());
    Ok((state, result))
}

/// Store the outcome of an integration as the solver status
pub(crate) fn finish(
    status: &mut SolverStatus,
    solver: &str,
    outcome: Result<(SimulationResult, IntegrationReport), SimError>,
) -> Result<SimulationResult, SimError> {
    match outcome {
        Ok((result, report)) => {
            info!(
                solver,
                steps = report.steps,
                rejected = report.rejected_steps,
                evaluations = report.evaluations,
                rows = report.rows,
                "integration finished"
            );
            *status = SolverStatus::Completed(report);
            Ok(result)
        }
        Err(error) => {
            warn!(solver, %error, "integration failed");
            *status = SolverStatus::Failed(error.to_string());
            Err(error)
        }
    }
}

/// Advance a fixed-step method over every native time point
///
/// `step` maps (time, state, derivative at time) to the state one index later.
pub(crate) fn integrate_fixed<F>(
    solver: &str,
    system: &mut DynamicalSystem,
    mut state: V,
    mut result: SimulationResult,
    mut step: F,
) -> Result<(SimulationResult, IntegrationReport), SimError>
where
    F: FnMut(&mut DynamicalSystem, T, &V, V) -> Result<V, SimError>,
{
    let last = system.ntimes() - 1;
    for index in 0..last {
        let time = index as T;
        let derivative = system.evaluate(time, &state)?;
        result.push_row(time, system.quantities())?;
        state = step(system, time, &state, derivative)?;
    }
    system.update(last as T, &state)?;
    result.push_row(last as T, system.quantities())?;

    let report = IntegrationReport {
        solver: solver.to_string(),
        steps: last,
        rejected_steps: 0,
        evaluations: system.evaluation_count(),
        rows: result.nrows(),
        final_time: last as T,
    };
    Ok((result, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.output_step_size, 1.0);
        assert_eq!(config.rtol, 1e-4);
        assert_eq!(config.atol, 1e-4);
        assert_eq!(config.max_steps, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        for config in [
            SolverConfig::new(0.0, 1e-4, 1e-4, 200),
            SolverConfig::new(1.0, -1e-4, 1e-4, 200),
            SolverConfig::new(1.0, 1e-4, f64::NAN, 200),
            SolverConfig::new(1.0, 1e-4, 1e-4, 0),
        ] {
            assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: SolverConfig = serde_json::from_str(r#"{"rtol": 1e-6}"#).unwrap();
        assert_eq!(config.rtol, 1e-6);
        assert_eq!(config.max_steps, 200);
    }

    #[test]
    fn test_report_first_line() {
        let report = IntegrationReport {
            solver: "euler".to_string(),
            steps: 99,
            rejected_steps: 0,
            evaluations: 99,
            rows: 100,
            final_time: 99.0,
        };
        assert!(report
            .to_string()
            .starts_with("The euler solver required 99 steps to integrate the system\n"));
    }
}
