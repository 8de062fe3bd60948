use crate::simulator::solver::{
    finish, integrate_fixed, prepare, OdeSolver, SolverConfig, SolverStatus,
};
use crate::simulator::{DynamicalSystem, SimulationResult};
use crate::SimError;

/// Forward Euler with a step of exactly one time index
///
/// The only solver accepted by systems containing modules that read the
/// step length as a parameter.
#[derive(Clone, Debug, Default)]
pub struct Euler {
    config: SolverConfig,
    status: SolverStatus,
}

impl Euler {
    pub fn new(config: SolverConfig) -> Self {
        Euler {
            config,
            status: SolverStatus::NotRun,
        }
    }
}

impl OdeSolver for Euler {
    fn name(&self) -> &str {
        "euler"
    }

    fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn status(&self) -> &SolverStatus {
        &self.status
    }

    fn is_euler(&self) -> bool {
        true
    }

    fn integrate(&mut self, system: &mut DynamicalSystem) -> Result<SimulationResult, SimError> {
        let outcome = prepare(&*self, system).and_then(|(state, result)| {
            integrate_fixed("euler", system, state, result, |_, _, state, derivative| {
                Ok(state + derivative)
            })
        });
        finish(&mut self.status, "euler", outcome)
    }
}
