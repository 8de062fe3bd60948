use tracing::debug;

use crate::simulator::solver::{Euler, OdeSolver, RkCashKarp54, SolverConfig, SolverStatus};
use crate::simulator::{DynamicalSystem, SimulationResult};
use crate::SimError;

/// Picks a solver for each system it integrates
///
/// Systems that require the Euler solver get [Euler], everything else the
/// adaptive [RkCashKarp54].
pub struct Auto {
    config: SolverConfig,
    selected: Option<Box<dyn OdeSolver>>,
    status: SolverStatus,
}

impl Auto {
    pub fn new(config: SolverConfig) -> Self {
        Auto {
            config,
            selected: None,
            status: SolverStatus::NotRun,
        }
    }

    /// Name of the solver used in the last integration
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_ref().map(|solver| solver.name())
    }
}

impl Default for Auto {
    fn default() -> Self {
        Auto::new(SolverConfig::default())
    }
}

impl OdeSolver for Auto {
    fn name(&self) -> &str {
        "auto"
    }

    fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn status(&self) -> &SolverStatus {
        &self.status
    }

    fn check_compatible(&self, _system: &DynamicalSystem) -> Result<(), SimError> {
        Ok(())
    }

    fn integrate(&mut self, system: &mut DynamicalSystem) -> Result<SimulationResult, SimError> {
        let mut solver: Box<dyn OdeSolver> = if system.requires_euler_ode_solver() {
            Box::new(Euler::new(self.config.clone()))
        } else {
            Box::new(RkCashKarp54::new(self.config.clone()))
        };
        debug!(selected = solver.name(), "auto solver selection");

        let result = solver.integrate(system);
        self.status = solver.status().clone();
        self.selected = Some(solver);
        result
    }
}
