use crate::simulator::solver::{
    finish, integrate_fixed, prepare, OdeSolver, SolverConfig, SolverStatus,
};
use crate::simulator::{DynamicalSystem, SimulationResult, T, V};
use crate::SimError;

/// Classical fourth-order Runge-Kutta with a step of one time index
///
/// Driver values at the half step are interpolated.
#[derive(Clone, Debug, Default)]
pub struct Rk4 {
    config: SolverConfig,
    status: SolverStatus,
}

impl Rk4 {
    pub fn new(config: SolverConfig) -> Self {
        Rk4 {
            config,
            status: SolverStatus::NotRun,
        }
    }
}

fn rk4_step(system: &mut DynamicalSystem, t: T, y: &V, k1: V) -> Result<V, SimError> {
    let h = 1.0;
    let k2 = system.evaluate(t + 0.5 * h, &(y + &k1 * (0.5 * h)))?;
    let k3 = system.evaluate(t + 0.5 * h, &(y + &k2 * (0.5 * h)))?;
    let k4 = system.evaluate(t + h, &(y + &k3 * h))?;
    Ok(y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0))
}

impl OdeSolver for Rk4 {
    fn name(&self) -> &str {
        "rk4"
    }

    fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn status(&self) -> &SolverStatus {
        &self.status
    }

    fn integrate(&mut self, system: &mut DynamicalSystem) -> Result<SimulationResult, SimError> {
        let outcome = prepare(&*self, system).and_then(|(state, result)| {
            integrate_fixed("rk4", system, state, result, rk4_step)
        });
        finish(&mut self.status, "rk4", outcome)
    }
}
