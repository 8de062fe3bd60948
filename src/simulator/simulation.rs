use rayon::prelude::*;
use tracing::info;

use crate::module::ModuleFactory;
use crate::simulator::solver::{create_solver, OdeSolver, SolverConfig};
use crate::simulator::{DynamicalSystem, SimulationResult};
use crate::{DriverSeries, QuantityMap, SimError};

/// A dynamical system paired with the solver that integrates it
///
/// # Example
///
/// ```
/// use biosim::*;
///
/// let drivers = DriverSeries::new([("doy", (0..25).map(|i| i as f64).collect())]).unwrap();
/// let mut simulation = Simulation::from_names(
///     standard_library(),
///     QuantityMap::from([("position", 1.0), ("velocity", 0.0)]),
///     QuantityMap::from([("mass", 1.0), ("spring_constant", 0.01)]),
///     drivers,
///     &["harmonic_energy"],
///     &["harmonic_oscillator"],
///     "rkck54",
///     SolverConfig::default(),
/// )
/// .unwrap();
///
/// let result = simulation.run().unwrap();
/// assert_eq!(result.nrows(), 25);
/// assert!(simulation.report().starts_with("The rkck54 solver required"));
/// ```
pub struct Simulation {
    system: DynamicalSystem,
    solver: Box<dyn OdeSolver>,
}

impl Simulation {
    /// Pair a system with a solver, failing early if they are incompatible
    pub fn new(system: DynamicalSystem, solver: Box<dyn OdeSolver>) -> Result<Self, SimError> {
        solver.check_compatible(&system)?;
        Ok(Simulation { system, solver })
    }

    /// Build the system from module and solver names
    #[allow(clippy::too_many_arguments)]
    pub fn from_names(
        factory: &ModuleFactory,
        initial_state: QuantityMap,
        parameters: QuantityMap,
        drivers: DriverSeries,
        steady_state_modules: &[&str],
        derivative_modules: &[&str],
        solver: &str,
        config: SolverConfig,
    ) -> Result<Self, SimError> {
        let system = DynamicalSystem::new(
            initial_state,
            parameters,
            drivers,
            &factory.retrieve_all(steady_state_modules)?,
            &factory.retrieve_all(derivative_modules)?,
        )?;
        Simulation::new(system, create_solver(solver, config)?)
    }

    /// Integrate the system from its initial state
    pub fn run(&mut self) -> Result<SimulationResult, SimError> {
        info!(
            solver = self.solver.name(),
            ntimes = self.system.ntimes(),
            "running simulation"
        );
        self.solver.integrate(&mut self.system)
    }

    /// Report of the last run
    pub fn report(&self) -> String {
        self.solver.integrate_report()
    }

    pub fn system(&self) -> &DynamicalSystem {
        &self.system
    }

    pub fn solver(&self) -> &dyn OdeSolver {
        self.solver.as_ref()
    }
}

/// Run independent simulations in parallel
///
/// Results are returned in input order. A failing simulation does not stop
/// the others.
pub fn run_batch(simulations: &mut [Simulation]) -> Vec<Result<SimulationResult, SimError>> {
    simulations
        .par_iter_mut()
        .map(|simulation| simulation.run())
        .collect()
}
