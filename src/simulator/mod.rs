pub mod result;
pub mod simulation;
pub mod solver;
pub mod system;

pub use result::{SimulationResult, TIME_INDEX};
pub use simulation::{run_batch, Simulation};
pub use solver::{
    create_solver, solver_names, Auto, Euler, IntegrationReport, OdeSolver, Rk4, RkCashKarp54,
    SolverConfig, SolverStatus, NOT_RUN_MESSAGE,
};
pub use system::DynamicalSystem;

pub(crate) type T = f64;
pub(crate) type V = nalgebra::DVector<T>;
