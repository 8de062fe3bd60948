pub mod data;
pub mod error;
pub mod module;
pub mod simulator;

pub use crate::data::*;
pub use crate::module::*;
pub use crate::simulator::*;
pub use error::SimError;
pub use nalgebra::DVector;

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            parser::{read_drivers, write_result},
            DriverInterpolation, DriverSeries, QuantityMap,
        };
    }
    pub mod modules {
        pub use crate::module::library::{
            HarmonicEnergy, HarmonicOscillator, SolarPositionMichalsky, ThermalTimeLinear,
        };
        pub use crate::module::{
            evaluate_module, standard_library, Creator, FnCreator, Module, ModuleCreator,
            ModuleDefinition, ModuleFactory, ModuleKind, ModuleOutput,
        };
    }
    pub mod simulator {
        pub use crate::simulator::{
            create_solver, run_batch, DynamicalSystem, OdeSolver, Simulation, SimulationResult,
            SolverConfig,
        };
    }

    pub use crate::data::*;
    pub use crate::module::{Module, ModuleDefinition, ModuleKind, ModuleOutput};
    pub use crate::SimError;

    /// Read quantities into local bindings of the same name
    ///
    /// Must be used in a function returning `Result<_, SimError>`; a missing
    /// quantity returns early with [SimError::QuantityNotFound].
    ///
    /// ```
    /// use biosim::prelude::*;
    ///
    /// fn kinetic(q: &QuantityMap) -> Result<f64, SimError> {
    ///     biosim::fetch_quantities!(q, mass, velocity);
    ///     Ok(0.5 * mass * velocity * velocity)
    /// }
    ///
    /// let q = QuantityMap::from([("mass", 2.0), ("velocity", 3.0)]);
    /// assert_eq!(kinetic(&q).unwrap(), 9.0);
    /// assert!(kinetic(&QuantityMap::new()).is_err());
    /// ```
    #[macro_export]
    macro_rules! fetch_quantities {
        ($q:expr, $($name:ident),* $(,)?) => {
            let q = &$q;
            $(
                let $name: f64 = q.get(stringify!($name))?;
            )*
        };
    }
}
