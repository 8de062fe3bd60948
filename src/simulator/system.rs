use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::module::{factory::validate_descriptor, ModuleCreator, ModuleInstance, ModuleKind};
use crate::simulator::{T, TIME_INDEX, V};
use crate::{DriverInterpolation, DriverSeries, QuantityMap, SimError};

/// A system of algebraic and differential equations assembled from modules
///
/// The system owns its initial state, invariant parameters, driver data and
/// one instance of every module. For a time index and a vector of
/// differential quantity values it produces the derivative vector a solver
/// needs:
///
/// 1. parameters, the driver values at that time and the state are merged,
///    later sources winning on collision;
/// 2. steady-state modules run once each, in dependency order;
/// 3. derivative modules add their rates into a zeroed accumulator, in the
///    order they were given.
///
/// # Example
///
/// ```
/// use biosim::*;
///
/// let system = DynamicalSystem::new(
///     QuantityMap::from([("position", 0.0), ("velocity", 1.0)]),
///     QuantityMap::from([("mass", 10.0), ("spring_constant", 0.1)]),
///     DriverSeries::new([("time", vec![0.0, 1.0, 2.0])]).unwrap(),
///     &[],
///     &standard_library().retrieve_all(&["harmonic_oscillator"]).unwrap(),
/// )
/// .unwrap();
///
/// assert_eq!(system.ntimes(), 3);
/// assert_eq!(system.differential_quantity_names(), &["position", "velocity"]);
/// assert_eq!(system.differential_quantities().unwrap(), vec![0.0, 1.0]);
/// ```
pub struct DynamicalSystem {
    initial_state: QuantityMap,
    parameters: QuantityMap,
    drivers: DriverSeries,
    interpolation: DriverInterpolation,
    /// Steady-state modules in resolved execution order
    steady_state: Vec<ModuleInstance>,
    derivative: Vec<ModuleInstance>,
    differential_names: Vec<String>,
    steady_state_outputs: Vec<String>,
    requires_euler: bool,
    resolution_passes: usize,
    retained: Option<Vec<String>>,
    initial_quantities: QuantityMap,
    quantities: QuantityMap,
    evaluations: usize,
}

impl DynamicalSystem {
    /// Build and validate a system
    ///
    /// Fails if a module list contains a module of the other kind, if a
    /// derivative module writes a quantity missing from `initial_state`, if a
    /// steady-state module redefines a known quantity, or if some module
    /// input can never be supplied.
    pub fn new(
        initial_state: QuantityMap,
        parameters: QuantityMap,
        drivers: DriverSeries,
        steady_state_modules: &[Arc<dyn ModuleCreator>],
        derivative_modules: &[Arc<dyn ModuleCreator>],
    ) -> Result<Self, SimError> {
        if drivers.ntimes() == 0 {
            return Err(SimError::InvalidSystem(
                "drivers must provide at least one time point".to_string(),
            ));
        }

        for (creators, expected) in [
            (steady_state_modules, ModuleKind::SteadyState),
            (derivative_modules, ModuleKind::Derivative),
        ] {
            for creator in creators {
                validate_descriptor(creator.as_ref())?;
                if creator.kind() != expected {
                    return Err(SimError::InvalidSystem(format!(
                        "module '{}' is a {} module but was listed with the {} modules",
                        creator.name(),
                        creator.kind(),
                        expected
                    )));
                }
            }
        }

        // The result column for the time index cannot be shadowed
        for (source, names) in [
            ("parameters", parameters.names()),
            ("drivers", drivers.names()),
            ("initial_state", initial_state.names()),
        ] {
            if names.iter().any(|name| name == TIME_INDEX) {
                return Err(SimError::QuantityRedefined {
                    module: source.to_string(),
                    name: TIME_INDEX.to_string(),
                });
            }
        }

        let mut known: HashSet<String> = parameters
            .names()
            .into_iter()
            .chain(drivers.names())
            .chain(initial_state.names())
            .collect();

        // Steady-state outputs must be new quantities
        let mut steady_state_outputs = Vec::new();
        for creator in steady_state_modules {
            for output in creator.outputs() {
                if output == TIME_INDEX
                    || known.contains(&output)
                    || steady_state_outputs.contains(&output)
                {
                    return Err(SimError::QuantityRedefined {
                        module: creator.name().to_string(),
                        name: output,
                    });
                }
                steady_state_outputs.push(output);
            }
        }

        // Differential quantities: derivative outputs, first appearance order
        let mut differential_names: Vec<String> = Vec::new();
        for creator in derivative_modules {
            for output in creator.outputs() {
                if !initial_state.contains(&output) {
                    return Err(SimError::UndefinedDifferentialQuantity {
                        module: creator.name().to_string(),
                        name: output,
                    });
                }
                if !differential_names.contains(&output) {
                    differential_names.push(output);
                }
            }
        }

        let (order, resolution_passes) =
            resolve_steady_state_order(steady_state_modules, &mut known)?;

        for creator in derivative_modules {
            let missing = missing_inputs(creator.as_ref(), &known);
            if !missing.is_empty() {
                return Err(SimError::InvalidSystem(format!(
                    "derivative module '{}' requires undefined quantities {:?}",
                    creator.name(),
                    missing
                )));
            }
        }

        let steady_state: Vec<ModuleInstance> = order
            .into_iter()
            .map(|index| steady_state_modules[index].create_module())
            .collect();
        let derivative: Vec<ModuleInstance> = derivative_modules
            .iter()
            .map(|creator| creator.create_module())
            .collect();
        let requires_euler = steady_state
            .iter()
            .chain(derivative.iter())
            .any(|module| module.requires_euler_ode_solver());

        debug!(
            steady_state = ?steady_state.iter().map(|m| m.name()).collect::<Vec<_>>(),
            derivative = ?derivative.iter().map(|m| m.name()).collect::<Vec<_>>(),
            differential = ?differential_names,
            resolution_passes,
            requires_euler,
            "built dynamical system"
        );

        let mut system = DynamicalSystem {
            initial_state,
            parameters,
            drivers,
            interpolation: DriverInterpolation::default(),
            steady_state,
            derivative,
            differential_names,
            steady_state_outputs,
            requires_euler,
            resolution_passes,
            retained: None,
            initial_quantities: QuantityMap::new(),
            quantities: QuantityMap::new(),
            evaluations: 0,
        };

        let start = system.initial_state_vector()?;
        system.quantities = system.resolve(0.0, &start)?;
        system.initial_quantities = system.quantities.clone();
        Ok(system)
    }

    /// Use a different method for driver values between time points
    pub fn with_interpolation(mut self, method: DriverInterpolation) -> Self {
        self.interpolation = method;
        self
    }

    /// Restrict the recorded output to the differential quantities plus `names`
    pub fn with_retained(mut self, names: &[&str]) -> Result<Self, SimError> {
        for name in names {
            if !self.quantities.contains(name) {
                return Err(SimError::quantity_not_found(*name));
            }
        }
        self.retained = Some(names.iter().map(|s| s.to_string()).collect());
        Ok(self)
    }

    /// Number of available time points, from the driver length
    pub fn ntimes(&self) -> usize {
        self.drivers.ntimes()
    }

    /// Whether any module only supports fixed one-index Euler steps
    pub fn requires_euler_ode_solver(&self) -> bool {
        self.requires_euler
    }

    /// Names of the integrated quantities, in canonical order
    pub fn differential_quantity_names(&self) -> &[String] {
        &self.differential_names
    }

    /// Current values of the differential quantities, in canonical order
    pub fn differential_quantities(&self) -> Result<Vec<T>, SimError> {
        self.quantities.values_of(&self.differential_names)
    }

    /// Differential quantities of the initial state, as a solver vector
    pub fn initial_state_vector(&self) -> Result<V, SimError> {
        Ok(V::from_vec(
            self.initial_state.values_of(&self.differential_names)?,
        ))
    }

    /// Outputs of the steady-state modules
    pub fn steady_state_output_names(&self) -> &[String] {
        &self.steady_state_outputs
    }

    /// Names recorded in simulation results, sorted
    ///
    /// By default every quantity that can change over a run: drivers, state
    /// and steady-state outputs.
    pub fn output_quantity_names(&self) -> Vec<String> {
        let names: BTreeSet<String> = match &self.retained {
            Some(retained) => self
                .differential_names
                .iter()
                .chain(retained.iter())
                .cloned()
                .collect(),
            None => self
                .drivers
                .names()
                .into_iter()
                .chain(self.initial_state.names())
                .chain(self.steady_state_outputs.iter().cloned())
                .collect(),
        };
        names.into_iter().collect()
    }

    /// All quantities as of the last evaluation
    pub fn quantities(&self) -> &QuantityMap {
        &self.quantities
    }

    pub fn parameters(&self) -> &QuantityMap {
        &self.parameters
    }

    pub fn drivers(&self) -> &DriverSeries {
        &self.drivers
    }

    /// Number of passes needed to order the steady-state modules
    pub fn resolution_passes(&self) -> usize {
        self.resolution_passes
    }

    /// Number of derivative evaluations since construction or the last reset
    pub fn evaluation_count(&self) -> usize {
        self.evaluations
    }

    /// Restore the state the system had right after construction
    pub fn reset(&mut self) {
        self.quantities = self.initial_quantities.clone();
        self.evaluations = 0;
    }

    /// Resolve all quantities at `time` for the given differential values,
    /// without computing derivatives
    pub fn update(&mut self, time: T, state: &V) -> Result<(), SimError> {
        self.quantities = self.resolve(time, state)?;
        Ok(())
    }

    /// Derivatives of the differential quantities at `time`
    ///
    /// `time` is a continuous time index in `[0, ntimes - 1]`.
    pub fn evaluate(&mut self, time: T, state: &V) -> Result<V, SimError> {
        let quantities = self.resolve(time, state)?;

        let mut rates = QuantityMap::zeros(&self.differential_names);
        for module in &self.derivative {
            module.run(&quantities, &mut rates)?;
        }

        let mut derivative = V::zeros(self.differential_names.len());
        for (i, name) in self.differential_names.iter().enumerate() {
            let rate = rates.get(name)?;
            if !rate.is_finite() {
                return Err(SimError::NonFiniteDerivative {
                    name: name.clone(),
                    time,
                });
            }
            derivative[i] = rate;
        }

        self.quantities = quantities;
        self.evaluations += 1;
        Ok(derivative)
    }

    fn resolve(&self, time: T, state: &V) -> Result<QuantityMap, SimError> {
        if state.len() != self.differential_names.len() {
            return Err(SimError::InvalidSystem(format!(
                "expected {} differential values, got {}",
                self.differential_names.len(),
                state.len()
            )));
        }

        let drivers = self.drivers.interpolate(time, self.interpolation)?;
        let mut quantities =
            QuantityMap::layered([&self.parameters, &drivers, &self.initial_state]);
        for (name, value) in self.differential_names.iter().zip(state.iter()) {
            quantities.set(name.as_str(), *value);
        }

        for module in &self.steady_state {
            let mut produced = QuantityMap::new();
            module.run(&quantities, &mut produced)?;
            quantities.merge(&produced);
        }
        Ok(quantities)
    }
}

impl fmt::Debug for DynamicalSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicalSystem")
            .field("ntimes", &self.ntimes())
            .field("differential", &self.differential_names)
            .field("steady_state", &self.steady_state)
            .field("derivative", &self.derivative)
            .field("requires_euler", &self.requires_euler)
            .finish()
    }
}

fn missing_inputs(creator: &dyn ModuleCreator, known: &HashSet<String>) -> Vec<String> {
    creator
        .inputs()
        .into_iter()
        .filter(|input| !known.contains(input))
        .collect()
}

/// Order steady-state modules so each runs after the producers of its inputs
///
/// Modules are visited in the given order once per pass; a module whose
/// inputs are all known runs in that pass and its outputs become known.
/// Passes repeat until every module is placed. With `n` modules at most `n`
/// passes are needed, so a pass without progress means some input is never
/// produced.
fn resolve_steady_state_order(
    creators: &[Arc<dyn ModuleCreator>],
    known: &mut HashSet<String>,
) -> Result<(Vec<usize>, usize), SimError> {
    let max_passes = creators.len();
    let mut pending: Vec<usize> = (0..creators.len()).collect();
    let mut order = Vec::with_capacity(creators.len());
    let mut passes = 0;

    while !pending.is_empty() {
        passes += 1;
        let before = pending.len();
        let mut unresolved = Vec::new();
        for index in pending {
            let creator = creators[index].as_ref();
            if missing_inputs(creator, known).is_empty() {
                known.extend(creator.outputs());
                order.push(index);
            } else {
                unresolved.push(index);
            }
        }

        let stalled = unresolved.len() == before;
        if let Some(&index) = unresolved.first() {
            if stalled || passes >= max_passes {
                let creator = creators[index].as_ref();
                return Err(SimError::UnresolvedSteadyStateDependency {
                    module: creator.name().to_string(),
                    missing: missing_inputs(creator, known),
                    passes,
                });
            }
        }
        pending = unresolved;
    }

    Ok((order, passes))
}
