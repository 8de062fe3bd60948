pub mod factory;
pub mod library;

pub use factory::*;

use serde::{Deserialize, Serialize};
use std::{fmt, marker::PhantomData, sync::Arc};

use crate::{QuantityMap, SimError};

/// Capability of a module, deciding how its outputs are written
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleKind {
    /// Computes algebraic outputs, overwriting previous values
    SteadyState,
    /// Computes rates of change, added to the values already present
    Derivative,
}

impl ModuleKind {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::SteadyState => "steady-state",
            Self::Derivative => "derivative",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Destination for the values a module produces.
///
/// The writer applies the semantics of the module's [ModuleKind]: steady-state
/// outputs overwrite, derivative outputs accumulate. Writing a name the
/// module did not declare is an error.
pub struct ModuleOutput<'a> {
    module: &'a str,
    kind: ModuleKind,
    declared: &'a [String],
    values: &'a mut QuantityMap,
}

impl<'a> ModuleOutput<'a> {
    pub(crate) fn new(
        module: &'a str,
        kind: ModuleKind,
        declared: &'a [String],
        values: &'a mut QuantityMap,
    ) -> Self {
        ModuleOutput {
            module,
            kind,
            declared,
            values,
        }
    }

    /// Write one output value
    #[inline]
    pub fn update(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        if !self.declared.iter().any(|declared| declared == name) {
            return Err(SimError::UndeclaredOutput {
                module: self.module.to_string(),
                name: name.to_string(),
            });
        }
        match self.kind {
            ModuleKind::SteadyState => {
                self.values.set(name, value);
                Ok(())
            }
            ModuleKind::Derivative => self.values.add(name, value),
        }
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }
}

/// A computational unit of a dynamical system.
///
/// `run` reads the current quantities and reports its results through the
/// [ModuleOutput]; it has no other side effects.
pub trait Module: Send + Sync {
    fn run(&self, quantities: &QuantityMap, output: &mut ModuleOutput<'_>) -> Result<(), SimError>;
}

/// Plain function modules, for modules without configuration
pub type ModuleFn = fn(&QuantityMap, &mut ModuleOutput<'_>) -> Result<(), SimError>;

impl Module for ModuleFn {
    fn run(&self, quantities: &QuantityMap, output: &mut ModuleOutput<'_>) -> Result<(), SimError> {
        (self)(quantities, output)
    }
}

/// A module bound to its descriptor, ready to run inside a system
pub struct ModuleInstance {
    name: String,
    kind: ModuleKind,
    inputs: Vec<String>,
    outputs: Vec<String>,
    requires_euler: bool,
    module: Box<dyn Module>,
}

impl ModuleInstance {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ModuleKind {
        self.kind
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn requires_euler_ode_solver(&self) -> bool {
        self.requires_euler
    }

    /// Run the module once, writing into `outputs`
    ///
    /// For derivative modules every declared output must already be present
    /// in `outputs`, normally initialized to zero.
    #[inline]
    pub fn run(&self, quantities: &QuantityMap, outputs: &mut QuantityMap) -> Result<(), SimError> {
        let mut writer = ModuleOutput::new(&self.name, self.kind, &self.outputs, outputs);
        self.module.run(quantities, &mut writer)
    }
}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// Knows a module's interface and how to instantiate it.
pub trait ModuleCreator: Send + Sync {
    fn name(&self) -> &str;

    /// Names of the quantities the module reads
    fn inputs(&self) -> Vec<String>;

    /// Names of the quantities the module writes
    fn outputs(&self) -> Vec<String>;

    fn kind(&self) -> ModuleKind;

    /// Whether the module is only valid with fixed, one-index steps
    /// (for example because it reads the step size as a parameter)
    fn requires_euler_ode_solver(&self) -> bool {
        false
    }

    /// Build the module itself
    fn build(&self) -> Box<dyn Module>;

    /// Create a runnable instance bound to this creator's descriptor
    fn create_module(&self) -> ModuleInstance {
        ModuleInstance {
            name: self.name().to_string(),
            kind: self.kind(),
            inputs: self.inputs(),
            outputs: self.outputs(),
            requires_euler: self.requires_euler_ode_solver(),
            module: self.build(),
        }
    }
}

/// Ordered list of module creators, as used to define a system
pub type ModuleSet = Vec<Arc<dyn ModuleCreator>>;

/// Static description of a module type
///
/// # Example
///
/// ```
/// use biosim::*;
///
/// #[derive(Default)]
/// struct Decay;
///
/// impl ModuleDefinition for Decay {
///     const NAME: &'static str = "decay";
///     const KIND: ModuleKind = ModuleKind::Derivative;
///     const INPUTS: &'static [&'static str] = &["amount", "rate"];
///     const OUTPUTS: &'static [&'static str] = &["amount"];
/// }
///
/// impl Module for Decay {
///     fn run(&self, q: &QuantityMap, out: &mut ModuleOutput<'_>) -> Result<(), SimError> {
///         out.update("amount", -q.get("rate")? * q.get("amount")?)
///     }
/// }
///
/// let creator = Creator::<Decay>::new();
/// assert_eq!(creator.outputs(), vec!["amount"]);
/// ```
pub trait ModuleDefinition: Module + Default + 'static {
    const NAME: &'static str;
    const KIND: ModuleKind;
    const INPUTS: &'static [&'static str];
    const OUTPUTS: &'static [&'static str];
    const REQUIRES_EULER: bool = false;
}

/// [ModuleCreator] for a type implementing [ModuleDefinition]
pub struct Creator<M> {
    _module: PhantomData<fn() -> M>,
}

impl<M: ModuleDefinition> Creator<M> {
    pub fn new() -> Self {
        Creator {
            _module: PhantomData,
        }
    }

    /// Shared handle, as stored in a [ModuleSet]
    pub fn shared() -> Arc<dyn ModuleCreator> {
        Arc::new(Self::new())
    }
}

impl<M: ModuleDefinition> Default for Creator<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ModuleDefinition> ModuleCreator for Creator<M> {
    fn name(&self) -> &str {
        M::NAME
    }

    fn inputs(&self) -> Vec<String> {
        M::INPUTS.iter().map(|s| s.to_string()).collect()
    }

    fn outputs(&self) -> Vec<String> {
        M::OUTPUTS.iter().map(|s| s.to_string()).collect()
    }

    fn kind(&self) -> ModuleKind {
        M::KIND
    }

    fn requires_euler_ode_solver(&self) -> bool {
        M::REQUIRES_EULER
    }

    fn build(&self) -> Box<dyn Module> {
        Box::new(M::default())
    }
}

/// [ModuleCreator] for a plain function
///
/// ```
/// use biosim::*;
///
/// let doubler = FnCreator::new(
///     "doubler",
///     ModuleKind::SteadyState,
///     &["x"],
///     &["two_x"],
///     |q, out| out.update("two_x", 2.0 * q.get("x")?),
/// );
/// let outputs = evaluate_module(&doubler, &QuantityMap::from([("x", 4.0)])).unwrap();
/// assert_eq!(outputs.get("two_x").unwrap(), 8.0);
/// ```
#[derive(Clone)]
pub struct FnCreator {
    name: String,
    kind: ModuleKind,
    inputs: Vec<String>,
    outputs: Vec<String>,
    requires_euler: bool,
    run: ModuleFn,
}

impl FnCreator {
    pub fn new(
        name: impl Into<String>,
        kind: ModuleKind,
        inputs: &[&str],
        outputs: &[&str],
        run: ModuleFn,
    ) -> Self {
        FnCreator {
            name: name.into(),
            kind,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            requires_euler: false,
            run,
        }
    }

    /// Mark the module as valid only with the Euler solver
    pub fn requiring_euler(mut self) -> Self {
        self.requires_euler = true;
        self
    }

    pub fn shared(self) -> Arc<dyn ModuleCreator> {
        Arc::new(self)
    }
}

impl ModuleCreator for FnCreator {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> Vec<String> {
        self.inputs.clone()
    }

    fn outputs(&self) -> Vec<String> {
        self.outputs.clone()
    }

    fn kind(&self) -> ModuleKind {
        self.kind
    }

    fn requires_euler_ode_solver(&self) -> bool {
        self.requires_euler
    }

    fn build(&self) -> Box<dyn Module> {
        Box::new(self.run)
    }
}

/// Run one module in isolation and return its outputs
///
/// Outputs start at zero, so for derivative modules the result is the
/// module's own contribution to each rate.
pub fn evaluate_module(
    creator: &dyn ModuleCreator,
    quantities: &QuantityMap,
) -> Result<QuantityMap, SimError> {
    let instance = creator.create_module();
    let mut outputs = QuantityMap::zeros(instance.outputs());
    instance.run(quantities, &mut outputs)?;
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(q: &QuantityMap, out: &mut ModuleOutput<'_>) -> Result<(), SimError> {
        out.update("x", q.get("rate")?)
    }

    #[test]
    fn test_derivative_outputs_accumulate() {
        let creator = FnCreator::new("acc", ModuleKind::Derivative, &["rate"], &["x"], accumulate);
        let instance = creator.create_module();
        let quantities = QuantityMap::from([("rate", 1.5)]);
        let mut outputs = QuantityMap::zeros(["x"]);

        instance.run(&quantities, &mut outputs).unwrap();
        instance.run(&quantities, &mut outputs).unwrap();

        assert_eq!(outputs.get("x").unwrap(), 3.0);
    }

    #[test]
    fn test_steady_state_outputs_overwrite() {
        let creator = FnCreator::new("set", ModuleKind::SteadyState, &["rate"], &["x"], accumulate);
        let instance = creator.create_module();
        let quantities = QuantityMap::from([("rate", 1.5)]);
        let mut outputs = QuantityMap::from([("x", 10.0)]);

        instance.run(&quantities, &mut outputs).unwrap();
        instance.run(&quantities, &mut outputs).unwrap();

        assert_eq!(outputs.get("x").unwrap(), 1.5);
    }

    #[test]
    fn test_undeclared_output_is_rejected() {
        let creator = FnCreator::new("rogue", ModuleKind::SteadyState, &[], &["y"], |_, out| {
            out.update("z", 1.0)
        });
        match evaluate_module(&creator, &QuantityMap::new()) {
            Err(SimError::UndeclaredOutput { module, name }) => {
                assert_eq!(module, "rogue");
                assert_eq!(name, "z");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_input_surfaces() {
        let creator = FnCreator::new("acc", ModuleKind::Derivative, &["rate"], &["x"], accumulate);
        assert!(matches!(
            evaluate_module(&creator, &QuantityMap::new()),
            Err(SimError::QuantityNotFound { .. })
        ));
    }
}
