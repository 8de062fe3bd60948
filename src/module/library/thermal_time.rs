use crate::fetch_quantities;
use crate::module::{Module, ModuleDefinition, ModuleKind, ModuleOutput};
use crate::{QuantityMap, SimError};

/// Accumulated thermal time above a base temperature
///
/// The rate is expressed per time index: `timestep` is the length of one
/// index in hours, so `TTc` accumulates in degree-days. The step length
/// enters the rate directly, which only holds for one-index steps.
#[derive(Default)]
pub struct ThermalTimeLinear;

impl ModuleDefinition for ThermalTimeLinear {
    const NAME: &'static str = "thermal_time_linear";
    const KIND: ModuleKind = ModuleKind::Derivative;
    const INPUTS: &'static [&'static str] = &["temp", "tbase", "timestep"];
    const OUTPUTS: &'static [&'static str] = &["TTc"];
    const REQUIRES_EULER: bool = true;
}

impl Module for ThermalTimeLinear {
    fn run(&self, q: &QuantityMap, out: &mut ModuleOutput<'_>) -> Result<(), SimError> {
        fetch_quantities!(q, temp, tbase, timestep);

        let rate = if temp > tbase {
            (temp - tbase) * timestep / 24.0
        } else {
            0.0
        };
        out.update("TTc", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{evaluate_module, Creator, ModuleCreator};

    #[test]
    fn test_rate_above_and_below_base() {
        let creator = Creator::<ThermalTimeLinear>::new();
        assert!(creator.requires_euler_ode_solver());

        let warm = QuantityMap::from([("temp", 22.0), ("tbase", 10.0), ("timestep", 1.0)]);
        assert_eq!(evaluate_module(&creator, &warm).unwrap().get("TTc").unwrap(), 0.5);

        let cold = QuantityMap::from([("temp", 4.0), ("tbase", 10.0), ("timestep", 1.0)]);
        assert_eq!(evaluate_module(&creator, &cold).unwrap().get("TTc").unwrap(), 0.0);
    }
}
