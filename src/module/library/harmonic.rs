use crate::fetch_quantities;
use crate::module::{Module, ModuleDefinition, ModuleKind, ModuleOutput};
use crate::{QuantityMap, SimError};

/// Undamped mass on a spring
///
/// - d(position)/dt = velocity
/// - d(velocity)/dt = -spring_constant * position / mass
#[derive(Default)]
pub struct HarmonicOscillator;

impl ModuleDefinition for HarmonicOscillator {
    const NAME: &'static str = "harmonic_oscillator";
    const KIND: ModuleKind = ModuleKind::Derivative;
    const INPUTS: &'static [&'static str] = &["mass", "spring_constant", "position", "velocity"];
    const OUTPUTS: &'static [&'static str] = &["position", "velocity"];
}

impl Module for HarmonicOscillator {
    fn run(&self, q: &QuantityMap, out: &mut ModuleOutput<'_>) -> Result<(), SimError> {
        fetch_quantities!(q, mass, spring_constant, position, velocity);

        out.update("position", velocity)?;
        out.update("velocity", -spring_constant * position / mass)
    }
}

/// Kinetic, elastic and total energy of a [HarmonicOscillator]
#[derive(Default)]
pub struct HarmonicEnergy;

impl ModuleDefinition for HarmonicEnergy {
    const NAME: &'static str = "harmonic_energy";
    const KIND: ModuleKind = ModuleKind::SteadyState;
    const INPUTS: &'static [&'static str] = &["mass", "spring_constant", "position", "velocity"];
    const OUTPUTS: &'static [&'static str] = &["kinetic_energy", "spring_energy", "total_energy"];
}

impl Module for HarmonicEnergy {
    fn run(&self, q: &QuantityMap, out: &mut ModuleOutput<'_>) -> Result<(), SimError> {
        fetch_quantities!(q, mass, spring_constant, position, velocity);

        let kinetic = 0.5 * mass * velocity * velocity;
        let spring = 0.5 * spring_constant * position * position;

        out.update("kinetic_energy", kinetic)?;
        out.update("spring_energy", spring)?;
        out.update("total_energy", kinetic + spring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{evaluate_module, Creator};
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_partition() {
        let q = QuantityMap::from([
            ("mass", 2.0),
            ("spring_constant", 8.0),
            ("position", 0.5),
            ("velocity", 3.0),
        ]);
        let out = evaluate_module(&Creator::<HarmonicEnergy>::new(), &q).unwrap();
        assert_relative_eq!(out.get("kinetic_energy").unwrap(), 9.0);
        assert_relative_eq!(out.get("spring_energy").unwrap(), 1.0);
        assert_relative_eq!(out.get("total_energy").unwrap(), 10.0);
    }

    #[test]
    fn test_oscillator_at_rest_at_origin() {
        let q = QuantityMap::from([
            ("mass", 1.0),
            ("spring_constant", 1.0),
            ("position", 0.0),
            ("velocity", 0.0),
        ]);
        let out = evaluate_module(&Creator::<HarmonicOscillator>::new(), &q).unwrap();
        assert_eq!(out.get("position").unwrap(), 0.0);
        assert_eq!(out.get("velocity").unwrap(), 0.0);
    }
}
