//! Standard module library
//!
//! These modules populate [standard_library](crate::standard_library). They
//! are small, self-contained examples of each module capability.
mod harmonic;
mod solar_position;
mod thermal_time;

pub use harmonic::{HarmonicEnergy, HarmonicOscillator};
pub use solar_position::SolarPositionMichalsky;
pub use thermal_time::ThermalTimeLinear;

use crate::module::{Creator, ModuleSet};

/// Creators for every module of the standard library
pub(crate) fn creators() -> ModuleSet {
    vec![
        Creator::<HarmonicOscillator>::shared(),
        Creator::<HarmonicEnergy>::shared(),
        Creator::<SolarPositionMichalsky>::shared(),
        Creator::<ThermalTimeLinear>::shared(),
    ]
}
