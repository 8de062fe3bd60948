use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::{data::QuantityMap, SimError};

/// Slack allowed when a solver lands on the last time point through
/// accumulated floating point steps.
const END_TOLERANCE: f64 = 1e-9;

/// Method used to produce driver values between native time points
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverInterpolation {
    /// Linear interpolation between the bounding time points
    #[default]
    Linear,
    /// Value of the time point at or before the requested time, carried forward
    Floor,
}

/// Externally supplied forcing data
///
/// Each driver is a sequence of samples, one per time index. All drivers of a
/// series share the same length, which is the number of available time points.
///
/// # Example
///
/// ```
/// use biosim::*;
///
/// let drivers = DriverSeries::new([("temp", vec![10.0, 20.0, 30.0])]).unwrap();
/// assert_eq!(drivers.ntimes(), 3);
/// assert_eq!(drivers.at(1).unwrap().get("temp").unwrap(), 20.0);
/// assert_eq!(
///     drivers
///         .interpolate(1.5, DriverInterpolation::Linear)
///         .unwrap()
///         .get("temp")
///         .unwrap(),
///     25.0
/// );
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(
    try_from = "BTreeMap<String, Vec<f64>>",
    into = "BTreeMap<String, Vec<f64>>"
)]
pub struct DriverSeries {
    drivers: BTreeMap<String, Vec<f64>>,
    ntimes: usize,
}

impl DriverSeries {
    /// Create a driver series, checking that every driver has the same length
    pub fn new<S: Into<String>>(
        drivers: impl IntoIterator<Item = (S, Vec<f64>)>,
    ) -> Result<Self, SimError> {
        let drivers: BTreeMap<String, Vec<f64>> = drivers
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .collect();

        let mut ntimes = 0;
        if let Some((reference, first)) = drivers.iter().next() {
            ntimes = first.len();
            for (name, values) in &drivers {
                if values.len() != ntimes {
                    return Err(SimError::DriverLengthMismatch {
                        name: name.clone(),
                        len: values.len(),
                        reference: reference.clone(),
                        expected: ntimes,
                    });
                }
            }
        }

        Ok(DriverSeries { drivers, ntimes })
    }

    /// Number of available time points
    pub fn ntimes(&self) -> usize {
        self.ntimes
    }

    /// Names of all drivers, sorted
    pub fn names(&self) -> Vec<String> {
        self.drivers.keys().cloned().collect()
    }

    /// All samples of one driver
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.drivers.get(name).map(|values| values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Driver values at a native time index
    ///
    /// Fails with [SimError::IndexOutOfRange] if `index >= ntimes`.
    pub fn at(&self, index: usize) -> Result<QuantityMap, SimError> {
        if index >= self.ntimes {
            return Err(SimError::IndexOutOfRange {
                index: index as f64,
                ntimes: self.ntimes,
            });
        }
        Ok(self
            .drivers
            .iter()
            .map(|(name, values)| (name.as_str(), values[index]))
            .collect())
    }

    /// Driver values at a continuous time index
    ///
    /// Integral times return the native samples exactly. Between samples the
    /// value depends on `method`; the same bounding index is used for every
    /// driver.
    pub fn interpolate(
        &self,
        time: f64,
        method: DriverInterpolation,
    ) -> Result<QuantityMap, SimError> {
        let last = self.ntimes.saturating_sub(1) as f64;
        if self.ntimes == 0 || !(time >= 0.0) || time > last + END_TOLERANCE {
            return Err(SimError::IndexOutOfRange {
                index: time,
                ntimes: self.ntimes,
            });
        }

        let time = time.min(last);
        let lower = time.floor() as usize;
        if time == lower as f64 {
            return self.at(lower);
        }

        let fraction = time - lower as f64;
        Ok(self
            .drivers
            .iter()
            .map(|(name, values)| {
                let value = match method {
                    DriverInterpolation::Floor => values[lower],
                    DriverInterpolation::Linear => {
                        values[lower] + fraction * (values[lower + 1] - values[lower])
                    }
                };
                (name.as_str(), value)
            })
            .collect())
    }
}

impl TryFrom<BTreeMap<String, Vec<f64>>> for DriverSeries {
    type Error = SimError;

    fn try_from(drivers: BTreeMap<String, Vec<f64>>) -> Result<Self, Self::Error> {
        DriverSeries::new(drivers)
    }
}

impl From<DriverSeries> for BTreeMap<String, Vec<f64>> {
    fn from(series: DriverSeries) -> Self {
        series.drivers
    }
}

impl fmt::Display for DriverSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Drivers ({} time points):", self.ntimes)?;
        for name in self.drivers.keys() {
            writeln!(f, "  {}", name)?;
        }
        Ok(())
    }
}
