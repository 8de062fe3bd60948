use std::f64::consts::PI;

use crate::module::{Module, ModuleDefinition, ModuleKind, ModuleOutput};
use crate::{QuantityMap, SimError};

/// Position of the sun following Michalsky (1988), "The Astronomical
/// Almanac's algorithm for approximate solar position (1950-2050)".
///
/// Inputs:
/// - `lat`, `longitude`: degrees, north and east positive
/// - `time`: local standard time as fractional day of year
/// - `time_zone_offset`: hours relative to UTC
/// - `year`
///
/// The reported angle is geometric; no refraction correction is applied.
#[derive(Default)]
pub struct SolarPositionMichalsky;

impl ModuleDefinition for SolarPositionMichalsky {
    const NAME: &'static str = "solar_position_michalsky";
    const KIND: ModuleKind = ModuleKind::SteadyState;
    const INPUTS: &'static [&'static str] =
        &["lat", "longitude", "time", "time_zone_offset", "year"];
    const OUTPUTS: &'static [&'static str] = &["cosine_zenith_angle"];
}

impl Module for SolarPositionMichalsky {
    fn run(&self, q: &QuantityMap, out: &mut ModuleOutput<'_>) -> Result<(), SimError> {
        let lat = q.get("lat")?;
        let longitude = q.get("longitude")?;
        let time = q.get("time")?;
        let time_zone_offset = q.get("time_zone_offset")?;
        let year = q.get("year")?;

        let elevation = solar_elevation(lat, longitude, time, time_zone_offset, year);
        out.update("cosine_zenith_angle", (PI / 2.0 - elevation).cos())
    }
}

/// Geometric solar elevation in radians
fn solar_elevation(lat: f64, longitude: f64, time: f64, time_zone_offset: f64, year: f64) -> f64 {
    let doy = time.floor();
    let hour_utc = 24.0 * (time - doy) - time_zone_offset;

    // Julian date offset by 2400000, then days from 2000-01-01 12:00 UT
    let delta = year - 1949.0;
    let leap = (delta / 4.0).floor();
    let jd = 32916.5 + delta * 365.0 + leap + doy + hour_utc / 24.0;
    let n = jd - 51545.0;

    // Ecliptic coordinates
    let mean_longitude = (280.460 + 0.9856474 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.9856003 * n).rem_euclid(360.0).to_radians();
    let ecliptic_longitude = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .rem_euclid(360.0)
    .to_radians();
    let obliquity = (23.439 - 0.0000004 * n).to_radians();

    // Celestial coordinates
    let mut right_ascension = (obliquity.cos() * ecliptic_longitude.sin())
        .atan2(ecliptic_longitude.cos());
    if right_ascension < 0.0 {
        right_ascension += 2.0 * PI;
    }
    let declination = (obliquity.sin() * ecliptic_longitude.sin()).asin();

    // Local coordinates
    let gmst = (6.697375 + 0.0657098242 * n + hour_utc).rem_euclid(24.0);
    let lmst = (gmst + longitude / 15.0).rem_euclid(24.0);
    let mut hour_angle = (lmst * 15.0).to_radians() - right_ascension;
    if hour_angle < -PI {
        hour_angle += 2.0 * PI;
    } else if hour_angle > PI {
        hour_angle -= 2.0 * PI;
    }

    let lat = lat.to_radians();
    (declination.sin() * lat.sin() + declination.cos() * lat.cos() * hour_angle.cos()).asin()
}
