use std::io;
use std::path::Path;

use crate::{simulator::SimulationResult, DriverSeries, SimError};

/// Read driver data from a CSV file
///
/// The file has one header row with the driver names and one row per time
/// point. Lines starting with `#` are ignored.
///
/// # Example
///
/// ```rust,no_run
/// use biosim::read_drivers;
///
/// let drivers = read_drivers("weather_2023.csv").unwrap();
/// println!("Number of time points: {}", drivers.ntimes());
/// ```
pub fn read_drivers(path: impl AsRef<Path>) -> Result<DriverSeries, SimError> {
    let file = std::fs::File::open(path)?;
    read_drivers_from(file)
}

/// Read driver data in CSV format from any reader
pub fn read_drivers_from<R: io::Read>(reader: R) -> Result<DriverSeries, SimError> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(b'#'))
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let names: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];

    for row in reader.deserialize() {
        let row: Vec<f64> = row?;
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }

    DriverSeries::new(names.into_iter().zip(columns))
}

/// Write a simulation result to a CSV file, one column per quantity
pub fn write_result(path: impl AsRef<Path>, result: &SimulationResult) -> Result<(), SimError> {
    let file = std::fs::File::create(path)?;
    write_result_to(file, result)
}

/// Write a simulation result in CSV format to any writer
pub fn write_result_to<W: io::Write>(writer: W, result: &SimulationResult) -> Result<(), SimError> {
    let mut writer = csv::WriterBuilder::new().from_writer(writer);
    let names = result.names();
    writer.write_record(&names)?;

    for row in 0..result.nrows() {
        let record = names
            .iter()
            .map(|name| result.value(name, row).map(|value| value.to_string()))
            .collect::<Result<Vec<String>, SimError>>()?;
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuantityMap;

    #[test]
    fn test_read_drivers_from_csv() {
        let data = "\
# hourly weather
time, temp, rh
0, 12.5, 0.8
1, 13.0, 0.75
2, 14.5, 0.7
";
        let drivers = read_drivers_from(data.as_bytes()).unwrap();
        assert_eq!(drivers.ntimes(), 3);
        assert_eq!(drivers.names(), vec!["rh", "temp", "time"]);
        assert_eq!(drivers.get("temp").unwrap(), &[12.5, 13.0, 14.5]);
    }

    #[test]
    fn test_read_drivers_rejects_non_numeric() {
        let data = "temp\n12.5\nwarm\n";
        assert!(matches!(
            read_drivers_from(data.as_bytes()),
            Err(SimError::Csv(_))
        ));
    }

    #[test]
    fn test_write_result_round_trips_through_drivers() {
        let mut result = SimulationResult::new(vec!["position".into(), "velocity".into()]);
        result
            .push_row(0.0, &QuantityMap::from([("position", 0.0), ("velocity", 1.0)]))
            .unwrap();
        result
            .push_row(1.0, &QuantityMap::from([("position", 1.0), ("velocity", 0.99)]))
            .unwrap();

        let mut buffer = Vec::new();
        write_result_to(&mut buffer, &result).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("position,time_index,velocity\n"));

        let drivers = read_drivers_from(text.as_bytes()).unwrap();
        assert_eq!(drivers.get("velocity").unwrap(), &[1.0, 0.99]);
    }
}
