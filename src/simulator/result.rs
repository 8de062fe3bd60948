use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::{QuantityMap, SimError};

/// Name of the column holding the time index of each row
pub const TIME_INDEX: &str = "time_index";

/// Time series produced by integrating a [DynamicalSystem](crate::DynamicalSystem)
///
/// One column per recorded quantity plus [TIME_INDEX]. Columns are kept in
/// sorted name order and all have the same length.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct SimulationResult {
    columns: BTreeMap<String, Vec<f64>>,
}

impl SimulationResult {
    /// Create an empty result recording `names`
    pub fn new(names: Vec<String>) -> Self {
        let mut columns: BTreeMap<String, Vec<f64>> =
            names.into_iter().map(|name| (name, Vec::new())).collect();
        columns.insert(TIME_INDEX.to_string(), Vec::new());
        SimulationResult { columns }
    }

    /// Append a row, taking every column but [TIME_INDEX] from `quantities`
    ///
    /// The row is only added if every column can be filled.
    pub fn push_row(&mut self, time_index: f64, quantities: &QuantityMap) -> Result<(), SimError> {
        let mut row = Vec::with_capacity(self.columns.len());
        for name in self.columns.keys() {
            let value = if name == TIME_INDEX {
                time_index
            } else {
                quantities.get(name)?
            };
            row.push(value);
        }
        for (column, value) in self.columns.values_mut().zip(row) {
            column.push(value);
        }
        Ok(())
    }

    /// Column names, sorted
    pub fn names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    pub fn nrows(&self) -> usize {
        self.columns.get(TIME_INDEX).map_or(0, |column| column.len())
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Result<&[f64], SimError> {
        self.columns
            .get(name)
            .map(|column| column.as_slice())
            .ok_or_else(|| SimError::quantity_not_found(name))
    }

    pub fn value(&self, name: &str, row: usize) -> Result<f64, SimError> {
        let column = self.column(name)?;
        column
            .get(row)
            .copied()
            .ok_or(SimError::IndexOutOfRange {
                index: row as f64,
                ntimes: column.len(),
            })
    }

    /// The time index of every row
    pub fn time_index(&self) -> &[f64] {
        self.columns
            .get(TIME_INDEX)
            .map(|column| column.as_slice())
            .unwrap_or_default()
    }

    /// All quantities of one row
    pub fn row(&self, row: usize) -> Result<QuantityMap, SimError> {
        self.columns
            .keys()
            .map(|name| Ok((name.as_str(), self.value(name, row)?)))
            .collect::<Result<Vec<_>, SimError>>()
            .map(|values| values.into_iter().collect())
    }

    /// Values as a matrix with one row per time point and one column per
    /// name, in [names](SimulationResult::names) order
    pub fn to_matrix(&self) -> Array2<f64> {
        let nrows = self.nrows();
        let mut matrix = Array2::zeros((nrows, self.ncols()));
        for (j, column) in self.columns.values().enumerate() {
            for (i, value) in column.iter().enumerate().take(nrows) {
                matrix[[i, j]] = *value;
            }
        }
        matrix
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "SimulationResult ({} rows x {} columns):",
            self.nrows(),
            self.ncols()
        )?;
        for (name, column) in &self.columns {
            match (column.first(), column.last()) {
                (Some(first), Some(last)) => {
                    writeln!(f, "  {}: {} .. {}", name, first, last)?
                }
                _ => writeln!(f, "  {}: (empty)", name)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> SimulationResult {
        let mut result = SimulationResult::new(vec!["b".to_string(), "a".to_string()]);
        result
            .push_row(0.0, &QuantityMap::from([("a", 1.0), ("b", 2.0), ("c", 9.0)]))
            .unwrap();
        result
            .push_row(1.0, &QuantityMap::from([("a", 3.0), ("b", 4.0)]))
            .unwrap();
        result
    }

    #[test]
    fn test_columns_are_sorted_and_include_time_index() {
        assert_eq!(result().names(), vec!["a", "b", "time_index"]);
    }

    #[test]
    fn test_incomplete_row_is_rejected_whole() {
        let mut result = result();
        assert!(result.push_row(2.0, &QuantityMap::from([("a", 5.0)])).is_err());
        assert_eq!(result.nrows(), 2);
        assert_eq!(result.column("a").unwrap().len(), 2);
    }

    #[test]
    fn test_value_lookup() {
        let result = result();
        assert_eq!(result.value("b", 1).unwrap(), 4.0);
        assert_eq!(result.time_index(), &[0.0, 1.0]);
        assert!(matches!(
            result.value("b", 2),
            Err(SimError::IndexOutOfRange { ntimes: 2, .. })
        ));
        assert!(matches!(
            result.value("c", 0),
            Err(SimError::QuantityNotFound { .. })
        ));
        assert_eq!(result.row(0).unwrap().get("time_index").unwrap(), 0.0);
    }

    #[test]
    fn test_matrix_layout() {
        let matrix = result().to_matrix();
        assert_eq!(matrix.shape(), &[2, 3]);
        assert_eq!(matrix[[1, 0]], 3.0);
        assert_eq!(matrix[[1, 2]], 1.0);
    }

    #[test]
    fn test_json_keeps_columns() {
        let result = result();
        let json = result.to_json().unwrap();
        assert_eq!(json, r#"{"a":[1.0,3.0],"b":[2.0,4.0],"time_index":[0.0,1.0]}"#);
        assert_eq!(SimulationResult::from_json(&json).unwrap(), result);
    }
}
