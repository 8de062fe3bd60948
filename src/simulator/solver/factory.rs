use lazy_static::lazy_static;
use std::collections::BTreeMap;

use crate::simulator::solver::{Auto, Euler, OdeSolver, Rk4, RkCashKarp54, SolverConfig};
use crate::SimError;

type SolverConstructor = fn(SolverConfig) -> Box<dyn OdeSolver>;

lazy_static! {
    static ref SOLVERS: BTreeMap<&'static str, SolverConstructor> = {
        let mut solvers: BTreeMap<&'static str, SolverConstructor> = BTreeMap::new();
        solvers.insert("auto", |config| Box::new(Auto::new(config)));
        solvers.insert("euler", |config| Box::new(Euler::new(config)));
        solvers.insert("rk4", |config| Box::new(Rk4::new(config)));
        solvers.insert("rkck54", |config| Box::new(RkCashKarp54::new(config)));
        solvers
    };
}

/// Create a solver by name, validating its configuration
///
/// ```
/// use biosim::*;
///
/// let solver = create_solver("rkck54", SolverConfig::default()).unwrap();
/// assert_eq!(solver.name(), "rkck54");
/// assert!(create_solver("leapfrog", SolverConfig::default()).is_err());
/// ```
pub fn create_solver(name: &str, config: SolverConfig) -> Result<Box<dyn OdeSolver>, SimError> {
    let constructor = SOLVERS
        .get(name)
        .ok_or_else(|| SimError::SolverNotFound(name.to_string()))?;
    config.validate()?;
    Ok(constructor(config))
}

/// Names accepted by [create_solver], sorted
pub fn solver_names() -> Vec<&'static str> {
    SOLVERS.keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_registered_solver_reports_its_name() {
        for name in solver_names() {
            let solver = create_solver(name, SolverConfig::default()).unwrap();
            assert_eq!(solver.name(), name);
        }
        assert_eq!(solver_names(), vec!["auto", "euler", "rk4", "rkck54"]);
    }

    #[test]
    fn test_unknown_solver() {
        assert!(matches!(
            create_solver("boost_rosenbrock", SolverConfig::default()),
            Err(SimError::SolverNotFound(name)) if name == "boost_rosenbrock"
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SolverConfig {
            max_steps: 0,
            ..Default::default()
        };
        assert!(matches!(
            create_solver("euler", config),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
