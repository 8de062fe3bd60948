use biosim::*;

const NUMBER_OF_TIMEPOINTS: usize = 100;
const DRIVER_NAME: &str = "some_driver";

fn sequence(length: usize) -> Vec<f64> {
    (0..length).map(|i| i as f64).collect()
}

fn initial_state() -> QuantityMap {
    QuantityMap::from([("position", 0.0), ("velocity", 1.0)])
}

fn harmonic_system() -> DynamicalSystem {
    DynamicalSystem::new(
        initial_state(),
        QuantityMap::from([("mass", 10.0), ("spring_constant", 0.1), ("timestep", 1.0)]),
        DriverSeries::new([(DRIVER_NAME, sequence(NUMBER_OF_TIMEPOINTS))]).unwrap(),
        &[],
        &standard_library()
            .retrieve_all(&["harmonic_oscillator"])
            .unwrap(),
    )
    .unwrap()
}

fn solver_config() -> SolverConfig {
    SolverConfig::new(1.0, 1e-4, 1e-4, 200)
}

#[test]
fn ntimes_follows_driver_length() {
    assert_eq!(harmonic_system().ntimes(), NUMBER_OF_TIMEPOINTS);
}

#[test]
fn harmonic_system_does_not_require_euler() {
    assert!(!harmonic_system().requires_euler_ode_solver());
}

#[test]
fn differential_quantities_start_at_initial_state() {
    let system = harmonic_system();
    let values = system.differential_quantities().unwrap();
    let state = initial_state();
    for (name, value) in system.differential_quantity_names().iter().zip(values) {
        assert_eq!(value, state.get(name).unwrap());
    }
}

#[test]
fn euler_takes_one_step_per_interval() {
    let mut system = harmonic_system();
    let mut solver = create_solver("euler", solver_config()).unwrap();
    assert_eq!(solver.integrate_report(), "The ode_solver has not been called yet");

    let result = solver.integrate(&mut system).unwrap();
    let report = solver.integrate_report();
    assert!(!report.contains("The ode_solver has not been called yet"));
    assert!(report.starts_with(&format!(
        "The euler solver required {} steps to integrate the system\n",
        NUMBER_OF_TIMEPOINTS - 1
    )));
    assert_eq!(result.nrows(), NUMBER_OF_TIMEPOINTS);
    assert_eq!(
        result.names(),
        vec!["position", "some_driver", "time_index", "velocity"]
    );

    // Integrating the same system again starts over from the initial state
    let again = solver.integrate(&mut system).unwrap();
    assert_eq!(again, result);
    assert!(solver.integrate_report().starts_with(&format!(
        "The euler solver required {} steps",
        NUMBER_OF_TIMEPOINTS - 1
    )));
}

#[test]
fn euler_matches_explicit_recurrence() {
    let mut system = harmonic_system();
    let result = Euler::new(solver_config()).integrate(&mut system).unwrap();

    let (mut x, mut v) = (0.0_f64, 1.0_f64);
    for row in 0..NUMBER_OF_TIMEPOINTS {
        assert_eq!(result.value("position", row).unwrap(), x);
        assert_eq!(result.value("velocity", row).unwrap(), v);
        assert_eq!(result.value("time_index", row).unwrap(), row as f64);
        assert_eq!(result.value(DRIVER_NAME, row).unwrap(), row as f64);
        let (dx, dv) = (v, -0.1 * x / 10.0);
        x += dx;
        v += dv;
    }
}

#[test]
fn single_time_point_gives_single_row() {
    let mut system = DynamicalSystem::new(
        initial_state(),
        QuantityMap::from([("mass", 10.0), ("spring_constant", 0.1)]),
        DriverSeries::new([(DRIVER_NAME, vec![0.0])]).unwrap(),
        &[],
        &standard_library()
            .retrieve_all(&["harmonic_oscillator"])
            .unwrap(),
    )
    .unwrap();

    for name in solver_names() {
        let mut solver = create_solver(name, solver_config()).unwrap();
        let result = solver.integrate(&mut system).unwrap();
        assert_eq!(result.nrows(), 1, "solver {}", name);
        assert_eq!(result.value("position", 0).unwrap(), 0.0);
    }
}

#[test]
fn steady_state_outputs_are_recorded() {
    let mut simulation = Simulation::from_names(
        standard_library(),
        QuantityMap::from([("position", 1.0), ("velocity", 0.0)]),
        QuantityMap::from([("mass", 1.0), ("spring_constant", 0.01)]),
        DriverSeries::new([(DRIVER_NAME, sequence(50))]).unwrap(),
        &["harmonic_energy"],
        &["harmonic_oscillator"],
        "rkck54",
        SolverConfig::new(1.0, 1e-8, 1e-8, 500),
    )
    .unwrap();

    let result = simulation.run().unwrap();
    // The adaptive solver keeps the energy of the undamped oscillator
    for &energy in result.column("total_energy").unwrap() {
        assert!((energy - 0.005).abs() < 1e-6, "energy drifted to {}", energy);
    }
    assert_eq!(simulation.system().output_quantity_names().len(), 6);
}
