use biosim::*;
use rand::Rng;

#[test]
fn derivative_module_with_random_inputs() {
    let mut rng = rand::rng();
    let creator = standard_library().retrieve("harmonic_oscillator").unwrap();

    for _ in 0..20 {
        let quantities = QuantityMap::from([
            ("position", rng.random_range(-100.0..100.0)),
            ("velocity", rng.random_range(-100.0..100.0)),
            // Mass and spring constant must be positive
            ("mass", rng.random_range(1e-5..100.0)),
            ("spring_constant", rng.random_range(1e-5..100.0)),
        ]);

        let outputs = evaluate_module(creator.as_ref(), &quantities).unwrap();
        let get = |name: &str| quantities.get(name).unwrap();

        assert_eq!(outputs.get("position").unwrap(), get("velocity"));
        assert_eq!(
            outputs.get("velocity").unwrap(),
            -get("spring_constant") * get("position") / get("mass")
        );
    }
}

#[test]
fn steady_state_module_at_sunrise() {
    // Urbana, Illinois (40.0932N 88.20175W) at 5:48 CDT on July 19, 2023,
    // the published sunrise time
    let quantities = QuantityMap::from([
        ("lat", 40.0932),
        ("longitude", -88.20175),
        ("time", 200.0 + 5.0 / 24.0 + 48.0 / 60.0 / 24.0),
        ("time_zone_offset", -5.0),
        ("year", 2023.0),
    ]);
    let creator = standard_library()
        .retrieve("solar_position_michalsky")
        .unwrap();

    let outputs = evaluate_module(creator.as_ref(), &quantities).unwrap();
    let cosine = outputs.get("cosine_zenith_angle").unwrap();
    assert!(cosine.abs() < 1.1e-2, "cosine zenith angle was {}", cosine);
}

#[test]
fn missing_input_is_reported() {
    let creator = standard_library().retrieve("thermal_time_linear").unwrap();
    let result = evaluate_module(
        creator.as_ref(),
        &QuantityMap::from([("temp", 20.0), ("timestep", 1.0)]),
    );
    match result {
        Err(SimError::QuantityNotFound { name }) => assert_eq!(name, "tbase"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn every_library_module_is_retrievable() {
    let names = standard_library().module_names();
    assert_eq!(
        names,
        vec![
            "harmonic_energy",
            "harmonic_oscillator",
            "solar_position_michalsky",
            "thermal_time_linear"
        ]
    );
    for name in names {
        let creator = standard_library().retrieve(&name).unwrap();
        assert_eq!(creator.name(), name);
        assert!(!creator.outputs().is_empty());
    }
}
