use biosim::*;
use criterion::black_box;
use criterion::{criterion_group, criterion_main, Criterion};

fn harmonic_system(ntimes: usize) -> DynamicalSystem {
    DynamicalSystem::new(
        QuantityMap::from([("position", 1.0), ("velocity", 0.0)]),
        QuantityMap::from([("mass", 10.0), ("spring_constant", 0.1)]),
        DriverSeries::new([("doy", (0..ntimes).map(|i| i as f64).collect())]).unwrap(),
        &standard_library().retrieve_all(&["harmonic_energy"]).unwrap(),
        &standard_library()
            .retrieve_all(&["harmonic_oscillator"])
            .unwrap(),
    )
    .unwrap()
}

fn solver(name: &str) {
    let mut system = harmonic_system(8760);
    let mut solver = create_solver(name, SolverConfig::default()).unwrap();
    black_box(solver.integrate(&mut system).unwrap());
}

fn evaluation() {
    let mut system = harmonic_system(2);
    let state = DVector::from_vec(vec![0.5, -0.2]);
    black_box(system.evaluate(0.5, &state).unwrap());
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("evaluate", |b| b.iter(evaluation));
    c.bench_function("euler year", |b| b.iter(|| solver("euler")));
    c.bench_function("rk4 year", |b| b.iter(|| solver("rk4")));
    c.bench_function("rkck54 year", |b| b.iter(|| solver("rkck54")));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
