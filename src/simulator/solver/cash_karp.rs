use tracing::{debug, trace, warn};

use crate::simulator::solver::{
    finish, prepare, IntegrationReport, OdeSolver, SolverConfig, SolverStatus,
};
use crate::simulator::{DynamicalSystem, SimulationResult, T, V};
use crate::SimError;

// Cash-Karp tableau
const C: [T; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0];
const A2: [T; 1] = [1.0 / 5.0];
const A3: [T; 2] = [3.0 / 40.0, 9.0 / 40.0];
const A4: [T; 3] = [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0];
const A5: [T; 4] = [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0];
const A6: [T; 5] = [
    1631.0 / 55296.0,
    175.0 / 512.0,
    575.0 / 13824.0,
    44275.0 / 110592.0,
    253.0 / 4096.0,
];
/// Fifth-order weights
const B5: [T; 6] = [
    37.0 / 378.0,
    0.0,
    250.0 / 621.0,
    125.0 / 594.0,
    0.0,
    512.0 / 1771.0,
];
/// Embedded fourth-order weights
const B4: [T; 6] = [
    2825.0 / 27648.0,
    0.0,
    18575.0 / 48384.0,
    13525.0 / 55296.0,
    277.0 / 14336.0,
    1.0 / 4.0,
];

const SAFETY: T = 0.9;
const MIN_SHRINK: T = 0.2;
const MAX_GROWTH: T = 5.0;

/// Adaptive Runge-Kutta Cash-Karp 5(4)
///
/// Steps are accepted when the scaled error estimate
/// `|err_i| / (atol + rtol * (|y_i| + dt * |dy_i|))` is at most one for every
/// component. Rows are recorded every `output_step_size` time indices; the
/// step is shortened to land on each of them.
#[derive(Clone, Debug, Default)]
pub struct RkCashKarp54 {
    config: SolverConfig,
    status: SolverStatus,
}

/// Result of a single trial step
struct Trial {
    state: V,
    error: T,
}

impl RkCashKarp54 {
    pub fn new(config: SolverConfig) -> Self {
        RkCashKarp54 {
            config,
            status: SolverStatus::NotRun,
        }
    }

    fn try_step(
        &self,
        system: &mut DynamicalSystem,
        t: T,
        y: &V,
        k1: &V,
        dt: T,
    ) -> Result<Trial, SimError> {
        let k2 = system.evaluate(t + C[1] * dt, &(y + k1 * (A2[0] * dt)))?;
        let k3 = system.evaluate(t + C[2] * dt, &(y + (k1 * A3[0] + &k2 * A3[1]) * dt))?;
        let k4 = system.evaluate(
            t + C[3] * dt,
            &(y + (k1 * A4[0] + &k2 * A4[1] + &k3 * A4[2]) * dt),
        )?;
        let k5 = system.evaluate(
            t + C[4] * dt,
            &(y + (k1 * A5[0] + &k2 * A5[1] + &k3 * A5[2] + &k4 * A5[3]) * dt),
        )?;
        let k6 = system.evaluate(
            t + C[5] * dt,
            &(y + (k1 * A6[0] + &k2 * A6[1] + &k3 * A6[2] + &k4 * A6[3] + &k5 * A6[4]) * dt),
        )?;

        let stages = [k1, &k2, &k3, &k4, &k5, &k6];
        let mut increment = V::zeros(y.len());
        let mut estimate = V::zeros(y.len());
        for (i, k) in stages.into_iter().enumerate() {
            increment.axpy(B5[i] * dt, k, 1.0);
            estimate.axpy((B5[i] - B4[i]) * dt, k, 1.0);
        }

        Ok(Trial {
            state: y + increment,
            error: self.calculate_error(y, k1, &estimate, dt),
        })
    }

    fn calculate_error(&self, y: &V, dy: &V, estimate: &V, dt: T) -> T {
        let mut err: T = 0.0;
        for i in 0..y.len() {
            let tol = self.config.atol + self.config.rtol * (y[i].abs() + dt * dy[i].abs());
            err = err.max(estimate[i].abs() / tol);
        }
        err
    }

    fn compute_new_step(&self, dt: T, error: T) -> T {
        if error > 1.0 {
            dt * (SAFETY * error.powf(-1.0 / 3.0)).max(MIN_SHRINK)
        } else if error < 0.5 {
            let growth = if error == 0.0 {
                MAX_GROWTH
            } else {
                (SAFETY * error.powf(-1.0 / 5.0)).min(MAX_GROWTH)
            };
            dt * growth
        } else {
            dt
        }
    }

    fn run(
        &self,
        system: &mut DynamicalSystem,
        mut y: V,
        mut result: SimulationResult,
    ) -> Result<(SimulationResult, IntegrationReport), SimError> {
        let last = (system.ntimes() - 1) as T;
        let output_step = self.config.output_step_size;
        let intervals = (last / output_step + 1e-9).floor() as usize;

        let mut t: T = 0.0;
        let mut dt = output_step.min(1.0);
        let mut steps = 0;
        let mut rejected = 0;
        // Slope at (t, y), kept across rejected trials
        let mut k1: Option<V> = None;

        system.update(t, &y)?;
        result.push_row(t, system.quantities())?;

        for k in 1..=intervals {
            let target = (k as T * output_step).min(last);
            let mut attempts = 0;

            while t < target {
                if attempts >= self.config.max_steps {
                    warn!(
                        max_steps = self.config.max_steps,
                        time = t,
                        target,
                        "adaptive step budget exhausted"
                    );
                    return Err(SimError::ToleranceNotMet {
                        max_steps: self.config.max_steps,
                        time: target,
                    });
                }
                attempts += 1;

                let remaining = target - t;
                let h = dt.min(remaining);
                let slope = match k1.take() {
                    Some(slope) => slope,
                    None => system.evaluate(t, &y)?,
                };
                let trial = self.try_step(system, t, &y, &slope, h)?;

                if trial.error <= 1.0 {
                    steps += 1;
                    trace!(time = t, step = h, error = trial.error, "step accepted");
                    y = trial.state;
                    // Land exactly on the output time
                    t = if h >= remaining { target } else { t + h };
                    // Steps clipped to an output time do not shrink dt
                    let proposed = self.compute_new_step(h, trial.error);
                    dt = if h < dt { dt.max(proposed) } else { proposed };
                } else {
                    rejected += 1;
                    k1 = Some(slope);
                    dt = self.compute_new_step(h, trial.error);
                    debug!(time = t, step = h, error = trial.error, "step rejected");
                    if t + dt <= t {
                        return Err(SimError::ToleranceNotMet {
                            max_steps: self.config.max_steps,
                            time: target,
                        });
                    }
                }
            }

            system.update(t, &y)?;
            result.push_row(t, system.quantities())?;
        }

        let report = IntegrationReport {
            solver: self.name().to_string(),
            steps,
            rejected_steps: rejected,
            evaluations: system.evaluation_count(),
            rows: result.nrows(),
            final_time: t,
        };
        Ok((result, report))
    }
}

impl OdeSolver for RkCashKarp54 {
    fn name(&self) -> &str {
        "rkck54"
    }

    fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn status(&self) -> &SolverStatus {
        &self.status
    }

    fn integrate(&mut self, system: &mut DynamicalSystem) -> Result<SimulationResult, SimError> {
        let outcome =
            prepare(&*self, system).and_then(|(state, result)| self.run(system, state, result));
        finish(&mut self.status, "rkck54", outcome)
    }
}
