//! Time integration of the closed-loop dynamics.
//!
//! Two schemes: an adaptive Dormand-Prince 5(4) pair with step-size
//! control, and a fixed-step explicit Euler fallback. Both advance the
//! flat state between breakpoints; the caller owns the breakpoint grid
//! and the derivative evaluation.

use nalgebra::DVector;

use crate::error::SimulatorError;
use crate::options::{Solver, StepperOptions};

/// Step size below which the adaptive controller gives up.
const STEP_UNDERFLOW: f64 = 1.0e-12;

/// Step-size growth and shrink bounds of the PI-free controller.
const SHRINK_MIN: f64 = 0.2;
const GROW_MAX: f64 = 5.0;
const SAFETY: f64 = 0.9;

// Dormand-Prince 5(4) tableau.
const C: [f64; 6] = [1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];
const A2: [f64; 1] = [1.0 / 5.0];
const A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
const A4: [f64; 3] = [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0];
const A5: [f64; 4] = [
    19372.0 / 6561.0,
    -25360.0 / 2187.0,
    64448.0 / 6561.0,
    -212.0 / 729.0,
];
const A6: [f64; 5] = [
    9017.0 / 3168.0,
    -355.0 / 33.0,
    46732.0 / 5247.0,
    49.0 / 176.0,
    -5103.0 / 18656.0,
];
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];
// b - b*: weights of the embedded error estimate.
const E: [f64; 7] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

/// Derivative evaluation: fill `dx` with the state derivative at `(t, x)`.
pub(crate) trait Derivative {
    /// Evaluate the derivative.
    fn eval(&mut self, t: f64, x: &DVector<f64>, dx: &mut DVector<f64>)
        -> Result<(), SimulatorError>;
}

impl<F> Derivative for F
where
    F: FnMut(f64, &DVector<f64>, &mut DVector<f64>) -> Result<(), SimulatorError>,
{
    fn eval(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        dx: &mut DVector<f64>,
    ) -> Result<(), SimulatorError> {
        self(t, x, dx)
    }
}

/// Integrator state carried across breakpoints within one run.
#[derive(Debug)]
pub(crate) struct Stepper {
    solver: Solver,
    tol_rel: f64,
    tol_abs: f64,
    dt_max: f64,
    /// Current adaptive step size proposal.
    h: f64,
    /// Budget of attempted steps left in this run.
    budget: i64,
    limit: i64,
    /// First-same-as-last derivative cache, valid at the current state.
    fsal: Option<DVector<f64>>,
    k: [DVector<f64>; 7],
    scratch: DVector<f64>,
    x5: DVector<f64>,
}

impl Stepper {
    /// Fresh integrator for one run over a state of dimension `nx`.
    pub fn new(options: &StepperOptions, nx: usize) -> Self {
        Self {
            solver: options.solver,
            tol_rel: options.tol_rel,
            tol_abs: options.tol_abs,
            dt_max: options.dt_max,
            h: options.dt_max,
            budget: options.iter_max,
            limit: options.iter_max,
            fsal: None,
            k: std::array::from_fn(|_| DVector::zeros(nx)),
            scratch: DVector::zeros(nx),
            x5: DVector::zeros(nx),
        }
    }

    /// Advance `x` from `t0` to `t1` in place.
    pub fn advance<D: Derivative>(
        &mut self,
        f: &mut D,
        t0: f64,
        t1: f64,
        x: &mut DVector<f64>,
    ) -> Result<(), SimulatorError> {
        match self.solver {
            Solver::ExplicitEuler => self.advance_euler(f, t0, t1, x),
            Solver::RungeKuttaDopri5 => self.advance_dopri5(f, t0, t1, x),
        }
    }

    fn spend(&mut self) -> Result<(), SimulatorError> {
        if self.budget == 0 {
            return Err(SimulatorError::IterationLimit { limit: self.limit });
        }
        self.budget -= 1;
        Ok(())
    }

    fn advance_euler<D: Derivative>(
        &mut self,
        f: &mut D,
        t0: f64,
        t1: f64,
        x: &mut DVector<f64>,
    ) -> Result<(), SimulatorError> {
        let mut t = t0;
        loop {
            let remaining = t1 - t;
            if remaining <= STEP_UNDERFLOW * t.abs().max(1.0) {
                return Ok(());
            }
            self.spend()?;
            let h = self.dt_max.min(remaining);
            f.eval(t, x, &mut self.k[0])?;
            x.axpy(h, &self.k[0], 1.0);
            t += h;
        }
    }

    fn advance_dopri5<D: Derivative>(
        &mut self,
        f: &mut D,
        t0: f64,
        t1: f64,
        x: &mut DVector<f64>,
    ) -> Result<(), SimulatorError> {
        let mut t = t0;
        // Controller state crosses breakpoints, the derivative does not:
        // the command held by the caller changes at breakpoints, so any
        // cached end-of-step derivative is stale here.
        self.fsal = None;

        loop {
            let remaining = t1 - t;
            if remaining <= STEP_UNDERFLOW * t.abs().max(1.0) {
                return Ok(());
            }
            self.spend()?;
            let h = self.h.min(self.dt_max).min(remaining);
            if h < STEP_UNDERFLOW * t.abs().max(1.0) {
                return Err(SimulatorError::StepFailure { time: t, step: h });
            }

            match self.fsal.take() {
                Some(k1) => self.k[0] = k1,
                None => f.eval(t, x, &mut self.k[0])?,
            }

            self.stage(f, t + C[0] * h, h, x, &A2, 1)?;
            self.stage(f, t + C[1] * h, h, x, &A3, 2)?;
            self.stage(f, t + C[2] * h, h, x, &A4, 3)?;
            self.stage(f, t + C[3] * h, h, x, &A5, 4)?;
            self.stage(f, t + C[4] * h, h, x, &A6, 5)?;

            // Fifth-order solution, which doubles as the a7 row.
            self.x5.copy_from(x);
            for (i, b) in B.iter().enumerate() {
                if *b != 0.0 {
                    self.x5.axpy(h * b, &self.k[i], 1.0);
                }
            }
            f.eval(t + h, &self.x5, &mut self.k[6])?;

            // Scaled RMS of the embedded error estimate.
            let n = x.len();
            let mut acc = 0.0;
            for j in 0..n {
                let mut e = 0.0;
                for (i, w) in E.iter().enumerate() {
                    e += w * self.k[i][j];
                }
                e *= h;
                let scale = self.tol_abs + self.tol_rel * x[j].abs().max(self.x5[j].abs());
                acc += (e / scale) * (e / scale);
            }
            let err = (acc / n as f64).sqrt();

            if err <= 1.0 {
                t += h;
                x.copy_from(&self.x5);
                self.fsal = Some(self.k[6].clone());
            }

            let factor = if err == 0.0 {
                GROW_MAX
            } else {
                (SAFETY * err.powf(-0.2)).clamp(SHRINK_MIN, GROW_MAX)
            };
            self.h = (h * factor).min(self.dt_max);
        }
    }

    /// One intermediate stage: `k[stage] = f(ts, x + h * sum(a_i k_i))`.
    fn stage<D: Derivative>(
        &mut self,
        f: &mut D,
        ts: f64,
        h: f64,
        x: &DVector<f64>,
        a: &[f64],
        stage: usize,
    ) -> Result<(), SimulatorError> {
        self.scratch.copy_from(x);
        for (i, coeff) in a.iter().enumerate() {
            if *coeff != 0.0 {
                self.scratch.axpy(h * coeff, &self.k[i], 1.0);
            }
        }
        f.eval(ts, &self.scratch, &mut self.k[stage])
    }
}

// ── Tests ──────────────────────────────────────────────────────────
