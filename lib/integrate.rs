//! Adaptive time integration of the population equations.
//!
//! The network mixes fast spontaneous decay (~A21) with slow optical-pumping
//! accumulation, so a fixed step either wastes time or loses accuracy.
//! Integration is via embedded Runge-Kutta-Fehlberg 4(5) with per-component
//! error control; output at the caller's requested times comes from cubic
//! Hermite interpolation between accepted steps, so the output grid is
//! independent of the internal steps.

use ndarray as nd;
use thiserror::Error;
use crate::hilbert::State;

/// Error tolerances and step limits for the adaptive integrator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StepControl {
    /// Relative error tolerance per component.
    pub rtol: f64,
    /// Absolute error tolerance per component.
    pub atol: f64,
    /// Hard cap on the number of internal steps (accepted or rejected).
    pub max_steps: usize,
}

impl Default for StepControl {
    fn default() -> Self {
        Self { rtol: 1e-8, atol: 1e-10, max_steps: 100_000 }
    }
}

/// Integrated population history, sampled at the requested output times.
///
/// Populations are laid out state × time in [`crate::hilbert::STATES`]
/// order; immutable once produced.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    /// Output times (s).
    pub time: nd::Array1<f64>,
    /// Population of each state at each output time.
    pub pops: nd::Array2<f64>,
}

impl Trajectory {
    /// Population of one state over time.
    pub fn population(&self, state: State) -> nd::ArrayView1<f64> {
        self.pops.row(state.index())
    }

    /// Total population over time; conserved by a well-formed network.
    pub fn total(&self) -> nd::Array1<f64> {
        self.pops.sum_axis(nd::Axis(0))
    }

    /// Population of one state at the last output time.
    pub fn final_population(&self, state: State) -> f64 {
        self.population(state).last().copied().unwrap_or(f64::NAN)
    }

    /// Largest relative drift of the total population from its initial
    /// value. Drift beyond ~1e-6 indicates a mispaired edge in the network,
    /// not integration error.
    pub fn conservation_drift(&self) -> f64 {
        let total = self.total();
        match total.first() {
            None => 0.0,
            Some(&t0) if t0 == 0.0 => 0.0,
            Some(&t0) => {
                total.iter()
                    .map(|t| ((t - t0) / t0).abs())
                    .fold(0.0, f64::max)
            },
        }
    }
}

/// Number of pumping cycles until the retained fraction first falls below
/// `threshold`, for a per-cycle retention fraction `retention`.
pub fn pumping_cycles(retention: f64, threshold: f64) -> f64 {
    threshold.ln() / retention.ln()
}

#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The step budget ran out before reaching the end of the requested
    /// span. Carries the trajectory filled up to the failure point.
    #[error("step budget of {max_steps} exhausted at t = {t:.6e} s")]
    StepLimit {
        t: f64,
        max_steps: usize,
        partial: Trajectory,
    },
    /// Error control drove the step size below the resolvable limit.
    #[error("step size underflow at t = {t:.6e} s")]
    StepUnderflow {
        t: f64,
        partial: Trajectory,
    },
}

impl IntegrationError {
    /// The time the integrator had reached when it gave up.
    pub fn failed_at(&self) -> f64 {
        match self {
            Self::StepLimit { t, .. } => *t,
            Self::StepUnderflow { t, .. } => *t,
        }
    }

    /// The trajectory filled up to the failure point.
    pub fn partial(&self) -> &Trajectory {
        match self {
            Self::StepLimit { partial, .. } => partial,
            Self::StepUnderflow { partial, .. } => partial,
        }
    }
}

fn partial_trajectory(
    t: &nd::Array1<f64>,
    pops: &nd::Array2<f64>,
    filled: usize,
) -> Trajectory
{
    Trajectory {
        time: t.slice(nd::s![..filled]).to_owned(),
        pops: pops.slice(nd::s![.., ..filled]).to_owned(),
    }
}

/// Cubic Hermite interpolant over one accepted step of size `h`, at fraction
/// `s` of the way across.
fn hermite(
    y0: &nd::Array1<f64>,
    f0: &nd::Array1<f64>,
    y1: &nd::Array1<f64>,
    f1: &nd::Array1<f64>,
    h: f64,
    s: f64,
) -> nd::Array1<f64>
{
    let h00 = (1.0 + 2.0 * s) * (1.0 - s).powi(2);
    let h10 = s * (1.0 - s).powi(2);
    let h01 = s.powi(2) * (3.0 - 2.0 * s);
    let h11 = s.powi(2) * (s - 1.0);
    y0 * h00 + f0 * (h * h10) + y1 * h01 + f1 * (h * h11)
}

/// Integrate `y' = rhs(t, y)` from `t[0]`, producing output at every entry
/// of the ascending grid `t`.
///
/// On failure the error carries the partial trajectory and the time reached;
/// nothing is truncated silently.
pub fn integrate<F>(
    rhs: F,
    y0: &nd::Array1<f64>,
    t: &nd::Array1<f64>,
    ctrl: &StepControl,
) -> Result<Trajectory, IntegrationError>
where F: Fn(f64, nd::ArrayView1<f64>) -> nd::Array1<f64>
{
    let n_out = t.len();
    let mut pops: nd::Array2<f64> = nd::Array2::zeros((y0.len(), n_out));
    if n_out == 0 {
        return Ok(Trajectory { time: t.clone(), pops });
    }
    pops.column_mut(0).assign(y0);
    let t0 = t[0];
    let t_end = t[n_out - 1];
    let span = t_end - t0;
    if n_out == 1 || span <= 0.0 {
        return Ok(Trajectory { time: t.clone(), pops });
    }

    let mut tk = t0;
    let mut yk: nd::Array1<f64> = y0.clone();
    let mut fk: nd::Array1<f64> = rhs(tk, yk.view());
    let mut h = span / 1024.0;
    let h_min = span * 1e-14;
    let mut filled: usize = 1;
    let mut steps: usize = 0;
    while filled < n_out {
        if steps >= ctrl.max_steps {
            return Err(IntegrationError::StepLimit {
                t: tk,
                max_steps: ctrl.max_steps,
                partial: partial_trajectory(t, &pops, filled),
            });
        }
        if h < h_min {
            return Err(IntegrationError::StepUnderflow {
                t: tk,
                partial: partial_trajectory(t, &pops, filled),
            });
        }
        steps += 1;
        h = h.min(t_end - tk);

        // Fehlberg 4(5) stages
        let k1 = fk.clone();
        let y2 = &yk + &(&k1 * (h / 4.0));
        let k2 = rhs(tk + h / 4.0, y2.view());
        let y3
            = &yk
            + &(&k1 * (3.0 * h / 32.0))
            + &(&k2 * (9.0 * h / 32.0));
        let k3 = rhs(tk + 3.0 * h / 8.0, y3.view());
        let y4s
            = &yk
            + &(&k1 * (1932.0 * h / 2197.0))
            - &(&k2 * (7200.0 * h / 2197.0))
            + &(&k3 * (7296.0 * h / 2197.0));
        let k4 = rhs(tk + 12.0 * h / 13.0, y4s.view());
        let y5s
            = &yk
            + &(&k1 * (439.0 * h / 216.0))
            - &(&k2 * (8.0 * h))
            + &(&k3 * (3680.0 * h / 513.0))
            - &(&k4 * (845.0 * h / 4104.0));
        let k5 = rhs(tk + h, y5s.view());
        let y6s
            = &yk
            - &(&k1 * (8.0 * h / 27.0))
            + &(&k2 * (2.0 * h))
            - &(&k3 * (3544.0 * h / 2565.0))
            + &(&k4 * (1859.0 * h / 4104.0))
            - &(&k5 * (11.0 * h / 40.0));
        let k6 = rhs(tk + h / 2.0, y6s.view());

        // fourth- and fifth-order solutions
        let y4
            = &yk
            + &(&k1 * (25.0 * h / 216.0))
            + &(&k3 * (1408.0 * h / 2565.0))
            + &(&k4 * (2197.0 * h / 4104.0))
            - &(&k5 * (h / 5.0));
        let y5
            = &yk
            + &(&k1 * (16.0 * h / 135.0))
            + &(&k3 * (6656.0 * h / 12825.0))
            + &(&k4 * (28561.0 * h / 56430.0))
            - &(&k5 * (9.0 * h / 50.0))
            + &(&k6 * (2.0 * h / 55.0));

        let err = y4.iter().zip(y5.iter())
            .map(|(a, b)| {
                let scale = ctrl.atol + ctrl.rtol * a.abs().max(b.abs());
                ((b - a) / scale).abs()
            })
            .fold(0.0_f64, f64::max);

        if err <= 1.0 {
            // step accepted; advance with the fifth-order solution and emit
            // any output times the step crossed
            let t_new = tk + h;
            let f_new = rhs(t_new, y5.view());
            while filled < n_out && t[filled] <= t_new + span * 1e-12 {
                let s = ((t[filled] - tk) / h).clamp(0.0, 1.0);
                let yi = hermite(&yk, &fk, &y5, &f_new, h, s);
                pops.column_mut(filled).assign(&yi);
                filled += 1;
            }
            tk = t_new;
            yk = y5;
            fk = f_new;
        }
        let factor = if err == 0.0 {
            5.0
        } else {
            (0.9 * err.powf(-0.2)).clamp(0.2, 5.0)
        };
        h *= factor;
    }
    Ok(Trajectory { time: t.clone(), pops })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exponential_decay() {
        let lambda = 3e5;
        let rhs = |_t: f64, y: nd::ArrayView1<f64>| -> nd::Array1<f64> {
            y.mapv(|v| -lambda * v)
        };
        let y0: nd::Array1<f64> = nd::arr1(&[100.0]);
        let t: nd::Array1<f64> = nd::Array1::linspace(0.0, 1e-5, 51);
        let traj = integrate(rhs, &y0, &t, &StepControl::default()).unwrap();
        for (&tk, &yk) in traj.time.iter().zip(traj.pops.row(0).iter()) {
            let exact = 100.0 * (-lambda * tk).exp();
            assert!(
                (yk - exact).abs() < 1e-6 * exact.max(1e-3),
                "t = {tk}: {yk} vs {exact}",
            );
        }
    }

    #[test]
    fn dense_output_off_step() {
        // irregular output grid forces interpolation inside accepted steps
        let lambda = 2e5;
        let rhs = |_t: f64, y: nd::ArrayView1<f64>| -> nd::Array1<f64> {
            y.mapv(|v| -lambda * v)
        };
        let y0: nd::Array1<f64> = nd::arr1(&[1.0]);
        let t: nd::Array1<f64> = nd::arr1(&[0.0, 1.7e-6, 4.3e-6, 1e-5]);
        let traj = integrate(rhs, &y0, &t, &StepControl::default()).unwrap();
        for (&tk, &yk) in traj.time.iter().zip(traj.pops.row(0).iter()) {
            let exact = (-lambda * tk).exp();
            assert!((yk - exact).abs() < 1e-6, "t = {tk}: {yk} vs {exact}");
        }
    }

    #[test]
    fn two_state_exchange() {
        // v0' = -a v0 + b v1, v1' = a v0 - b v1; total conserved
        let (a, b) = (4e5, 1e5);
        let rhs = move |_t: f64, v: nd::ArrayView1<f64>| -> nd::Array1<f64> {
            nd::arr1(&[-a * v[0] + b * v[1], a * v[0] - b * v[1]])
        };
        let y0: nd::Array1<f64> = nd::arr1(&[100.0, 0.0]);
        let t: nd::Array1<f64> = nd::Array1::linspace(0.0, 2e-5, 41);
        let traj = integrate(rhs, &y0, &t, &StepControl::default()).unwrap();
        for &tot in traj.total().iter() {
            assert!((tot - 100.0).abs() < 1e-6);
        }
        let t_last = traj.time[traj.time.len() - 1];
        let exact
            = 100.0 * (b + a * (-(a + b) * t_last).exp()) / (a + b);
        let got = traj.pops[[0, traj.time.len() - 1]];
        assert!((got - exact).abs() < 1e-6 * 100.0);
    }

    #[test]
    fn step_limit_yields_partial() {
        let rhs = |_t: f64, y: nd::ArrayView1<f64>| -> nd::Array1<f64> {
            y.mapv(|v| -1e6 * v)
        };
        let y0: nd::Array1<f64> = nd::arr1(&[1.0]);
        let t: nd::Array1<f64> = nd::Array1::linspace(0.0, 1e-3, 101);
        let ctrl = StepControl { max_steps: 3, ..Default::default() };
        let err = integrate(rhs, &y0, &t, &ctrl).unwrap_err();
        match &err {
            IntegrationError::StepLimit { max_steps, partial, .. } => {
                assert_eq!(*max_steps, 3);
                assert!(partial.time.len() < t.len());
                assert_eq!(partial.time.len(), partial.pops.ncols());
            },
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.failed_at() < 1e-3);
        assert_eq!(err.partial().pops.nrows(), 1);
    }

    #[test]
    fn cycle_count() {
        assert!((pumping_cycles(0.5, 0.5) - 1.0).abs() < 1e-12);
        let n = pumping_cycles(0.9, 0.5);
        assert!((n - 0.5_f64.ln() / 0.9_f64.ln()).abs() < 1e-12);
        assert!(n > 6.5 && n < 6.6);
    }
}
