//! The 16-state rate-equation network coupling ground and excited
//! populations.
//!
//! Absorption edges carry the jitter-averaged scattering rates; emission
//! edges carry A21 times the tabulated branching ratio. Population flows
//! along an edge at a rate proportional to the population of its source
//! state, so the total over all 16 states is conserved exactly.

use ndarray as nd;
use crate::{
    hilbert::{ self, N_STATES },
    integrate::{ self, IntegrationError, StepControl, Trajectory },
    rates::RateTable,
    spectrum::Physics,
};

/// One weighted directed edge, resolved to population-vector indices.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Edge {
    from: usize,
    to: usize,
    rate: f64,
}

/// The coupled rate equations for one beam configuration.
///
/// State labels are resolved to indices and edge weights fixed at
/// construction; after that, [`Self::derivative`] is a pure function and can
/// be called freely by the integrator.
#[derive(Clone, Debug)]
pub struct RateNetwork {
    absorption: Vec<Edge>,
    emission: Vec<Edge>,
}

impl RateNetwork {
    /// Assemble the network from a computed rate table and the static
    /// emission-branching data.
    pub fn new(phys: &Physics, rates: &RateTable) -> Self {
        let absorption: Vec<Edge> = rates.edges.iter()
            .map(|edge| Edge {
                from: edge.ground.index(),
                to: edge.excited.index(),
                rate: edge.rate,
            })
            .collect();
        let emission: Vec<Edge> = hilbert::EMISSION.iter()
            .map(|&(excited, ground, branch)| Edge {
                from: excited.index(),
                to: ground.index(),
                rate: phys.a21 * branch,
            })
            .collect();
        Self { absorption, emission }
    }

    /// Instantaneous time derivative of the population vector.
    pub fn derivative(&self, v: nd::ArrayView1<f64>) -> nd::Array1<f64> {
        let mut dv: nd::Array1<f64> = nd::Array1::zeros(N_STATES);
        for edge in self.absorption.iter().chain(self.emission.iter()) {
            let flow = edge.rate * v[edge.from];
            dv[edge.from] -= flow;
            dv[edge.to] += flow;
        }
        dv
    }

    /// Integrate the network forward from `v0`, sampling the trajectory at
    /// the (ascending) output times `t`.
    pub fn evolve(
        &self,
        v0: &nd::Array1<f64>,
        t: &nd::Array1<f64>,
        ctrl: &StepControl,
    ) -> Result<Trajectory, IntegrationError>
    {
        let traj
            = integrate::integrate(|_t, v| self.derivative(v), v0, t, ctrl)?;
        #[cfg(debug_assertions)]
        {
            let drift = traj.conservation_drift();
            if drift > 1e-6 {
                eprintln!(
                    "RateNetwork::evolve: total population drifted by \
                    {:.3e} (relative); an absorption edge is probably \
                    missing its emission pair",
                    drift,
                );
            }
        }
        Ok(traj)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        hilbert::State::*,
        rates::{ AveragedRate, Transition },
    };

    fn edge(ground: crate::hilbert::State, excited: crate::hilbert::State, rate: f64)
        -> AveragedRate
    {
        AveragedRate {
            ground,
            excited,
            offset: 0.0,
            strength: 1.0,
            class: Transition::classify(ground, excited),
            photons_per_cm: 0.0,
            rate,
        }
    }

    fn network(rates: Vec<AveragedRate>) -> RateNetwork {
        RateNetwork::new(&Physics::default(), &RateTable { edges: rates })
    }

    #[test]
    fn derivative_conserves_total() {
        let net = network(vec![
            edge(G2m2, E2m1, 1e5),
            edge(G21, E22, 3e4),
        ]);
        let v: nd::Array1<f64> = (1..=16).map(|k| k as f64).collect();
        let dv = net.derivative(v.view());
        // flows reach ~A21 * 16, so allow rounding at that scale
        assert!(dv.sum().abs() < 1e-4);
    }

    #[test]
    fn ground_only_population_with_no_light_is_static() {
        let net = network(vec![]);
        let mut v: nd::Array1<f64> = nd::Array1::zeros(N_STATES);
        v[G22.index()] = 100.0;
        let dv = net.derivative(v.view());
        assert!(dv.iter().all(|d| *d == 0.0));
    }

    #[test]
    fn excited_population_decays_by_branching() {
        let phys = Physics::default();
        let net = network(vec![]);
        let mut v: nd::Array1<f64> = nd::Array1::zeros(N_STATES);
        v[E2m2.index()] = 10.0;
        let dv = net.derivative(v.view());
        // e|2,-2) branches 1/3, 1/6, 1/2 into |2,-2), |2,-1), |1,-1)
        assert!((dv[E2m2.index()] + phys.a21 * 10.0).abs() < 1e-3);
        assert!((dv[G2m2.index()] - phys.a21 * 10.0 / 3.0).abs() < 1e-3);
        assert!((dv[G2m1.index()] - phys.a21 * 10.0 / 6.0).abs() < 1e-3);
        assert!((dv[G1m1.index()] - phys.a21 * 10.0 / 2.0).abs() < 1e-3);
        assert_eq!(dv[G20.index()], 0.0);
    }

    #[test]
    fn absorption_moves_population_up() {
        let net = network(vec![edge(G2m2, E2m1, 2.0)]);
        let mut v: nd::Array1<f64> = nd::Array1::zeros(N_STATES);
        v[G2m2.index()] = 50.0;
        let dv = net.derivative(v.view());
        assert_eq!(dv[G2m2.index()], -100.0);
        assert_eq!(dv[E2m1.index()], 100.0);
    }
}
