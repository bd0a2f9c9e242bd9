//! Static description of the atomic system: the 16 hyperfine sublevels of the
//! lithium 2S<sub>1/2</sub> (ground) and 2P<sub>1/2</sub> (excited) manifolds
//! at B = 145 G, their energies, and the allowed-transition graph with
//! tabulated relative strengths.
//!
//! Everything here is fixed, versioned data for one atomic system; nothing is
//! computed at run time except the resolution of states to array indices.
//! Transition strengths follow the tabulation at
//! <https://demonstrations.wolfram.com/TransitionStrengthsOfAlkaliMetalAtoms/>.

use std::fmt;

/// Number of sublevels in the model (8 ground + 8 excited).
pub const N_STATES: usize = 16;

/// A single hyperfine sublevel.
///
/// The discriminant of each variant is its index in [`STATES`] and in every
/// population vector; ground states come first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// 2S_1/2 |2,-2)
    G2m2,
    /// 2S_1/2 |2,-1)
    G2m1,
    /// 2S_1/2 |2, 0)
    G20,
    /// 2S_1/2 |2, 1)
    G21,
    /// 2S_1/2 |2, 2)
    G22,
    /// 2S_1/2 |1,-1)
    G1m1,
    /// 2S_1/2 |1, 0)
    G10,
    /// 2S_1/2 |1, 1)
    G11,
    /// 2P_1/2 e|2,-2)
    E2m2,
    /// 2P_1/2 e|2,-1)
    E2m1,
    /// 2P_1/2 e|2, 0)
    E20,
    /// 2P_1/2 e|2, 1)
    E21,
    /// 2P_1/2 e|2, 2)
    E22,
    /// 2P_1/2 e|1,-1)
    E1m1,
    /// 2P_1/2 e|1, 0)
    E10,
    /// 2P_1/2 e|1, 1)
    E11,
}

use State::*;

/// All sublevels, in population-vector order.
pub const STATES: [State; N_STATES] = [
    G2m2, G2m1, G20, G21, G22, G1m1, G10, G11,
    E2m2, E2m1, E20, E21, E22, E1m1, E10, E11,
];

impl State {
    /// Index of this state in [`STATES`] and in every population vector.
    pub fn index(self) -> usize { self as usize }

    /// Return `true` if this is a 2P_1/2 sublevel.
    pub fn is_excited(self) -> bool { self.index() >= 8 }

    /// Total angular momentum quantum number F.
    pub fn f(self) -> u32 {
        match self {
            G2m2 | G2m1 | G20 | G21 | G22 => 2,
            G1m1 | G10 | G11 => 1,
            E2m2 | E2m1 | E20 | E21 | E22 => 2,
            E1m1 | E10 | E11 => 1,
        }
    }

    /// Magnetic quantum number mF.
    ///
    /// Polarization selection rules are decided from this field, never from
    /// display labels.
    pub fn mf(self) -> i32 {
        match self {
            G2m2 | E2m2 => -2,
            G2m1 | G1m1 | E2m1 | E1m1 => -1,
            G20 | G10 | E20 | E10 => 0,
            G21 | G11 | E21 | E11 => 1,
            G22 | E22 => 2,
        }
    }

    /// Energy of the sublevel in MHz.
    ///
    /// Ground-state energies are relative to the B = 0, F_g = 1 level of
    /// 2S_1/2 (the 803 MHz term is the hyperfine splitting); excited-state
    /// energies are relative to the B = 0, F_e = 2 level of 2P_1/2.
    pub fn energy_mhz(self) -> f64 {
        match self {
            G2m2 => -202.0 + 803.0,
            G2m1 => -53.0 + 803.0,
            G20 => 49.0 + 803.0,
            G21 => 132.0 + 803.0,
            G22 => 204.0 + 803.0,
            G1m1 => 52.0,
            G10 => -50.0,
            G11 => -132.0,
            E2m2 => -67.0,
            E2m1 => 14.0,
            E20 => 36.0,
            E21 => 53.0,
            E22 => 68.0,
            E1m1 => -105.0,
            E10 => -127.0,
            E11 => -144.0,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_excited() { "e" } else { "" };
        write!(f, "{}|{},{:2})", tag, self.f(), self.mf())
    }
}

/// Spontaneous-emission branching: `(excited, ground, branching ratio)` for
/// every allowed decay.
///
/// The branches out of each excited state sum to 1. The allowed absorption
/// edges are exactly the reverses of these, with the absorption strength
/// equal to the branching ratio of the reverse decay; a pair absent from this
/// table is a forbidden transition and is never assigned a rate.
pub const EMISSION: [(State, State, f64); 38] = [
    (E2m2, G2m2, 1.0 / 3.0),
    (E2m2, G2m1, 1.0 / 6.0),
    (E2m2, G1m1, 1.0 / 2.0),
    (E2m1, G2m2, 1.0 / 6.0),
    (E2m1, G2m1, 1.0 / 12.0),
    (E2m1, G20, 1.0 / 4.0),
    (E2m1, G1m1, 1.0 / 4.0),
    (E2m1, G10, 1.0 / 4.0),
    (E20, G2m1, 1.0 / 4.0),
    (E20, G20, 0.0),
    (E20, G21, 1.0 / 4.0),
    (E20, G1m1, 1.0 / 12.0),
    (E20, G10, 1.0 / 3.0),
    (E20, G11, 1.0 / 12.0),
    (E21, G20, 1.0 / 4.0),
    (E21, G21, 1.0 / 12.0),
    (E21, G22, 1.0 / 6.0),
    (E21, G10, 1.0 / 4.0),
    (E21, G11, 1.0 / 4.0),
    (E22, G21, 1.0 / 6.0),
    (E22, G22, 1.0 / 3.0),
    (E22, G11, 1.0 / 2.0),
    (E1m1, G2m2, 1.0 / 2.0),
    (E1m1, G2m1, 1.0 / 4.0),
    (E1m1, G20, 1.0 / 12.0),
    (E1m1, G1m1, 1.0 / 12.0),
    (E1m1, G10, 1.0 / 12.0),
    (E10, G2m1, 1.0 / 4.0),
    (E10, G20, 1.0 / 3.0),
    (E10, G21, 1.0 / 4.0),
    (E10, G1m1, 1.0 / 12.0),
    (E10, G10, 0.0),
    (E10, G11, 1.0 / 12.0),
    (E11, G20, 1.0 / 12.0),
    (E11, G21, 1.0 / 4.0),
    (E11, G22, 1.0 / 2.0),
    (E11, G10, 1.0 / 12.0),
    (E11, G11, 1.0 / 12.0),
];

/// Iterate over the allowed absorption edges `(ground, excited, strength)`.
///
/// This is the transpose of [`EMISSION`].
pub fn absorption_edges() -> impl Iterator<Item = (State, State, f64)> {
    EMISSION.iter().map(|&(e, g, s)| (g, e, s))
}

/// Resonant frequency of the `ground → excited` transition in MHz, relative
/// to the B = 0, F_g = 1 → F_e = 2 line.
pub fn transition_offset(ground: State, excited: State) -> f64 {
    excited.energy_mhz() - ground.energy_mhz()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn index_stable() {
        for (k, state) in STATES.iter().enumerate() {
            assert_eq!(state.index(), k);
        }
        assert!(STATES[..8].iter().all(|s| !s.is_excited()));
        assert!(STATES[8..].iter().all(|s| s.is_excited()));
    }

    #[test]
    fn branches_sum_to_one() {
        for excited in STATES[8..].iter() {
            let total: f64 = EMISSION.iter()
                .filter(|(e, _, _)| e == excited)
                .map(|(_, _, s)| s)
                .sum();
            assert!((total - 1.0).abs() < 1e-12, "{}: {}", excited, total);
        }
    }

    #[test]
    fn absorption_is_transpose() {
        assert_eq!(absorption_edges().count(), EMISSION.len());
        for (g, e, s) in absorption_edges() {
            assert!(!g.is_excited());
            assert!(e.is_excited());
            assert!((e.mf() - g.mf()).abs() <= 1);
            let back = EMISSION.iter()
                .find(|&&(ee, gg, _)| ee == e && gg == g)
                .map(|&(_, _, ss)| ss);
            assert_eq!(back, Some(s));
        }
    }

    #[test]
    fn labels() {
        assert_eq!(G2m2.to_string(), "|2,-2)");
        assert_eq!(G20.to_string(), "|2, 0)");
        assert_eq!(E11.to_string(), "e|1, 1)");
    }

    #[test]
    fn offsets() {
        // |2, 2) -> e|2, 1): the "bad" transition near -150 - 800 MHz
        assert_eq!(transition_offset(G22, E21), 53.0 - (204.0 + 803.0));
        // |2, 1) -> e|2, 2): the "good" transition near -64 - 800 MHz
        assert_eq!(transition_offset(G21, E22), 68.0 - (132.0 + 803.0));
    }
}
