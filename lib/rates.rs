//! Jitter-averaged photon-scattering rates for every allowed transition.
//!
//! The laser center frequency is not constant; it jitters sinusoidally with
//! an amplitude a few linewidths wide, so no transition can be treated as
//! always on resonance. The spectrum is rebuilt at many instants over one
//! jitter period, the rate curve seen by each transition is integrated over
//! the period, and the result is weighted by polarization purity and the
//! tabulated transition strength to give one steady rate per edge.

use std::{ cmp::Ordering, f64::consts::TAU };
use ndarray as nd;
use crate::{
    calibration::{ CalibrationError, CalibrationTable },
    hilbert::{ self, State },
    spectrum::{ Band, Beam, Physics },
};

/// Sinusoidal model of the laser-frequency jitter, and the resolution used to
/// average over it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct JitterParams {
    /// Jitter frequency (Hz).
    pub freq: f64,
    /// Jitter amplitude (Hz).
    pub amplitude: f64,
    /// Samples per jitter period.
    pub samples: usize,
    /// Atom beam speed (cm/s). The period integral gives photons scattered
    /// over a fixed 1 cm pumping path; this converts between that and a
    /// steady per-atom rate.
    pub atom_speed: f64,
}

impl Default for JitterParams {
    fn default() -> Self {
        Self {
            freq: 800e3,
            amplitude: 20e6,
            samples: 125,
            atom_speed: 20e3,
        }
    }
}

/// The pump beam as configured in the lab.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeamParams {
    /// Total laser power before modulation.
    pub power: f64,
    /// Unmodulated laser frequency (Hz); sits on the B = 0,
    /// F_g = 1 → F_e = 2 line.
    pub main_freq: f64,
    /// Fraction of power in each ±800 MHz sideband group.
    pub sideband_frac: f64,
    /// RF power into the resonator (dBm); sets the 80 MHz splitting ratios
    /// through the calibration table.
    pub drive_dbm: f64,
    /// Power of the lone band coming out of the AOM.
    pub lone_power: f64,
    /// Offset of the lone AOM band from the main frequency (Hz).
    pub lone_offset: f64,
}

impl Default for BeamParams {
    fn default() -> Self {
        Self {
            power: 80.0,
            main_freq: 4.475e14 + 803e6,
            sideband_frac: 0.30,
            drive_dbm: -14.0,
            lone_power: 20.0,
            lone_offset: 201e6,
        }
    }
}

/// Polarization-selection class of a transition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    SigmaMinus,
    Pi,
    SigmaPlus,
}

impl Transition {
    /// Classify a transition by the change in magnetic quantum number.
    pub fn classify(ground: State, excited: State) -> Self {
        match excited.mf().cmp(&ground.mf()) {
            Ordering::Greater => Self::SigmaPlus,
            Ordering::Equal => Self::Pi,
            Ordering::Less => Self::SigmaMinus,
        }
    }
}

/// Polarization content of the beam: fraction `purity` in the pumping σ+
/// component, with the remainder assumed split evenly between π and σ−.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Polarization {
    /// Fraction of the beam in the correct σ+ polarization; in `[0, 1]`.
    pub purity: f64,
}

impl Default for Polarization {
    fn default() -> Self { Self { purity: 0.98 } }
}

impl Polarization {
    /// Weight applied to a transition's averaged rate.
    ///
    /// π transitions carry an extra factor of 1/2: their maximum cross
    /// section is half that of σ transitions.
    pub fn weight(&self, class: Transition) -> f64 {
        match class {
            Transition::SigmaPlus => self.purity,
            Transition::Pi => (1.0 - self.purity) / 2.0 / 2.0,
            Transition::SigmaMinus => (1.0 - self.purity) / 2.0,
        }
    }
}

/// One period of the jitter waveform `A·sin(2π·f·t)`, for a plotting
/// collaborator.
pub fn jitter_waveform(jitter: &JitterParams)
    -> (nd::Array1<f64>, nd::Array1<f64>)
{
    let dt = 1.0 / jitter.freq / jitter.samples as f64;
    let time: nd::Array1<f64>
        = (0..jitter.samples).map(|k| k as f64 * dt).collect();
    let offset = time.mapv(|t| jitter.amplitude * (TAU * jitter.freq * t).sin());
    (time, offset)
}

/// Trapezoidal-rule integral of a uniformly sampled curve with step `dx`.
fn trapz(y: &nd::Array1<f64>, dx: f64) -> f64 {
    y.iter().zip(y.iter().skip(1))
        .map(|(yk, ykp1)| dx * (yk + ykp1) / 2.0)
        .sum()
}

/// The full spectrum at one instant of the jitter cycle: the modulated beam
/// plus the lone AOM band, both shifted with the jittering center.
#[derive(Copy, Clone, Debug, PartialEq)]
struct SpectrumSample {
    beam: Beam,
    lone: Band,
}

impl SpectrumSample {
    fn transition_rate(&self, phys: &Physics, freq0: f64) -> f64 {
        self.beam.transition_rate(phys, freq0)
            + self.lone.transition_rate(phys, freq0)
    }
}

/// The spectrum sampled across one full period of the laser jitter.
///
/// Building this is the expensive part of a pipeline run; it is shared by
/// every transition's average.
#[derive(Clone, Debug)]
pub struct JitteredSpectra {
    phys: Physics,
    jitter: JitterParams,
    samples: Vec<SpectrumSample>,
    dt: f64,
}

impl JitteredSpectra {
    /// Instantiate the spectrum at every sample time of one jitter period.
    ///
    /// Fails if the beam's drive power falls outside the calibrated range.
    pub fn build(
        phys: &Physics,
        beam: &BeamParams,
        jitter: &JitterParams,
        cal: &CalibrationTable,
    ) -> Result<Self, CalibrationError>
    {
        let dt = 1.0 / jitter.freq / jitter.samples as f64;
        let samples: Vec<SpectrumSample> = (0..jitter.samples)
            .map(|k| {
                let t = k as f64 * dt;
                let center
                    = beam.main_freq
                    + jitter.amplitude * (TAU * jitter.freq * t).sin();
                Ok(SpectrumSample {
                    beam: Beam::new(
                        beam.power,
                        center,
                        beam.sideband_frac,
                        beam.drive_dbm,
                        cal,
                    )?,
                    lone: Band::new(beam.lone_power, center + beam.lone_offset),
                })
            })
            .collect::<Result<_, CalibrationError>>()?;
        Ok(Self { phys: *phys, jitter: *jitter, samples, dt })
    }

    /// The sample-time grid.
    pub fn time(&self) -> nd::Array1<f64> {
        (0..self.samples.len()).map(|k| k as f64 * self.dt).collect()
    }

    /// Scattering rate seen by a transition resonant at `freq0` at each
    /// sample time, before strength and polarization weighting.
    pub fn rate_curve(&self, freq0: f64) -> nd::Array1<f64> {
        self.samples.iter()
            .map(|sample| sample.transition_rate(&self.phys, freq0))
            .collect()
    }

    /// Photons scattered per atom over 1 cm of pumping path by a transition
    /// resonant at `freq0`: the period integral of the rate curve times the
    /// number of jitter periods an atom spends in 1 cm of beam.
    pub fn photons_per_cm(&self, freq0: f64) -> f64 {
        trapz(&self.rate_curve(freq0), self.dt)
            * self.jitter.freq / self.jitter.atom_speed
    }
}

/// Jitter-averaged scattering rate for one allowed ground → excited edge.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AveragedRate {
    pub ground: State,
    pub excited: State,
    /// Resonant offset from the main frequency (MHz).
    pub offset: f64,
    /// Tabulated relative absorption strength.
    pub strength: f64,
    /// Polarization class.
    pub class: Transition,
    /// Photons scattered per atom over 1 cm of path, all weights applied.
    pub photons_per_cm: f64,
    /// Steady scattering rate (photons / (s · atom)), all weights applied.
    /// This is the coefficient consumed by the rate-equation network.
    pub rate: f64,
}

/// Averaged rates for every edge of the allowed-transition graph. Forbidden
/// transitions are absent, not zero.
#[derive(Clone, Debug)]
pub struct RateTable {
    pub edges: Vec<AveragedRate>,
}

impl RateTable {
    /// Run the averaging pipeline: build the jittered spectra once, then
    /// integrate and weight every allowed transition.
    pub fn build(
        phys: &Physics,
        beam: &BeamParams,
        jitter: &JitterParams,
        pol: &Polarization,
        cal: &CalibrationTable,
    ) -> Result<Self, CalibrationError>
    {
        let spectra = JitteredSpectra::build(phys, beam, jitter, cal)?;
        let edges: Vec<AveragedRate> = hilbert::absorption_edges()
            .map(|(ground, excited, strength)| {
                let offset = hilbert::transition_offset(ground, excited);
                let photons
                    = spectra.photons_per_cm(beam.main_freq + offset * 1e6);
                let class = Transition::classify(ground, excited);
                let weight = pol.weight(class) * strength;
                AveragedRate {
                    ground,
                    excited,
                    offset,
                    strength,
                    class,
                    photons_per_cm: photons * weight,
                    rate: photons * weight * jitter.atom_speed,
                }
            })
            .collect();
        Ok(Self { edges })
    }

    /// Averaged rate of one edge; `None` if the transition is forbidden.
    pub fn get(&self, ground: State, excited: State) -> Option<f64> {
        self.edges.iter()
            .find(|e| e.ground == ground && e.excited == excited)
            .map(|e| e.rate)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hilbert::State::*;

    const CAL: &str = "\
-20 900.0 40.0 8.0 2.0 100.0
-10 800.0 85.0 20.0 5.0 90.0
0 700.0 120.0 40.0 12.0 80.0
";

    fn cal() -> CalibrationTable { CalibrationTable::parse(CAL).unwrap() }

    fn beam_params() -> BeamParams {
        BeamParams { drive_dbm: -10.0, ..Default::default() }
    }

    #[test]
    fn classification() {
        assert_eq!(Transition::classify(G2m2, E2m1), Transition::SigmaPlus);
        assert_eq!(Transition::classify(G21, E21), Transition::Pi);
        assert_eq!(Transition::classify(G22, E21), Transition::SigmaMinus);
    }

    #[test]
    fn polarization_weights() {
        let pol = Polarization { purity: 0.98 };
        assert!((pol.weight(Transition::SigmaPlus) - 0.98).abs() < 1e-15);
        assert!((pol.weight(Transition::SigmaMinus) - 0.01).abs() < 1e-15);
        assert!((pol.weight(Transition::Pi) - 0.005).abs() < 1e-15);
    }

    #[test]
    fn trapz_constant() {
        let y: nd::Array1<f64> = nd::Array1::from_elem(11, 3.0);
        assert!((trapz(&y, 0.1) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn waveform_period() {
        let jitter = JitterParams::default();
        let (time, offset) = jitter_waveform(&jitter);
        assert_eq!(time.len(), jitter.samples);
        assert_eq!(offset[0], 0.0);
        let peak = offset.iter().cloned().fold(f64::MIN, f64::max);
        assert!((peak - jitter.amplitude).abs() / jitter.amplitude < 1e-2);
        // grid covers exactly one period, endpoint excluded
        let dt = time[1] - time[0];
        let last = time[time.len() - 1];
        assert!((last + dt - 1.0 / jitter.freq).abs() < 1e-15);
    }

    #[test]
    fn table_covers_allowed_graph_only() {
        let table = RateTable::build(
            &Physics::default(),
            &beam_params(),
            &JitterParams::default(),
            &Polarization::default(),
            &cal(),
        ).unwrap();
        assert_eq!(table.edges.len(), 38);
        // forbidden: |2, 2) -> e|2,-2) violates |Δm| <= 1
        assert_eq!(table.get(G22, E2m2), None);
        // allowed edges all present and nonnegative
        for edge in table.edges.iter() {
            assert!(edge.rate >= 0.0);
            assert!(edge.photons_per_cm >= 0.0);
        }
    }

    #[test]
    fn rates_scale_with_purity() {
        let phys = Physics::default();
        let beam = beam_params();
        let jitter = JitterParams::default();
        let cal = cal();
        let pure = RateTable::build(
            &phys, &beam, &jitter, &Polarization { purity: 1.0 }, &cal,
        ).unwrap();
        let mixed = RateTable::build(
            &phys, &beam, &jitter, &Polarization { purity: 0.5 }, &cal,
        ).unwrap();
        for (p, m) in pure.edges.iter().zip(mixed.edges.iter()) {
            match p.class {
                // σ- and π edges vanish for a perfectly polarized beam
                Transition::SigmaMinus | Transition::Pi => {
                    assert_eq!(p.rate, 0.0);
                },
                Transition::SigmaPlus => {
                    assert!((m.rate - 0.5 * p.rate).abs() <= 1e-9 * p.rate);
                },
            }
        }
    }
}
