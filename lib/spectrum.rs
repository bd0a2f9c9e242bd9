//! Hierarchical spectral model of the modulated pump beam.
//!
//! The laser spectrum is a tree of weighted lines: the raw beam is split by
//! the 800 MHz modulation into three [`SidebandGroup`]s, and each group is
//! split by the helical resonator + EOM into five [`Band`]s spaced 80 MHz
//! apart. All rate queries bottom out at [`Band`]; the higher levels only
//! distribute power and sum contributions.

use ndarray as nd;
use crate::calibration::{ CalibrationError, CalibrationTable, Peak };

/// Spacing of the resonator + EOM sidebands (Hz).
pub const RF_SPACING: f64 = 80e6;

/// Spacing of the outer modulation sidebands (Hz).
pub const MOD_SPACING: f64 = 800e6;

/// Physical constants of the pumping transition, passed explicitly into every
/// spectral evaluation so parameter sets can be swept side by side.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Physics {
    /// Natural linewidth γ (Hz).
    pub gamma: f64,
    /// Einstein A coefficient A21 (Hz); no single line can scatter faster
    /// than this.
    pub a21: f64,
    /// Resonant scattering cross section (m²).
    pub res_cross_sect: f64,
    /// Reduced Planck constant (J·s).
    pub h_bar: f64,
    /// Detuning beyond which a line contributes nothing (Hz). Far wings of
    /// the Lorentzian are negligible at ~17 linewidths and cost most of the
    /// evaluation time.
    pub detuning_cutoff: f64,
}

impl Default for Physics {
    /// Values for the lithium 2S_1/2 → 2P_1/2 line.
    fn default() -> Self {
        Self {
            gamma: 5.9e6,
            a21: 3.7e7,
            res_cross_sect: 2.1433e-13,
            h_bar: 1.055e-34,
            detuning_cutoff: 100e6,
        }
    }
}

/// A single spectral line: some power at some frequency. Leaf of the
/// spectral tree, immutable once constructed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Band {
    /// Power carried by the line.
    pub power: f64,
    /// Absolute frequency of the line (Hz).
    pub freq: f64,
}

impl Band {
    pub fn new(power: f64, freq: f64) -> Self { Self { power, freq } }

    /// Lorentzian scattering cross section this line presents to a transition
    /// resonant at `freq0`, before any relative-strength weighting.
    ///
    /// Zero beyond the detuning cutoff.
    pub fn cross_sect(&self, phys: &Physics, freq0: f64) -> f64 {
        let delta = self.freq - freq0;
        if delta.abs() > phys.detuning_cutoff {
            return 0.0;
        }
        let hw = phys.gamma / 2.0;
        phys.res_cross_sect * hw.powi(2) / (delta.powi(2) + hw.powi(2))
    }

    /// Photon-scattering rate this line drives on a transition resonant at
    /// `freq0`, saturated at A21: a two-level system cannot scatter faster
    /// than it re-emits.
    pub fn transition_rate(&self, phys: &Physics, freq0: f64) -> f64 {
        let rate
            = self.power * self.cross_sect(phys, freq0)
            / (phys.h_bar * std::f64::consts::TAU * freq0);
        rate.min(phys.a21)
    }
}

/// One 800 MHz modulation band, split by the resonator + EOM into a carrier
/// and sideband pairs at ±80 and ±160 MHz.
///
/// The split ratios depend on the RF drive power through the measured
/// calibration; third-order sidebands are below the noise floor of the beam
/// model and are not instantiated.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SidebandGroup {
    bands: [Band; 5],
}

impl SidebandGroup {
    /// Split `power` at center frequency `freq` into five bands using the
    /// calibrated peak fractions at `drive_dbm`.
    ///
    /// Fails if `drive_dbm` falls outside the calibrated range.
    pub fn new(
        power: f64,
        freq: f64,
        drive_dbm: f64,
        cal: &CalibrationTable,
    ) -> Result<Self, CalibrationError>
    {
        let main = cal.fraction(drive_dbm, Peak::Main)?;
        let side = cal.fraction(drive_dbm, Peak::Side)?;
        let second = cal.fraction(drive_dbm, Peak::SecondOrder)?;
        Ok(Self {
            bands: [
                Band::new(power * second, freq - 2.0 * RF_SPACING),
                Band::new(power * side, freq - RF_SPACING),
                Band::new(power * main, freq),
                Band::new(power * side, freq + RF_SPACING),
                Band::new(power * second, freq + 2.0 * RF_SPACING),
            ],
        })
    }

    /// Summed scattering rate of all five bands.
    pub fn transition_rate(&self, phys: &Physics, freq0: f64) -> f64 {
        self.bands.iter()
            .map(|band| band.transition_rate(phys, freq0))
            .sum()
    }

    pub fn bands(&self) -> &[Band] { &self.bands }
}

/// The full modulated beam: three sideband groups at −800, 0, and +800 MHz
/// relative to the laser center, with power split
/// `(p·m, p·(1 − 2m), p·m)` for sideband fraction `m`.
///
/// A beam is built for one fixed center frequency; modeling jitter means
/// building a fresh beam per jitter sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Beam {
    groups: [SidebandGroup; 3],
}

impl Beam {
    /// Construct the full spectrum for total power `power` centered at
    /// `freq`, with fraction `sideband_frac` of the power in each ±800 MHz
    /// group and the resonator driven at `drive_dbm`.
    ///
    /// Fails if `drive_dbm` falls outside the calibrated range.
    pub fn new(
        power: f64,
        freq: f64,
        sideband_frac: f64,
        drive_dbm: f64,
        cal: &CalibrationTable,
    ) -> Result<Self, CalibrationError>
    {
        let m = sideband_frac;
        Ok(Self {
            groups: [
                SidebandGroup::new(
                    power * m, freq - MOD_SPACING, drive_dbm, cal)?,
                SidebandGroup::new(
                    power * (1.0 - 2.0 * m), freq, drive_dbm, cal)?,
                SidebandGroup::new(
                    power * m, freq + MOD_SPACING, drive_dbm, cal)?,
            ],
        })
    }

    /// Summed scattering rate of every line in the beam for a transition
    /// resonant at `freq0`.
    pub fn transition_rate(&self, phys: &Physics, freq0: f64) -> f64 {
        self.groups.iter()
            .map(|group| group.transition_rate(phys, freq0))
            .sum()
    }

    /// Iterate over all 15 leaf lines.
    pub fn bands(&self) -> impl Iterator<Item = &Band> {
        self.groups.iter().flat_map(|group| group.bands().iter())
    }

    /// `(frequency, power)` of every leaf line, for a plotting collaborator.
    pub fn band_series(&self) -> (nd::Array1<f64>, nd::Array1<f64>) {
        let freq: nd::Array1<f64>
            = self.bands().map(|band| band.freq).collect();
        let power: nd::Array1<f64>
            = self.bands().map(|band| band.power).collect();
        (freq, power)
    }

    /// Scattering rate evaluated over a grid of resonant frequencies.
    pub fn rate_series(&self, phys: &Physics, freq0: &nd::Array1<f64>)
        -> nd::Array1<f64>
    {
        freq0.mapv(|f| self.transition_rate(phys, f))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CAL: &str = "\
-20 900.0 40.0 8.0 2.0 100.0
-10 800.0 85.0 20.0 5.0 90.0
0 700.0 120.0 40.0 12.0 80.0
";

    fn cal() -> CalibrationTable { CalibrationTable::parse(CAL).unwrap() }

    const F0: f64 = 4.475e14;

    #[test]
    fn lorentzian_symmetric() {
        let phys = Physics::default();
        let band = Band::new(1.0, F0);
        for delta in [1e5, 1e6, 5e6, 50e6, 99e6] {
            let up = band.cross_sect(&phys, F0 + delta);
            let dn = band.cross_sect(&phys, F0 - delta);
            assert_eq!(up, dn);
            assert!(up > 0.0);
        }
    }

    #[test]
    fn lorentzian_peak_and_cutoff() {
        let phys = Physics::default();
        let band = Band::new(1.0, F0);
        assert_eq!(band.cross_sect(&phys, F0), phys.res_cross_sect);
        assert_eq!(band.cross_sect(&phys, F0 + 100.1e6), 0.0);
        assert_eq!(band.cross_sect(&phys, F0 - 150e6), 0.0);
    }

    #[test]
    fn rate_saturates() {
        let phys = Physics::default();
        for power in [1.0, 1e3, 1e9, 1e30] {
            let band = Band::new(power, F0);
            assert!(band.transition_rate(&phys, F0) <= phys.a21);
        }
        // far-detuned weak line is nowhere near the cap
        let weak = Band::new(1e-6, F0);
        assert!(weak.transition_rate(&phys, F0 + 50e6) < phys.a21);
    }

    #[test]
    fn beam_power_bookkeeping() {
        let cal = cal();
        let power = 80.0;
        let m = 0.3;
        let beam = Beam::new(power, F0, m, -10.0, &cal).unwrap();
        let leaf_total: f64 = beam.bands().map(|b| b.power).sum();
        let group_frac
            = cal.fraction(-10.0, Peak::Main).unwrap()
            + 2.0 * cal.fraction(-10.0, Peak::Side).unwrap()
            + 2.0 * cal.fraction(-10.0, Peak::SecondOrder).unwrap();
        // the modeled bands miss exactly the third-order share
        assert!((leaf_total - power * group_frac).abs() < 1e-9);
        assert!(leaf_total < power);
    }

    #[test]
    fn beam_sums_groups() {
        let cal = cal();
        let beam = Beam::new(80.0, F0, 0.3, -10.0, &cal).unwrap();
        let phys = Physics::default();
        // at the center frequency only the carrier group is within the
        // cutoff; ±800 MHz groups contribute nothing
        let at_center = beam.transition_rate(&phys, F0);
        let carrier_only
            = SidebandGroup::new(80.0 * 0.4, F0, -10.0, &cal).unwrap()
            .transition_rate(&phys, F0);
        assert!((at_center - carrier_only).abs() / at_center < 1e-12);
    }

    #[test]
    fn out_of_range_drive_fails() {
        let cal = cal();
        assert!(Beam::new(80.0, F0, 0.3, 5.0, &cal).is_err());
        assert!(SidebandGroup::new(80.0, F0, -30.0, &cal).is_err());
    }
}
