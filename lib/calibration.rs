//! Measured sideband calibration of the helical resonator + EOM, and
//! piecewise-linear interpolation over it.
//!
//! The RF drive power going into the resonator sets how much of the beam's
//! power ends up in each modulation peak. That relationship is not modeled;
//! it is measured (peak amplitudes on a scope at a grid of drive powers) and
//! interpolated here.

use std::{ fs, path::Path };
use itertools::Itertools;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("couldn't read calibration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("calibration table needs at least 2 rows; parsed {0}")]
    TooFewRows(usize),
    #[error("drive power {query} dBm outside calibrated range [{min}, {max}) dBm")]
    PowerOutOfRange { query: f64, min: f64, max: f64 },
}

/// Which peak of the RF-modulated spectrum a query refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Peak {
    /// The unshifted carrier.
    Main,
    /// First-order sidebands, ±80 MHz.
    Side,
    /// Second-order sidebands, ±160 MHz.
    SecondOrder,
    /// Third-order sidebands, ±240 MHz.
    ThirdOrder,
}

/// One measured calibration row.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CalRow {
    /// RF power applied to the resonator (dBm).
    pub power_dbm: f64,
    /// Carrier peak amplitude (mV).
    pub main: f64,
    /// First-order sideband amplitude (mV).
    pub side: f64,
    /// Second-order sideband amplitude (mV).
    pub second_order: f64,
    /// Third-order sideband amplitude (mV).
    pub third_order: f64,
    /// Reflected voltage at the directional coupler (mV).
    pub reflected_v: f64,
}

impl CalRow {
    /// Parse one whitespace-delimited row of six floats; `None` if the line
    /// is anything else (headers, comments, partial rows).
    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<f64> = line.split_whitespace()
            .map(|w| w.parse().ok())
            .collect::<Option<_>>()?;
        let (power_dbm, main, side, second_order, third_order, reflected_v)
            = fields.into_iter().collect_tuple()?;
        Some(Self { power_dbm, main, side, second_order, third_order, reflected_v })
    }

    /// Amplitude of one peak.
    pub fn amp(&self, peak: Peak) -> f64 {
        match peak {
            Peak::Main => self.main,
            Peak::Side => self.side,
            Peak::SecondOrder => self.second_order,
            Peak::ThirdOrder => self.third_order,
        }
    }

    /// Total measured amplitude across all peaks; sidebands count twice since
    /// they come in ± pairs.
    pub fn total(&self) -> f64 {
        self.main + 2.0 * (self.side + self.second_order + self.third_order)
    }

    /// Fraction of the total amplitude carried by one peak.
    pub fn ratio(&self, peak: Peak) -> f64 { self.amp(peak) / self.total() }
}

/// The full calibration dataset, sorted ascending by drive power.
///
/// Loaded once at startup and read-only thereafter.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationTable {
    rows: Vec<CalRow>,
}

impl CalibrationTable {
    /// Build a table from pre-parsed rows.
    ///
    /// Rows are sorted by drive power; fewer than two rows is an error since
    /// interpolation needs a bracket.
    pub fn from_rows(mut rows: Vec<CalRow>) -> Result<Self, CalibrationError> {
        if rows.len() < 2 {
            return Err(CalibrationError::TooFewRows(rows.len()));
        }
        rows.sort_by(|a, b| a.power_dbm.total_cmp(&b.power_dbm));
        Ok(Self { rows })
    }

    /// Parse a whitespace-delimited text dump.
    ///
    /// Lines that do not parse as six floats are skipped silently; the raw
    /// files carry headers and notebook remarks.
    pub fn parse(text: &str) -> Result<Self, CalibrationError> {
        Self::from_rows(text.lines().filter_map(CalRow::parse).collect())
    }

    /// Load and parse a calibration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CalibrationError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn rows(&self) -> &[CalRow] { &self.rows }

    /// Covered drive-power range `(min, max)`; queries are valid on
    /// `[min, max)`.
    pub fn power_range(&self) -> (f64, f64) {
        (self.rows[0].power_dbm, self.rows[self.rows.len() - 1].power_dbm)
    }

    /// Fraction of the total beam power in one peak at the given drive power,
    /// linearly interpolated between the two bracketing rows.
    ///
    /// Fails with [`CalibrationError::PowerOutOfRange`] outside the half-open
    /// covered range; the table never extrapolates.
    pub fn fraction(&self, power_dbm: f64, peak: Peak)
        -> Result<f64, CalibrationError>
    {
        let (min, max) = self.power_range();
        let bracket = self.rows.iter()
            .tuple_windows()
            .find(|(lo, hi)| {
                lo.power_dbm <= power_dbm && power_dbm < hi.power_dbm
            });
        let (lo, hi) = bracket
            .ok_or(CalibrationError::PowerOutOfRange {
                query: power_dbm,
                min,
                max,
            })?;
        let s = (power_dbm - lo.power_dbm) / (hi.power_dbm - lo.power_dbm);
        Ok(lo.ratio(peak) + s * (hi.ratio(peak) - lo.ratio(peak)))
    }
}
