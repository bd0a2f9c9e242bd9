#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Rate-equation model of optical pumping in the lithium 2S<sub>1/2</sub>
//! hyperfine manifold, driven by a frequency-modulated, jittering pump
//! laser.
//!
//! The pipeline is strictly staged; each stage's output is immutable and is
//! the next stage's input:
//!
//! ```text
//! CalibrationTable -> Beam -> JitteredSpectra -> RateTable
//!                  -> RateNetwork -> Trajectory
//! ```
//!
//! - [`calibration`]: measured resonator sideband fractions, interpolated
//!   over drive power;
//! - [`spectrum`]: the laser as a tree of Lorentzian-weighted lines;
//! - [`hilbert`]: the fixed 16-sublevel atomic dataset and its
//!   allowed-transition graph;
//! - [`rates`]: time-averaging of each transition's scattering rate over one
//!   period of laser jitter;
//! - [`dynamics`]: the coupled rate equations over the transition graph;
//! - [`integrate`]: adaptive integration of the population vector with dense
//!   output.

pub mod calibration;
pub mod spectrum;
pub mod hilbert;
pub mod rates;
pub mod dynamics;
pub mod integrate;
pub mod utils;

// re-exported for the macros in `utils`
pub use ndarray_npy;
