//! Dump the modeled beam spectrum, the jitter waveform, and the jittered
//! rate curves of the two demonstration transitions as numeric series for
//! plotting.

use std::path::PathBuf;
use anyhow::Context;
use ndarray as nd;
use pumping_sim::{
    mkdir,
    write_npz,
    calibration::CalibrationTable,
    hilbert::{ self, State },
    rates::{ jitter_waveform, BeamParams, JitterParams, JitteredSpectra },
    spectrum::{ Band, Beam, Physics },
};

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1)
        .unwrap_or_else(|| "data/helical_resonator.txt".into());
    let cal = CalibrationTable::load(&path)
        .with_context(|| format!("loading calibration file {}", path))?;
    let phys = Physics::default();
    let beam_params = BeamParams::default();
    let jitter = JitterParams::default();

    // the unjittered spectrum: every modeled line plus the lone AOM band,
    // positions relative to the main frequency
    let beam = Beam::new(
        beam_params.power,
        beam_params.main_freq,
        beam_params.sideband_frac,
        beam_params.drive_dbm,
        &cal,
    )?;
    let lone = Band::new(
        beam_params.lone_power,
        beam_params.main_freq + beam_params.lone_offset,
    );
    let (band_freq, band_power) = beam.band_series();
    let band_offset = band_freq.mapv(|f| f - beam_params.main_freq);

    // scattering rate over a frequency scan across the full spectrum
    let scan: nd::Array1<f64> = nd::Array1::linspace(
        beam_params.main_freq - 1.1e9,
        beam_params.main_freq + 1.1e9,
        4401,
    );
    let scan_rate = beam.rate_series(&phys, &scan)
        + scan.mapv(|f| lone.transition_rate(&phys, f));
    let scan_offset = scan.mapv(|f| f - beam_params.main_freq);

    // resonant offsets of every allowed transition, for annotation
    let trans_offset: nd::Array1<f64> = hilbert::absorption_edges()
        .map(|(g, e, _)| hilbert::transition_offset(g, e) * 1e6)
        .collect();

    // the laser jitter over one period
    let (jitter_time, jitter_offset) = jitter_waveform(&jitter);

    // rate vs time during the jitter for the two documented transitions,
    // before strength and polarization weighting
    let spectra = JitteredSpectra::build(&phys, &beam_params, &jitter, &cal)?;
    let good = (State::G21, State::E22);
    let bad = (State::G22, State::E21);
    let [good_curve, bad_curve] = [good, bad].map(|(g, e)| {
        let f0 = beam_params.main_freq
            + hilbert::transition_offset(g, e) * 1e6;
        spectra.rate_curve(f0)
    });
    for (g, e) in [good, bad] {
        let f0 = beam_params.main_freq
            + hilbert::transition_offset(g, e) * 1e6;
        println!(
            "photons scattered over 1 cm by {} -> {} \
            (no strength/polarization reduction): {:.6e}",
            g, e, spectra.photons_per_cm(f0),
        );
    }

    let outdir = PathBuf::from("output/spectrum");
    mkdir!(outdir);
    write_npz!(
        outdir.join("spectrum.npz"),
        arrays: {
            "band_offset" => &band_offset,
            "band_power" => &band_power,
            "scan_offset" => &scan_offset,
            "scan_rate" => &scan_rate,
            "transition_offset" => &trans_offset,
            "jitter_time" => &jitter_time,
            "jitter_offset" => &jitter_offset,
            "good_rate_curve" => &good_curve,
            "bad_rate_curve" => &bad_curve,
        }
    );
    println!("wrote {:?}", outdir.join("spectrum.npz"));
    Ok(())
}
