//! Dump the measured resonator calibration as numeric series for plotting:
//! raw peak amplitudes, total amplitude, and per-peak fractional shares vs
//! RF drive power.

use std::path::PathBuf;
use anyhow::Context;
use ndarray as nd;
use pumping_sim::{
    mkdir,
    write_npz,
    calibration::{ CalibrationTable, Peak },
};

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1)
        .unwrap_or_else(|| "data/helical_resonator.txt".into());
    let cal = CalibrationTable::load(&path)
        .with_context(|| format!("loading calibration file {}", path))?;
    let rows = cal.rows();

    let power_dbm: nd::Array1<f64>
        = rows.iter().map(|r| r.power_dbm).collect();
    let total: nd::Array1<f64> = rows.iter().map(|r| r.total()).collect();
    let peaks = [Peak::Main, Peak::Side, Peak::SecondOrder, Peak::ThirdOrder];
    let [main, side, second, third] = peaks.map(|p| {
        rows.iter().map(|r| r.amp(p)).collect::<nd::Array1<f64>>()
    });
    let [main_frac, side_frac, second_frac, third_frac] = peaks.map(|p| {
        rows.iter().map(|r| r.ratio(p)).collect::<nd::Array1<f64>>()
    });
    let reflected: nd::Array1<f64>
        = rows.iter().map(|r| r.reflected_v).collect();

    let outdir = PathBuf::from("output/resonator");
    mkdir!(outdir);
    write_npz!(
        outdir.join("peaks.npz"),
        arrays: {
            "power_dbm" => &power_dbm,
            "main" => &main,
            "side" => &side,
            "second_order" => &second,
            "third_order" => &third,
            "total" => &total,
            "main_frac" => &main_frac,
            "side_frac" => &side_frac,
            "second_order_frac" => &second_frac,
            "third_order_frac" => &third_frac,
            "reflected_v" => &reflected,
        }
    );

    let (min, max) = cal.power_range();
    println!("{} rows; calibrated drive range [{}, {}) dBm", rows.len(), min, max);
    println!("wrote {:?}", outdir.join("peaks.npz"));
    Ok(())
}
