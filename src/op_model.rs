//! Full pipeline run: calibration -> spectrum -> jitter-averaged rates ->
//! rate network -> integration, for the two documented initial conditions
//! (fresh input in |2,-2) and a ring cycle starting in |2, 2)).

use std::path::PathBuf;
use anyhow::Context;
use ndarray as nd;
use pumping_sim::{
    mkdir,
    write_npz,
    calibration::CalibrationTable,
    dynamics::RateNetwork,
    hilbert::{ State, N_STATES, STATES },
    integrate::{ pumping_cycles, StepControl, Trajectory },
    rates::{ BeamParams, JitterParams, Polarization, RateTable },
    spectrum::Physics,
};

const T_TOTAL: f64 = 5e-5; // s
const T_STEP: f64 = 1e-6; // s

fn initial(state: State) -> nd::Array1<f64> {
    let mut v: nd::Array1<f64> = nd::Array1::zeros(N_STATES);
    v[state.index()] = 100.0;
    v
}

fn report(label: &str, traj: &Trajectory) {
    println!("{label}:");
    for state in STATES[..8].iter() {
        println!("  {}: {:7.3} %", state, traj.final_population(*state));
    }
    let total = traj.total();
    println!("  total: {:.6} %", total[total.len() - 1]);
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1)
        .unwrap_or_else(|| "data/helical_resonator.txt".into());
    let cal = CalibrationTable::load(&path)
        .with_context(|| format!("loading calibration file {}", path))?;

    let phys = Physics::default();
    let beam = BeamParams::default();
    let jitter = JitterParams::default();
    let pol = Polarization::default();

    let rates = RateTable::build(&phys, &beam, &jitter, &pol, &cal)?;
    println!("jitter-averaged rates (photons / (s * atom)):");
    for edge in rates.edges.iter() {
        println!(
            "  {} -> {} ({:+9.1} MHz, {:?}): {:.4e}",
            edge.ground, edge.excited, edge.offset, edge.class, edge.rate,
        );
    }

    let network = RateNetwork::new(&phys, &rates);
    let t: nd::Array1<f64>
        = nd::Array1::range(0.0, T_TOTAL + T_STEP, T_STEP);
    let ctrl = StepControl::default();

    let input = network.evolve(&initial(State::G2m2), &t, &ctrl)
        .context("integrating the input condition")?;
    let ring = network.evolve(&initial(State::G22), &t, &ctrl)
        .context("integrating the ring-cycle condition")?;

    report("after initial input (all atoms start in |2,-2))", &input);
    report("after one cycle in the ring (all atoms start in |2, 2))", &ring);

    let retention = ring.final_population(State::G22) / 100.0;
    println!(
        "percent in |2, 2) after initial input: {:.4}",
        input.final_population(State::G22),
    );
    println!(
        "percent in |2, 2) after a cycle in the ring: {:.4}",
        100.0 * retention,
    );
    println!(
        "percent in |2, 1) and |2, 2) after a cycle in the ring: {:.4}",
        ring.final_population(State::G21) + ring.final_population(State::G22),
    );
    println!(
        "number of cycles until half the atoms are lost: {:.2}",
        pumping_cycles(retention, 0.5),
    );

    let outdir = PathBuf::from("output/op_model");
    mkdir!(outdir);
    write_npz!(
        outdir.join("trajectories.npz"),
        arrays: {
            "time" => &input.time,
            "input_pops" => &input.pops,
            "input_total" => &input.total(),
            "ring_pops" => &ring.pops,
            "ring_total" => &ring.total(),
        }
    );
    println!("wrote {:?}", outdir.join("trajectories.npz"));
    Ok(())
}
