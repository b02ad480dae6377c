pub mod commands;
pub mod engine;

pub use commands::{Command, CommandSender};
pub use engine::{Simulation, StepEvent};

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::info;

use crate::config::SimConfig;
use crate::error::{PottsError, Result};
use crate::statistics::Observables;

fn sweep(
    sim: &mut Simulation,
    interrupted: &AtomicBool,
    on_sweep: &(dyn Fn() + Sync),
) -> Result<()> {
    if interrupted.load(Ordering::Relaxed) {
        return Err(PottsError::Interrupted);
    }
    on_sweep();
    sim.step();
    Ok(())
}

/// Walk the whole temperature schedule of `sim`.
///
/// At every temperature point:
/// 1. `equilibration` sweeps are discarded
/// 2. samples are recorded every `sample_interval` sweeps until the buffer is full
/// 3. the samples are reduced to [`Observables`], handed to `on_point` and kept
///
/// then the schedule advances. A resize, state-count change or reset queued
/// during sampling discards the samples so far and sampling starts over.
///
/// `on_sweep` is called once per sweep (useful for progress bars). Returns
/// [`PottsError::Interrupted`] as soon as `interrupted` is observed set.
pub fn run_schedule(
    sim: &mut Simulation,
    interrupted: &AtomicBool,
    on_sweep: &(dyn Fn() + Sync),
    mut on_point: impl FnMut(&Observables),
) -> Result<Vec<Observables>> {
    let mut points = Vec::with_capacity(sim.schedule().remaining_points());

    loop {
        for _ in 0..sim.equilibration() {
            sweep(sim, interrupted, on_sweep)?;
        }
        while !sim.samples_full() {
            for _ in 0..sim.sample_interval() {
                sweep(sim, interrupted, on_sweep)?;
            }
            sim.record_sample()?;
        }

        let obs = sim.finalize_observables()?;
        info!(
            size = sim.state().size(),
            t = obs.temperature,
            e = obs.energy,
            m = obs.magnetization,
            c = obs.heat_capacity,
            chi = obs.susceptibility,
            "temperature point done"
        );
        on_point(&obs);
        points.push(obs);

        if sim.advance_temperature().is_none() {
            break;
        }
    }

    Ok(points)
}

/// Run one independent simulation per config, in parallel.
///
/// Results come back in the order of `configs`. The first error aborts the
/// whole ensemble.
pub fn run_ensemble(
    configs: &[SimConfig],
    interrupted: &AtomicBool,
    on_sweep: &(dyn Fn() + Sync),
) -> Result<Vec<Vec<Observables>>> {
    let run_one = |config: &SimConfig| -> Result<Vec<Observables>> {
        let mut sim = Simulation::new(config)?;
        run_schedule(&mut sim, interrupted, on_sweep, |_| {})
    };

    if configs.len() == 1 {
        return Ok(vec![run_one(&configs[0])?]);
    }

    configs.par_iter().map(run_one).collect()
}
