use std::sync::mpsc::{self, Receiver, Sender};

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{debug, info, warn};

use super::commands::{Command, CommandSender};
use crate::clusters::{ClusterFlip, ClusterMask, Wolff};
use crate::config::{default_equilibration, SimConfig, UpdateRule};
use crate::error::Result;
use crate::mcmc::{FlipEvent, Metropolis, TemperatureSchedule};
use crate::spins::{LatticeStart, LatticeState};
use crate::statistics::{ObservableAccumulator, Observables};

/// What one call to [`Simulation::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    Flip(FlipEvent),
    Cluster(ClusterFlip),
}

/// One Potts lattice together with everything needed to evolve it.
///
/// Owns the spin state, the temperature schedule, both updaters with their
/// cached tables, the per-temperature sample buffers and a seeded PRNG.
/// Given the same [`SimConfig`] and the same sequence of calls, two
/// simulations produce identical trajectories.
pub struct Simulation {
    state: LatticeState,
    schedule: TemperatureSchedule,
    rule: UpdateRule,
    start: LatticeStart,
    metropolis: Metropolis,
    wolff: Wolff,
    accumulator: ObservableAccumulator,
    /// Fixed equilibration sweeps; `None` follows the rule and lattice size.
    equilibration_sweeps: Option<usize>,
    gradient: f64,
    sample_interval: usize,
    rng: Xoshiro256StarStar,
    tx: Sender<Command>,
    rx: Receiver<Command>,
}

impl Simulation {
    pub fn new(config: &SimConfig) -> Result<Self> {
        config.check()?;

        let mut rng = Xoshiro256StarStar::seed_from_u64(config.seed);
        let schedule = TemperatureSchedule::new(
            config.start_temperature,
            config.final_temperature,
            config.gradient,
        )?;
        let start = config.lattice_start();
        let state = LatticeState::new(config.size, config.num_states, start, &mut rng);
        let (tx, rx) = mpsc::channel();

        info!(
            size = config.size,
            num_states = config.num_states,
            rule = ?config.rule,
            start = ?start,
            t_start = schedule.temperature(),
            t_final = schedule.final_temperature(),
            gradient = schedule.gradient(),
            "simulation initialized"
        );

        Ok(Self {
            metropolis: Metropolis::new(&schedule),
            wolff: Wolff::new(config.size, &schedule),
            accumulator: ObservableAccumulator::new(config.samples_per_temperature),
            equilibration_sweeps: config.equilibration_sweeps,
            gradient: config.gradient,
            sample_interval: config.sample_interval,
            rule: config.rule,
            state,
            schedule,
            start,
            rng,
            tx,
            rx,
        })
    }

    /// Handle for queueing parameter changes from elsewhere.
    pub fn commands(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    /// Apply every queued command in order. Returns how many were applied.
    pub fn apply_pending_commands(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(command) = self.rx.try_recv() {
            self.apply(command);
            applied += 1;
        }
        applied
    }

    /// Commands reaching this point have been validated by their sender.
    fn apply(&mut self, command: Command) {
        debug!(?command, "applying command");
        match command {
            Command::SetTemperature(t) => {
                if let Err(e) = self.schedule.set_temperature(t) {
                    warn!(%e, "ignoring temperature command");
                }
            }
            Command::Resize(n) => self.resize_now(n),
            Command::ChangeStateCount(q) => {
                self.change_state_count_now(q);
            }
            Command::Reset => self.reset(),
            Command::SetRule(rule) => self.rule = rule,
        }
    }

    fn resize_now(&mut self, size: usize) {
        self.state.resize(size, &mut self.rng);
        self.wolff.resize(size);
        self.accumulator.clear();
    }

    fn change_state_count_now(&mut self, num_states: u8) -> usize {
        let remapped = self.state.change_state_count(num_states, &mut self.rng);
        self.accumulator.clear();
        remapped
    }

    /// One sweep with the current rule, after applying queued commands.
    pub fn step(&mut self) -> StepEvent {
        self.apply_pending_commands();
        match self.rule {
            UpdateRule::Metropolis => StepEvent::Flip(
                self.metropolis
                    .step(&mut self.state, &self.schedule, &mut self.rng),
            ),
            UpdateRule::Wolff => StepEvent::Cluster(
                self.wolff
                    .step(&mut self.state, &self.schedule, &mut self.rng),
            ),
        }
    }

    pub fn metropolis_step(&mut self) -> FlipEvent {
        self.apply_pending_commands();
        self.metropolis
            .step(&mut self.state, &self.schedule, &mut self.rng)
    }

    pub fn wolff_step(&mut self) -> ClusterFlip {
        self.apply_pending_commands();
        self.wolff.step(&mut self.state, &self.schedule, &mut self.rng)
    }

    /// Members of the most recent Wolff cluster.
    pub fn cluster_mask(&self) -> &ClusterMask {
        self.wolff.mask()
    }

    pub fn current_energy(&self) -> i64 {
        self.state.energy()
    }

    pub fn current_populations(&self) -> &[usize] {
        self.state.populations()
    }

    pub fn state(&self) -> &LatticeState {
        &self.state
    }

    pub fn schedule(&self) -> &TemperatureSchedule {
        &self.schedule
    }

    pub fn temperature(&self) -> f64 {
        self.schedule.temperature()
    }

    pub fn rule(&self) -> UpdateRule {
        self.rule
    }

    pub fn set_rule(&mut self, rule: UpdateRule) {
        self.rule = rule;
    }

    /// Equilibration sweeps per temperature point for the current rule and
    /// lattice size.
    pub fn equilibration(&self) -> usize {
        self.equilibration_sweeps.unwrap_or_else(|| {
            default_equilibration(self.rule, self.gradient, self.state.size())
        })
    }

    pub fn sample_interval(&self) -> usize {
        self.sample_interval
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        self.schedule.set_temperature(temperature)
    }

    /// Move to the next temperature point; `None` once the ramp is done.
    pub fn advance_temperature(&mut self) -> Option<f64> {
        self.schedule.advance()
    }

    pub fn resize(&mut self, size: usize) -> Result<()> {
        Command::Resize(size).validate()?;
        self.resize_now(size);
        Ok(())
    }

    /// Returns the number of sites that had to be reassigned.
    pub fn change_state_count(&mut self, num_states: u8) -> Result<usize> {
        Command::ChangeStateCount(num_states).validate()?;
        Ok(self.change_state_count_now(num_states))
    }

    /// Rebuild the grid the way the run started (random or ordered).
    pub fn reset(&mut self) {
        self.state.reset(self.start, &mut self.rng);
        self.accumulator.clear();
    }

    pub fn samples_full(&self) -> bool {
        self.accumulator.is_full()
    }

    pub fn samples_recorded(&self) -> usize {
        self.accumulator.len()
    }

    /// Record the current energy and magnetization.
    pub fn record_sample(&mut self) -> Result<()> {
        self.accumulator
            .record_sample(self.state.energy(), self.state.magnetization())
    }

    /// Reduce the samples of the current temperature point.
    pub fn finalize_observables(&mut self) -> Result<Observables> {
        self.accumulator.finalize(
            self.schedule.temperature(),
            self.state.n_sites(),
            self.state.populations(),
        )
    }
}
