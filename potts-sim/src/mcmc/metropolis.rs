use rand::Rng;
use tracing::trace;

use super::schedule::TemperatureSchedule;
use crate::spins::LatticeState;

/// Boltzmann factors `exp(-i / T)` for the only positive local energy
/// changes a 4-neighbor site can see, `i = 1..=4`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoltzmannTable {
    temperature: f64,
    factors: [f64; 4],
}

impl BoltzmannTable {
    pub fn new(temperature: f64) -> Self {
        let mut factors = [0.0; 4];
        for (i, f) in factors.iter_mut().enumerate() {
            *f = (-((i + 1) as f64) / temperature).exp();
        }
        Self {
            temperature,
            factors,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn factors(&self) -> &[f64; 4] {
        &self.factors
    }

    /// Probability of accepting a move with local energy change `delta`.
    #[inline]
    pub fn acceptance(&self, delta: i32) -> f64 {
        if delta < 1 {
            1.0
        } else {
            self.factors[delta as usize - 1]
        }
    }
}

/// Outcome of one single-site update, enough for a renderer to repaint
/// the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlipEvent {
    pub x: usize,
    pub y: usize,
    pub old_state: u8,
    /// The state written on acceptance, or the attempted state on rejection.
    pub new_state: u8,
    /// Local energy change of the attempted move.
    pub delta: i32,
    pub changed: bool,
}

/// Single-site Metropolis updater with a lazily refreshed Boltzmann table.
#[derive(Debug, Clone)]
pub struct Metropolis {
    table: BoltzmannTable,
    epoch: u64,
}

impl Metropolis {
    pub fn new(schedule: &TemperatureSchedule) -> Self {
        Self {
            table: BoltzmannTable::new(schedule.temperature()),
            epoch: schedule.epoch(),
        }
    }

    /// Rebuild the table if the schedule has moved since it was built.
    #[inline]
    fn refresh(&mut self, schedule: &TemperatureSchedule) {
        if self.epoch != schedule.epoch() {
            self.table = BoltzmannTable::new(schedule.temperature());
            self.epoch = schedule.epoch();
            trace!(temperature = schedule.temperature(), "boltzmann table refreshed");
        }
    }

    /// Table valid for the schedule's current temperature.
    pub fn table(&mut self, schedule: &TemperatureSchedule) -> &BoltzmannTable {
        self.refresh(schedule);
        &self.table
    }

    /// Attempt to move one uniformly chosen site to a uniformly chosen
    /// different state.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        state: &mut LatticeState,
        schedule: &TemperatureSchedule,
        rng: &mut R,
    ) -> FlipEvent {
        let i = rng.gen_range(0..state.n_sites());
        let new_state = state.other_state(i, rng);
        let (x, y) = state.lattice().coords(i);
        let (old_state, delta) = state.trial(i, new_state);

        let accept = if delta < 1 {
            true
        } else {
            let u: f64 = rng.gen();
            self.refresh(schedule);
            self.table.factors[delta as usize - 1] > u
        };

        if accept {
            state.commit_trial(i, old_state, delta);
        } else {
            state.revert_trial(i, old_state);
        }

        FlipEvent {
            x,
            y,
            old_state,
            new_state,
            delta,
            changed: accept,
        }
    }
}
