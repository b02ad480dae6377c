use rand::Rng;
use tracing::{debug, warn};

use super::energy::{local_energy, total_energy};
use crate::geometry::SquareLattice;

/// How a fresh grid is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatticeStart {
    /// Every site gets an independent uniform state ("hot" start).
    Random,
    /// Every site holds state 1 ("cold" start).
    Ordered,
}

/// Spin configuration of one q-state Potts lattice.
///
/// Keeps per-state populations and the aggregate energy in step with the
/// grid: after every public operation `populations` sums to `n_sites` and
/// `energy` equals [`total_energy`] of the grid. The energy follows the
/// double-counting convention of [`total_energy`].
#[derive(Debug, Clone)]
pub struct LatticeState {
    lattice: SquareLattice,
    num_states: u8,
    /// Spin values in `[1, num_states]`, row-major, length `n_sites`.
    grid: Vec<u8>,
    /// `populations[s - 1]` is the number of sites holding state `s`.
    populations: Vec<usize>,
    energy: i64,
}

#[inline]
fn random_state<R: Rng + ?Sized>(rng: &mut R, num_states: u8) -> u8 {
    rng.gen_range(1..=num_states)
}

impl LatticeState {
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        num_states: u8,
        start: LatticeStart,
        rng: &mut R,
    ) -> Self {
        assert!(num_states >= 2, "Potts model needs at least 2 states");
        let lattice = SquareLattice::new(size);
        let mut state = Self {
            grid: vec![1; lattice.n_sites],
            populations: vec![0; num_states as usize],
            lattice,
            num_states,
            energy: 0,
        };
        state.fill(start, rng);
        state
    }

    /// Build a state from an explicit grid. Values must lie in `[1, num_states]`.
    pub fn from_grid(size: usize, num_states: u8, grid: Vec<u8>) -> Self {
        assert!(num_states >= 2, "Potts model needs at least 2 states");
        let lattice = SquareLattice::new(size);
        assert_eq!(grid.len(), lattice.n_sites, "grid length must be size * size");
        assert!(
            grid.iter().all(|&s| (1..=num_states).contains(&s)),
            "grid values must lie in [1, {num_states}]"
        );
        let mut state = Self {
            lattice,
            num_states,
            grid,
            populations: vec![0; num_states as usize],
            energy: 0,
        };
        state.recount();
        state
    }

    fn fill<R: Rng + ?Sized>(&mut self, start: LatticeStart, rng: &mut R) {
        match start {
            LatticeStart::Random => {
                for s in self.grid.iter_mut() {
                    *s = random_state(rng, self.num_states);
                }
            }
            LatticeStart::Ordered => self.grid.fill(1),
        }
        self.recount();
    }

    /// Recount populations and recompute the energy from scratch.
    fn recount(&mut self) {
        self.populations.clear();
        self.populations.resize(self.num_states as usize, 0);
        for &s in &self.grid {
            self.populations[s as usize - 1] += 1;
        }
        self.energy = total_energy(&self.lattice, &self.grid);
    }

    /// Rebuild the grid in place, keeping size and state count.
    pub fn reset<R: Rng + ?Sized>(&mut self, start: LatticeStart, rng: &mut R) {
        self.fill(start, rng);
        debug!(size = self.lattice.size, ?start, energy = self.energy, "lattice reset");
    }

    /// Change the linear size.
    ///
    /// The overlapping top-left `min(old, new)` square keeps its values;
    /// cells outside it (only present when growing) are randomized.
    pub fn resize<R: Rng + ?Sized>(&mut self, new_size: usize, rng: &mut R) {
        assert!(new_size >= 1, "lattice size must be >= 1");
        let old_size = self.lattice.size;
        if new_size == old_size {
            return;
        }

        let lattice = SquareLattice::new(new_size);
        let mut grid: Vec<u8> = if new_size > old_size {
            (0..lattice.n_sites)
                .map(|_| random_state(rng, self.num_states))
                .collect()
        } else {
            vec![1; lattice.n_sites]
        };

        let keep = old_size.min(new_size);
        for x in 0..keep {
            let src = x * old_size;
            let dst = x * new_size;
            grid[dst..dst + keep].copy_from_slice(&self.grid[src..src + keep]);
        }

        self.lattice = lattice;
        self.grid = grid;
        self.recount();
        debug!(old_size, new_size, energy = self.energy, "lattice resized");
    }

    /// Change the number of allowed states.
    ///
    /// Sites holding a state above `new_states` are reassigned a uniform
    /// random state in `[1, new_states]`. Returns how many sites were
    /// reassigned.
    pub fn change_state_count<R: Rng + ?Sized>(&mut self, new_states: u8, rng: &mut R) -> usize {
        assert!(new_states >= 2, "Potts model needs at least 2 states");
        let mut remapped = 0;
        for s in self.grid.iter_mut() {
            if *s > new_states {
                *s = random_state(rng, new_states);
                remapped += 1;
            }
        }
        self.num_states = new_states;
        self.recount();

        if remapped > 0 {
            warn!(
                new_states,
                remapped, "sites above the new state count were reassigned at random"
            );
        }
        debug!(new_states, energy = self.energy, "state count changed");
        remapped
    }

    /// Write `new_state` at site `i`, keeping populations and energy in step.
    ///
    /// Returns the local energy difference of the site; the aggregate energy
    /// moves by twice that amount.
    #[inline]
    pub(crate) fn set_site(&mut self, i: usize, new_state: u8) -> i32 {
        let old_state = self.grid[i];
        let old_energy = local_energy(&self.lattice, &self.grid, i);
        self.grid[i] = new_state;
        let delta = local_energy(&self.lattice, &self.grid, i) - old_energy;

        self.energy += 2 * delta as i64;
        self.populations[old_state as usize - 1] -= 1;
        self.populations[new_state as usize - 1] += 1;
        delta
    }

    /// Tentatively write `new_state` at `i` without touching the bookkeeping.
    /// Returns `(old_state, local delta)`; pair with [`Self::commit_trial`]
    /// or [`Self::revert_trial`].
    #[inline]
    pub(crate) fn trial(&mut self, i: usize, new_state: u8) -> (u8, i32) {
        let old_state = self.grid[i];
        let old_energy = local_energy(&self.lattice, &self.grid, i);
        self.grid[i] = new_state;
        (old_state, local_energy(&self.lattice, &self.grid, i) - old_energy)
    }

    #[inline]
    pub(crate) fn commit_trial(&mut self, i: usize, old_state: u8, delta: i32) {
        self.energy += 2 * delta as i64;
        self.populations[old_state as usize - 1] -= 1;
        self.populations[self.grid[i] as usize - 1] += 1;
    }

    #[inline]
    pub(crate) fn revert_trial(&mut self, i: usize, old_state: u8) {
        self.grid[i] = old_state;
    }

    /// Uniform random state different from the one at site `i`.
    #[inline]
    pub(crate) fn other_state<R: Rng + ?Sized>(&self, i: usize, rng: &mut R) -> u8 {
        let current = self.grid[i];
        let s = rng.gen_range(1..self.num_states);
        if s >= current {
            s + 1
        } else {
            s
        }
    }

    pub fn lattice(&self) -> &SquareLattice {
        &self.lattice
    }

    pub fn size(&self) -> usize {
        self.lattice.size
    }

    pub fn n_sites(&self) -> usize {
        self.lattice.n_sites
    }

    pub fn num_states(&self) -> u8 {
        self.num_states
    }

    pub fn grid(&self) -> &[u8] {
        &self.grid
    }

    pub fn state_at(&self, x: usize, y: usize) -> u8 {
        self.grid[self.lattice.index(x, y)]
    }

    /// Aggregate energy (sum of local energies, each bond counted twice).
    pub fn energy(&self) -> i64 {
        self.energy
    }

    pub fn populations(&self) -> &[usize] {
        &self.populations
    }

    /// Energy recomputed from the grid; equals [`Self::energy`].
    pub fn recomputed_energy(&self) -> i64 {
        total_energy(&self.lattice, &self.grid)
    }

    /// Euclidean distance of the population vector from the uniform
    /// population `n_sites / q`.
    pub fn magnetization(&self) -> f64 {
        let uniform = self.lattice.n_sites as f64 / self.num_states as f64;
        self.populations
            .iter()
            .map(|&n| {
                let d = n as f64 - uniform;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    pub fn population_fractions(&self) -> Vec<f64> {
        let n = self.lattice.n_sites as f64;
        self.populations.iter().map(|&c| c as f64 / n).collect()
    }
}
