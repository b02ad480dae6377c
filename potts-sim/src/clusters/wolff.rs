use rand::Rng;
use tracing::trace;

use crate::mcmc::TemperatureSchedule;
use crate::spins::LatticeState;

/// Bond-percolation probability `1 - exp(-1/T)` for joining an equal-state
/// neighbor to a Wolff cluster.
#[inline]
pub fn add_probability(temperature: f64) -> f64 {
    1.0 - (-1.0 / temperature).exp()
}

/// Membership grid of the most recent Wolff cluster.
#[derive(Debug, Clone)]
pub struct ClusterMask {
    size: usize,
    cells: Vec<bool>,
    len: usize,
}

impl ClusterMask {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![false; size * size],
            len: 0,
        }
    }

    /// Clear every cell, reallocating if the lattice size changed.
    fn reset(&mut self, size: usize) {
        if size != self.size {
            *self = Self::new(size);
        } else {
            self.cells.fill(false);
            self.len = 0;
        }
    }

    #[inline]
    fn insert(&mut self, i: usize) {
        self.cells[i] = true;
        self.len += 1;
    }

    #[inline]
    pub fn contains_site(&self, i: usize) -> bool {
        self.cells[i]
    }

    /// False for coordinates outside the lattice.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size && self.cells[x * self.size + y]
    }

    /// Number of sites in the cluster.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }

    /// Coordinates of the member sites in row-major order.
    pub fn sites(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c)
            .map(move |(i, _)| (i / self.size, i % self.size))
    }
}

/// Summary of one Wolff move. The member sites are in [`Wolff::mask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterFlip {
    pub old_state: u8,
    pub new_state: u8,
    pub seed: (usize, usize),
    /// Number of flipped sites.
    pub size: usize,
}

/// Wolff single-cluster updater.
///
/// Owns the cluster mask and the work stack so repeated steps do not
/// allocate. The add probability is refreshed lazily from the schedule.
#[derive(Debug, Clone)]
pub struct Wolff {
    mask: ClusterMask,
    stack: Vec<usize>,
    add_probability: f64,
    epoch: u64,
}

impl Wolff {
    pub fn new(size: usize, schedule: &TemperatureSchedule) -> Self {
        Self {
            mask: ClusterMask::new(size),
            stack: Vec::with_capacity(size * size),
            add_probability: add_probability(schedule.temperature()),
            epoch: schedule.epoch(),
        }
    }

    /// Add probability valid for the schedule's current temperature.
    pub fn add_probability(&mut self, schedule: &TemperatureSchedule) -> f64 {
        if self.epoch != schedule.epoch() {
            self.add_probability = add_probability(schedule.temperature());
            self.epoch = schedule.epoch();
            trace!(
                temperature = schedule.temperature(),
                p = self.add_probability,
                "add probability refreshed"
            );
        }
        self.add_probability
    }

    pub fn mask(&self) -> &ClusterMask {
        &self.mask
    }

    /// Empty the mask and match it to a lattice of linear size `size`.
    pub(crate) fn resize(&mut self, size: usize) {
        self.mask.reset(size);
        self.stack.clear();
    }

    /// Grow and flip one cluster from a uniformly chosen seed to a uniformly
    /// chosen different state. Always accepted.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        state: &mut LatticeState,
        schedule: &TemperatureSchedule,
        rng: &mut R,
    ) -> ClusterFlip {
        let p = self.add_probability(schedule);
        let seed = rng.gen_range(0..state.n_sites());
        let new_state = state.other_state(seed, rng);
        self.grow(state, seed, new_state, p, rng)
    }

    /// Grow the cluster of `seed` with bond probability `p`, flipping every
    /// member to `new_state` as it joins.
    ///
    /// A site joins at most once: it is marked in the mask before its
    /// neighbors are examined, and flipped sites no longer hold the old state.
    pub(crate) fn grow<R: Rng + ?Sized>(
        &mut self,
        state: &mut LatticeState,
        seed: usize,
        new_state: u8,
        p: f64,
        rng: &mut R,
    ) -> ClusterFlip {
        self.mask.reset(state.size());
        self.stack.clear();

        let old_state = state.grid()[seed];
        self.mask.insert(seed);
        state.set_site(seed, new_state);
        self.stack.push(seed);

        while let Some(site) = self.stack.pop() {
            let nbs = state.lattice().neighbors(site);
            for nb in nbs {
                if self.mask.contains_site(nb) || state.grid()[nb] != old_state {
                    continue;
                }
                if rng.gen::<f64>() < p {
                    self.mask.insert(nb);
                    state.set_site(nb, new_state);
                    self.stack.push(nb);
                }
            }
        }

        ClusterFlip {
            old_state,
            new_state,
            seed: state.lattice().coords(seed),
            size: self.mask.len(),
        }
    }
}
