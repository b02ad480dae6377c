/// Periodic square lattice with a precomputed neighbor table.
///
/// Sites are indexed in row-major order: coordinate `(x, y)` lives at flat
/// index `x * size + y`. Every site has four neighbors, stored in the fixed
/// order `[(x, y-1), (x-1, y), (x, y+1), (x+1, y)]` with both axes wrapped.
#[derive(Debug, Clone)]
pub struct SquareLattice {
    /// Linear extent; the lattice holds `size * size` sites.
    pub size: usize,
    /// Total number of sites (`size * size`).
    pub n_sites: usize,
    /// Neighbor table, length `n_sites * 4`.
    neighbors: Vec<u32>,
}

/// Displacements in the order the neighbor table stores them.
const OFFSETS: [(isize, isize); 4] = [(0, -1), (-1, 0), (0, 1), (1, 0)];

impl SquareLattice {
    /// Create a `size x size` lattice. `size` must be at least 1.
    pub fn new(size: usize) -> Self {
        assert!(size >= 1, "lattice size must be >= 1");
        let n_sites = size * size;
        let side = size as isize;
        let mut neighbors = vec![0u32; n_sites * 4];

        for i in 0..n_sites {
            let (x, y) = (i / size, i % size);
            for (d, &(dx, dy)) in OFFSETS.iter().enumerate() {
                let nx = (x as isize + dx).rem_euclid(side) as usize;
                let ny = (y as isize + dy).rem_euclid(side) as usize;
                neighbors[i * 4 + d] = (nx * size + ny) as u32;
            }
        }

        Self {
            size,
            n_sites,
            neighbors,
        }
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x * self.size + y
    }

    #[inline]
    pub fn coords(&self, i: usize) -> (usize, usize) {
        (i / self.size, i % self.size)
    }

    /// The four periodic neighbors of site `i`.
    #[inline]
    pub fn neighbors(&self, i: usize) -> [usize; 4] {
        let base = i * 4;
        [
            self.neighbors[base] as usize,
            self.neighbors[base + 1] as usize,
            self.neighbors[base + 2] as usize,
            self.neighbors[base + 3] as usize,
        ]
    }
}
