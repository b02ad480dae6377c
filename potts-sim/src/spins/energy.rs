use crate::geometry::SquareLattice;

/// Local interaction energy of site `i`: minus the number of its four
/// periodic neighbors that hold the same state. Range `[-4, 0]`.
#[inline]
pub fn local_energy(lattice: &SquareLattice, grid: &[u8], i: usize) -> i32 {
    let s = grid[i];
    let matches = lattice
        .neighbors(i)
        .iter()
        .filter(|&&j| grid[j] == s)
        .count();
    -(matches as i32)
}

/// Sum of [`local_energy`] over every site.
///
/// Each bond is seen from both of its ends, so a bond between equal states
/// contributes `-2`. Single-site updates change this total by exactly twice
/// the local energy difference of the flipped site.
pub fn total_energy(lattice: &SquareLattice, grid: &[u8]) -> i64 {
    (0..lattice.n_sites)
        .map(|i| local_energy(lattice, grid, i) as i64)
        .sum()
}
