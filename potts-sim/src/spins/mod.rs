pub mod energy;
pub mod state;

pub use energy::{local_energy, total_energy};
pub use state::{LatticeStart, LatticeState};
