//! Monte-Carlo engine for the q-state Potts model on a periodic L×L square
//! lattice, with Metropolis single-site updates, Wolff cluster updates and
//! per-temperature thermodynamic observables.

pub mod clusters;
pub mod config;
pub mod error;
pub mod geometry;
pub mod mcmc;
pub mod simulation;
pub mod spins;
pub mod statistics;

pub use config::{InitialCondition, SimConfig, UpdateRule};
pub use error::{PottsError, Result};
pub use geometry::SquareLattice;
pub use simulation::{
    run_ensemble, run_schedule, Command, CommandSender, Simulation, StepEvent,
};
pub use spins::{LatticeStart, LatticeState};
pub use statistics::Observables;
