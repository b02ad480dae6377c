pub mod metropolis;
pub mod schedule;

pub use metropolis::{BoltzmannTable, FlipEvent, Metropolis};
pub use schedule::{Direction, TemperatureSchedule};
