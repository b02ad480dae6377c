pub mod observables;

pub use observables::{ObservableAccumulator, Observables};
