pub mod wolff;

pub use wolff::{add_probability, ClusterFlip, ClusterMask, Wolff};
