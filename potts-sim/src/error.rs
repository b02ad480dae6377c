use thiserror::Error;

/// Errors reported by the simulation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PottsError {
    /// Rejected configuration, reported before any simulation starts.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Temperatures must be finite and strictly positive.
    #[error("temperature must be finite and > 0, got {0}")]
    InvalidTemperature(f64),
    /// A sample was recorded past the per-temperature sample count.
    #[error("sample buffer full ({capacity} samples per temperature)")]
    SampleOverflow { capacity: usize },
    /// Observables were requested before any sample was recorded.
    #[error("no samples recorded at the current temperature")]
    NoSamples,
    /// The simulation that owned the command queue has been dropped.
    #[error("command queue closed")]
    CommandChannelClosed,
    #[error("interrupted")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, PottsError>;

pub(crate) fn check_temperature(t: f64) -> Result<f64> {
    if t.is_finite() && t > 0.0 {
        Ok(t)
    } else {
        Err(PottsError::InvalidTemperature(t))
    }
}
