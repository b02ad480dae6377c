use validator::{Validate, ValidationError};

use crate::error::{PottsError, Result};
use crate::spins::LatticeStart;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRule {
    Metropolis,
    Wolff,
}

impl TryFrom<&str> for UpdateRule {
    type Error = String;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "metropolis" => Ok(Self::Metropolis),
            "wolff" => Ok(Self::Wolff),
            _ => Err(format!(
                "unknown update rule '{s}', expected 'metropolis' or 'wolff'"
            )),
        }
    }
}

/// Initial grid of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitialCondition {
    /// Random grid for a cooling run, ordered grid otherwise.
    Auto,
    Random,
    Ordered,
}

impl TryFrom<&str> for InitialCondition {
    type Error = String;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "auto" => Ok(Self::Auto),
            "random" | "hot" => Ok(Self::Random),
            "ordered" | "cold" => Ok(Self::Ordered),
            _ => Err(format!(
                "unknown initial condition '{s}', expected 'auto', 'random' or 'ordered'"
            )),
        }
    }
}

fn validate_sim_config(cfg: &SimConfig) -> std::result::Result<(), ValidationError> {
    if cfg.size < 1 {
        return Err(ValidationError::new("size must be >= 1"));
    }
    if cfg.num_states < 2 {
        return Err(ValidationError::new("num_states must be >= 2"));
    }
    for t in [cfg.start_temperature, cfg.final_temperature] {
        if !(t.is_finite() && t > 0.0) {
            return Err(ValidationError::new("temperatures must be finite and > 0"));
        }
    }
    if !cfg.gradient.is_finite() {
        return Err(ValidationError::new("gradient must be finite"));
    }
    if cfg.start_temperature != cfg.final_temperature && cfg.gradient == 0.0 {
        return Err(ValidationError::new(
            "gradient must be non-zero when start and final temperature differ",
        ));
    }
    if cfg.samples_per_temperature < 1 {
        return Err(ValidationError::new("samples_per_temperature must be >= 1"));
    }
    if cfg.sample_interval < 1 {
        return Err(ValidationError::new("sample_interval must be >= 1"));
    }
    Ok(())
}

/// Equilibration sweeps a rule needs when none are configured.
pub(crate) fn default_equilibration(rule: UpdateRule, gradient: f64, size: usize) -> usize {
    match rule {
        UpdateRule::Metropolis => (100.0 * gradient.abs() * (size * size) as f64).round() as usize,
        UpdateRule::Wolff => 10,
    }
}

/// Parameters of one simulation run.
///
/// A "sweep" is one Metropolis attempt or one Wolff cluster flip.
#[derive(Debug, Clone, Validate)]
#[validate(schema(function = "validate_sim_config"))]
pub struct SimConfig {
    pub size: usize,
    pub num_states: u8,
    pub start_temperature: f64,
    pub final_temperature: f64,
    /// Temperature step between points; its sign is normalized to the
    /// direction of the ramp.
    pub gradient: f64,
    pub samples_per_temperature: usize,
    /// Sweeps between consecutive samples.
    pub sample_interval: usize,
    /// Sweeps discarded after every temperature change. `None` picks the
    /// rule's default, see [`SimConfig::equilibration`].
    pub equilibration_sweeps: Option<usize>,
    pub rule: UpdateRule,
    pub start: InitialCondition,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            size: 32,
            num_states: 6,
            start_temperature: 0.5,
            final_temperature: 5.0,
            gradient: 0.01,
            samples_per_temperature: 1000,
            sample_interval: 1,
            equilibration_sweeps: None,
            rule: UpdateRule::Wolff,
            start: InitialCondition::Auto,
            seed: 42,
        }
    }
}

impl SimConfig {
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| PottsError::Config(format!("{e}")))
    }

    /// Equilibration sweeps per temperature point.
    ///
    /// Defaults: Metropolis scales with the temperature step and the
    /// number of sites (`100 * |gradient| * L^2`); Wolff uses 10 cluster flips.
    pub fn equilibration(&self) -> usize {
        self.equilibration_sweeps
            .unwrap_or_else(|| default_equilibration(self.rule, self.gradient, self.size))
    }

    pub fn lattice_start(&self) -> LatticeStart {
        match self.start {
            InitialCondition::Random => LatticeStart::Random,
            InitialCondition::Ordered => LatticeStart::Ordered,
            InitialCondition::Auto if self.start_temperature > self.final_temperature => {
                LatticeStart::Random
            }
            InitialCondition::Auto => LatticeStart::Ordered,
        }
    }
}
