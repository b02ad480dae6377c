use crate::error::{check_temperature, PottsError, Result};

/// Sweep direction, fixed once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Heating,
    Cooling,
    /// Start and final temperature coincide; a single temperature point.
    Fixed,
}

/// Linear temperature ramp from a start to a final temperature.
///
/// Every change of the current temperature bumps [`epoch`](Self::epoch);
/// updaters tag their cached tables with the epoch they were built for and
/// rebuild them before the next acceptance test when it has moved on.
#[derive(Debug, Clone)]
pub struct TemperatureSchedule {
    origin: f64,
    steps: u64,
    temperature: f64,
    final_temperature: f64,
    /// Signed to match `direction`.
    gradient: f64,
    direction: Direction,
    epoch: u64,
}

/// Fraction of a gradient step under which the ramp snaps onto the final
/// temperature instead of producing a near-duplicate point.
const SNAP: f64 = 1e-6;

impl TemperatureSchedule {
    pub fn new(start: f64, final_temperature: f64, gradient: f64) -> Result<Self> {
        check_temperature(start)?;
        check_temperature(final_temperature)?;
        if !gradient.is_finite() {
            return Err(PottsError::Config(format!(
                "temperature gradient must be finite, got {gradient}"
            )));
        }

        let direction = if start < final_temperature {
            Direction::Heating
        } else if start > final_temperature {
            Direction::Cooling
        } else {
            Direction::Fixed
        };

        if direction != Direction::Fixed && gradient == 0.0 {
            return Err(PottsError::Config(format!(
                "zero temperature gradient cannot move from {start} to {final_temperature}"
            )));
        }

        let gradient = match direction {
            Direction::Heating => gradient.abs(),
            Direction::Cooling => -gradient.abs(),
            Direction::Fixed => 0.0,
        };

        Ok(Self {
            origin: start,
            steps: 0,
            temperature: start,
            final_temperature,
            gradient,
            direction,
            epoch: 0,
        })
    }

    /// A schedule that stays at `temperature`.
    pub fn fixed(temperature: f64) -> Result<Self> {
        Self::new(temperature, temperature, 0.0)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn final_temperature(&self) -> f64 {
        self.final_temperature
    }

    pub fn gradient(&self) -> f64 {
        self.gradient
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True once the current temperature is the last point of the ramp.
    pub fn is_finished(&self) -> bool {
        match self.direction {
            Direction::Heating => self.temperature >= self.final_temperature,
            Direction::Cooling => self.temperature <= self.final_temperature,
            Direction::Fixed => true,
        }
    }

    /// Step to the next temperature point.
    ///
    /// Returns `None` without changing anything when the final temperature
    /// has already been reached. Never overshoots the final temperature.
    pub fn advance(&mut self) -> Option<f64> {
        if self.is_finished() {
            return None;
        }

        self.steps += 1;
        let next = self.origin + self.steps as f64 * self.gradient;
        let remaining = self.final_temperature - next;
        let overshoot = match self.direction {
            Direction::Heating => remaining <= SNAP * self.gradient,
            Direction::Cooling => remaining >= SNAP * self.gradient,
            Direction::Fixed => true,
        };

        self.temperature = if overshoot {
            self.final_temperature
        } else {
            next
        };
        self.epoch += 1;
        Some(self.temperature)
    }

    /// Jump to `temperature`; the ramp continues from there.
    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        check_temperature(temperature)?;
        self.origin = temperature;
        self.steps = 0;
        self.temperature = temperature;
        self.epoch += 1;
        Ok(())
    }

    /// Temperature points left to sample, the current one included.
    pub fn remaining_points(&self) -> usize {
        if self.is_finished() {
            return 1;
        }
        let span = (self.final_temperature - self.temperature) / self.gradient;
        (span - SNAP).ceil().max(0.0) as usize + 1
    }
}
