use crate::error::{check_temperature, PottsError, Result};

/// Thermodynamic observables at one temperature point, all per site.
#[derive(Debug, Clone, PartialEq)]
pub struct Observables {
    pub temperature: f64,
    /// ⟨E⟩ / N.
    pub energy: f64,
    /// ⟨M⟩ / N.
    pub magnetization: f64,
    /// (⟨E²⟩ − ⟨E⟩²) / (T² N).
    pub heat_capacity: f64,
    /// (⟨M²⟩ − ⟨M⟩²) / (T N).
    pub susceptibility: f64,
    /// Fraction of sites in each state when the point was finalized.
    pub population_fractions: Vec<f64>,
}

/// Fixed-capacity energy and magnetization samples for one temperature.
#[derive(Debug, Clone)]
pub struct ObservableAccumulator {
    capacity: usize,
    energies: Vec<i64>,
    magnetizations: Vec<f64>,
}

impl ObservableAccumulator {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            energies: Vec::with_capacity(capacity),
            magnetizations: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.energies.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.energies.clear();
        self.magnetizations.clear();
    }

    pub fn record_sample(&mut self, energy: i64, magnetization: f64) -> Result<()> {
        if self.is_full() {
            return Err(PottsError::SampleOverflow {
                capacity: self.capacity,
            });
        }
        self.energies.push(energy);
        self.magnetizations.push(magnetization);
        Ok(())
    }

    /// Reduce the recorded samples to per-site observables and clear the
    /// buffers for the next temperature.
    pub fn finalize(
        &mut self,
        temperature: f64,
        n_sites: usize,
        populations: &[usize],
    ) -> Result<Observables> {
        check_temperature(temperature)?;
        if self.is_empty() {
            return Err(PottsError::NoSamples);
        }

        let m = self.len() as f64;
        let (mut e_sum, mut e2_sum) = (0.0f64, 0.0f64);
        for &e in &self.energies {
            let e = e as f64;
            e_sum += e;
            e2_sum += e * e;
        }
        let (mut m_sum, mut m2_sum) = (0.0f64, 0.0f64);
        for &mag in &self.magnetizations {
            m_sum += mag;
            m2_sum += mag * mag;
        }

        let (e_bar, e2_bar) = (e_sum / m, e2_sum / m);
        let (m_bar, m2_bar) = (m_sum / m, m2_sum / m);
        let heat_capacity = (e2_bar - e_bar * e_bar) / (temperature * temperature);
        let susceptibility = (m2_bar - m_bar * m_bar) / temperature;

        let n = n_sites as f64;
        let observables = Observables {
            temperature,
            energy: e_bar / n,
            magnetization: m_bar / n,
            heat_capacity: heat_capacity / n,
            susceptibility: susceptibility / n,
            population_fractions: populations.iter().map(|&c| c as f64 / n).collect(),
        };

        self.clear();
        Ok(observables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_overflow_is_an_error() {
        let mut acc = ObservableAccumulator::new(2);
        acc.record_sample(-10, 1.0).unwrap();
        acc.record_sample(-12, 2.0).unwrap();
        assert!(acc.is_full());
        assert_eq!(
            acc.record_sample(-14, 3.0),
            Err(PottsError::SampleOverflow { capacity: 2 })
        );
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn test_fluctuation_formulas() {
        let mut acc = ObservableAccumulator::new(4);
        for (e, m) in [(-8, 1.0), (-4, 3.0), (-8, 1.0), (-4, 3.0)] {
            acc.record_sample(e, m).unwrap();
        }
        let obs = acc.finalize(2.0, 4, &[3, 1]).unwrap();

        // <E> = -6, <E^2> = 40, var = 4; <M> = 2, <M^2> = 5, var = 1
        assert_relative_eq!(obs.energy, -1.5);
        assert_relative_eq!(obs.magnetization, 0.5);
        assert_relative_eq!(obs.heat_capacity, 4.0 / 4.0 / 4.0);
        assert_relative_eq!(obs.susceptibility, 1.0 / 2.0 / 4.0);
        assert_eq!(obs.population_fractions, vec![0.75, 0.25]);
        assert_eq!(obs.temperature, 2.0);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_constant_samples_have_no_fluctuations() {
        let mut acc = ObservableAccumulator::new(10);
        for _ in 0..10 {
            acc.record_sample(-64, 12.0).unwrap();
        }
        let obs = acc.finalize(0.7, 16, &[16, 0]).unwrap();
        assert_relative_eq!(obs.energy, -4.0);
        assert_relative_eq!(obs.heat_capacity, 0.0);
        assert_relative_eq!(obs.susceptibility, 0.0);
    }

    #[test]
    fn test_finalize_errors() {
        let mut acc = ObservableAccumulator::new(3);
        assert_eq!(acc.finalize(1.0, 4, &[4, 0]), Err(PottsError::NoSamples));
        acc.record_sample(0, 0.0).unwrap();
        assert_eq!(
            acc.finalize(0.0, 4, &[4, 0]),
            Err(PottsError::InvalidTemperature(0.0))
        );
        // a rejected finalize keeps the samples
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_buffers_reusable_after_finalize() {
        let mut acc = ObservableAccumulator::new(1);
        acc.record_sample(-4, 0.0).unwrap();
        acc.finalize(1.0, 1, &[1, 0]).unwrap();
        assert!(acc.record_sample(-4, 0.0).is_ok());
    }
}
