use std::fs::File;
use std::io::Write;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use potts_sim::{Observables, SimConfig};

/// `S{L} Q{q} T{start} F{final} G{gradient} W{samples}.dat`
pub fn default_file_name(config: &SimConfig) -> String {
    format!(
        "S{} Q{} T{:?} F{:?} G{:?} W{}.dat",
        config.size,
        config.num_states,
        config.start_temperature,
        config.final_temperature,
        config.gradient,
        config.samples_per_temperature
    )
}

/// CSV record of finished temperature points, one row per point.
pub struct RecordWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl RecordWriter<File> {
    pub fn create(path: &Path, num_states: u8) -> Result<Self> {
        let file = File::create(path)
            .wrap_err_with(|| format!("Unable to create record file: {}", path.display()))?;
        Self::from_writer(file, num_states)
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn from_writer(writer: W, num_states: u8) -> Result<Self> {
        let mut inner = csv::Writer::from_writer(writer);
        let mut header: Vec<String> = [
            "temperature",
            "energy",
            "magnetization",
            "heat_capacity",
            "susceptibility",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        header.extend((1..=num_states).map(|s| format!("fraction_{s}")));
        inner.write_record(&header)?;
        inner.flush()?;
        Ok(Self { inner })
    }

    /// Append one point and flush, so a killed run keeps what it finished.
    pub fn write(&mut self, obs: &Observables) -> Result<()> {
        let mut row = vec![
            obs.temperature.to_string(),
            obs.energy.to_string(),
            obs.magnetization.to_string(),
            obs.heat_capacity.to_string(),
            obs.susceptibility.to_string(),
        ];
        row.extend(obs.population_fractions.iter().map(|f| f.to_string()));
        self.inner.write_record(&row)?;
        self.inner.flush()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| color_eyre::eyre::eyre!("flushing record: {}", e.error()))
    }
}
