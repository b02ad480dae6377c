//! Batch driver: ramps a Potts lattice through a temperature schedule and
//! records per-point observables to CSV.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use potts_sim::mcmc::TemperatureSchedule;
use potts_sim::{
    run_ensemble, run_schedule, InitialCondition, Observables, PottsError, SimConfig, Simulation,
    UpdateRule,
};

mod output;

use output::{default_file_name, RecordWriter};

fn parse_rule(s: &str) -> Result<UpdateRule, String> {
    UpdateRule::try_from(s)
}

fn parse_start(s: &str) -> Result<InitialCondition, String> {
    InitialCondition::try_from(s)
}

/// q-state Potts model Monte-Carlo sampler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Linear lattice size L (L x L sites)
    #[arg(long, default_value_t = 32)]
    size: usize,

    /// Run several lattice sizes in parallel, e.g. `--sizes 16,32,64`
    #[arg(long, value_delimiter = ',', conflicts_with = "size")]
    sizes: Vec<usize>,

    /// Number of Potts states q
    #[arg(short = 'q', long, default_value_t = 6)]
    states: u8,

    #[arg(long, default_value_t = 0.5)]
    start_temp: f64,

    #[arg(long, default_value_t = 5.0)]
    final_temp: f64,

    /// Temperature step between points
    #[arg(long, default_value_t = 0.01)]
    gradient: f64,

    /// Samples per temperature point
    #[arg(long, default_value_t = 1000)]
    samples: usize,

    /// Sweeps between samples
    #[arg(long, default_value_t = 1)]
    sample_interval: usize,

    /// Sweeps discarded after each temperature change (default depends on the rule)
    #[arg(long)]
    equilibration: Option<usize>,

    /// Update rule (metropolis or wolff)
    #[arg(long, default_value = "wolff", value_parser = parse_rule)]
    rule: UpdateRule,

    /// Initial grid (auto, random or ordered)
    #[arg(long, default_value = "auto", value_parser = parse_start)]
    start: InitialCondition,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Record file; defaults to `S{L} Q{q} T{start} F{final} G{grad} W{samples}.dat`.
    /// With `--sizes` this is a directory.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn config(&self, size: usize, seed: u64) -> SimConfig {
        SimConfig {
            size,
            num_states: self.states,
            start_temperature: self.start_temp,
            final_temperature: self.final_temp,
            gradient: self.gradient,
            samples_per_temperature: self.samples,
            sample_interval: self.sample_interval,
            equilibration_sweeps: self.equilibration,
            rule: self.rule,
            start: self.start,
            seed,
        }
    }
}

/// Sweeps a full schedule takes when no command interferes.
fn planned_sweeps(config: &SimConfig) -> Result<u64> {
    let points = TemperatureSchedule::new(
        config.start_temperature,
        config.final_temperature,
        config.gradient,
    )?
    .remaining_points();
    let per_point = config.equilibration() + config.samples_per_temperature * config.sample_interval;
    Ok((points * per_point) as u64)
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{msg} [{bar:40}] {pos}/{len} [{elapsed_precise} < {eta_precise}, {per_sec}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> "),
    );
    pb.set_message("sweeps");
    pb
}

fn run_single(args: &Args, interrupted: &AtomicBool) -> Result<()> {
    let config = args.config(args.size, args.seed);
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_file_name(&config)));

    let mut sim = Simulation::new(&config).wrap_err("Invalid simulation parameters")?;
    let mut writer = RecordWriter::create(&path, config.num_states)?;
    let pb = progress_bar(planned_sweeps(&config)?);

    let mut written = 0;
    let mut write_result = Ok(());
    let result = run_schedule(
        &mut sim,
        interrupted,
        &|| pb.inc(1),
        |obs: &Observables| {
            pb.set_message(format!("T = {:.4}", obs.temperature));
            if write_result.is_ok() {
                write_result = writer.write(obs);
                written += 1;
            }
        },
    );
    pb.finish();
    write_result?;

    match result {
        Ok(_) => info!(points = written, path = %path.display(), "record written"),
        Err(PottsError::Interrupted) => {
            warn!(points = written, path = %path.display(), "interrupted, record holds the finished points")
        }
        Err(e) => return Err(e).wrap_err("Simulation aborted"),
    }
    Ok(())
}

fn run_sizes(args: &Args, interrupted: &AtomicBool) -> Result<()> {
    let configs: Vec<SimConfig> = args
        .sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| args.config(size, args.seed.wrapping_add(i as u64)))
        .collect();

    let mut total = 0;
    for config in &configs {
        config.check().wrap_err("Invalid simulation parameters")?;
        total += planned_sweeps(config)?;
    }
    let pb = progress_bar(total);

    let results = match run_ensemble(&configs, interrupted, &|| pb.inc(1)) {
        Ok(results) => results,
        Err(PottsError::Interrupted) => {
            pb.abandon();
            warn!("interrupted, no records written");
            return Ok(());
        }
        Err(e) => return Err(e).wrap_err("Ensemble aborted"),
    };
    pb.finish();

    let dir = args.output.clone().unwrap_or_default();
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(&dir)
            .wrap_err_with(|| format!("Unable to create output directory: {}", dir.display()))?;
    }
    for (config, points) in configs.iter().zip(&results) {
        let path = dir.join(default_file_name(config));
        let mut writer = RecordWriter::create(&path, config.num_states)?;
        for obs in points {
            writer.write(obs)?;
        }
        info!(size = config.size, points = points.len(), path = %path.display(), "record written");
    }
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!(?args, "starting");

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
        .wrap_err("Unable to install Ctrl-C handler")?;

    if args.sizes.is_empty() {
        run_single(&args, &interrupted)
    } else {
        run_sizes(&args, &interrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sizes_and_rule() {
        let args = Args::try_parse_from([
            "potts", "--sizes", "8,16", "-q", "3", "--rule", "metropolis", "--start", "cold",
        ])
        .unwrap();
        assert_eq!(args.sizes, vec![8, 16]);
        assert_eq!(args.rule, UpdateRule::Metropolis);
        assert_eq!(args.start, InitialCondition::Ordered);
        let config = args.config(8, 1);
        assert_eq!(config.num_states, 3);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_bad_rule_rejected() {
        assert!(Args::try_parse_from(["potts", "--rule", "gibbs"]).is_err());
    }

    #[test]
    fn test_planned_sweeps() {
        let args = Args::try_parse_from([
            "potts",
            "--size",
            "4",
            "--start-temp",
            "1.0",
            "--final-temp",
            "2.0",
            "--gradient",
            "0.5",
            "--samples",
            "10",
            "--sample-interval",
            "3",
            "--equilibration",
            "7",
        ])
        .unwrap();
        assert_eq!(planned_sweeps(&args.config(4, 0)).unwrap(), 3 * (7 + 10 * 3));
    }

    #[test]
    fn test_single_run_writes_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.dat");
        let args = Args::try_parse_from([
            "potts",
            "--size",
            "4",
            "-q",
            "2",
            "--start-temp",
            "1.0",
            "--final-temp",
            "1.5",
            "--gradient",
            "0.5",
            "--samples",
            "5",
            "--equilibration",
            "2",
            "--output",
            path.to_str().unwrap(),
        ])
        .unwrap();
        run_single(&args, &AtomicBool::new(false)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("temperature,"));
    }

    #[test]
    fn test_interrupted_run_keeps_header_only_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.dat");
        let args = Args::try_parse_from([
            "potts",
            "--size",
            "4",
            "-q",
            "3",
            "--samples",
            "5",
            "--output",
            path.to_str().unwrap(),
        ])
        .unwrap();
        run_single(&args, &AtomicBool::new(true)).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("temperature,"));
    }

    #[test]
    fn test_interrupted_ensemble_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "potts",
            "--sizes",
            "4,6",
            "--samples",
            "5",
            "--output",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        run_sizes(&args, &AtomicBool::new(true)).unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
