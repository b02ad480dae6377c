use std::sync::atomic::AtomicBool;
use std::time::Instant;

use potts_sim::config::*;
use potts_sim::run_ensemble;

const SIZES: [usize; 4] = [32, 64, 96, 128];
const Q: u8 = 6;
const SAMPLES: usize = 2_000;

fn main() {
    let interrupted = AtomicBool::new(false);

    for rule in [UpdateRule::Metropolis, UpdateRule::Wolff] {
        let configs: Vec<SimConfig> = SIZES
            .iter()
            .enumerate()
            .map(|(i, &size)| SimConfig {
                size,
                num_states: Q,
                start_temperature: 0.6,
                final_temperature: 1.2,
                gradient: 0.1,
                samples_per_temperature: SAMPLES,
                sample_interval: 1,
                equilibration_sweeps: Some(100),
                rule,
                start: InitialCondition::Auto,
                seed: 42 + i as u64,
            })
            .collect();

        println!(
            "Sizes: {:?}  |  q: {}  |  Samples/point: {}  |  Rule: {:?}",
            SIZES, Q, SAMPLES, rule
        );
        println!("{}", "-".repeat(70));

        let t0 = Instant::now();
        let results = run_ensemble(&configs, &interrupted, &|| {}).unwrap();
        let elapsed = t0.elapsed().as_secs_f64();

        for (size, points) in SIZES.iter().zip(&results) {
            let last = &points[points.len() - 1];
            println!(
                "L = {:>4}  points = {:>2}  E/N(T={:.2}) = {:>8.4}",
                size,
                points.len(),
                last.temperature,
                last.energy
            );
        }
        let sweeps: usize = results.iter().map(|p| p.len() * (SAMPLES + 100)).sum();
        println!(
            "Total: {:.3} s  |  {:.3} us/sweep\n",
            elapsed,
            elapsed / sweeps as f64 * 1e6
        );
    }
}
