//! Poseidon Benchmark: wall-clock timing per width
//!
//! Times constant generation and the three hash entry points per width, then prints a
//! JSON summary (optionally written to `--out`).

use std::time::Instant;

use alloy_primitives::U256;
use bn254_poseidon::{ConstantProvider, GeneratedConstants, Poseidon};
use clap::Parser;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "poseidon-bench", about = "Poseidon hash timing benchmark")]
struct Cli {
    /// Smallest state width to measure
    #[arg(long, default_value = "2")]
    min_width: usize,

    /// Largest state width to measure
    #[arg(long, default_value = "17")]
    max_width: usize,

    /// Number of sponge inputs per hash call
    #[arg(long, default_value = "32")]
    inputs: usize,

    /// Measured iterations per operation
    #[arg(long, default_value = "200")]
    iterations: usize,

    /// Warmup iterations (excluded from results)
    #[arg(long, default_value = "20")]
    warmup: usize,

    /// Write the JSON summary to this path
    #[arg(long)]
    out: Option<std::path::PathBuf>,
}

#[derive(Serialize)]
struct Timing {
    avg_us: f64,
    min_us: f64,
    max_us: f64,
}

#[derive(Serialize)]
struct WidthResult {
    width: usize,
    partial_rounds: usize,
    constants_ms: f64,
    hash: Timing,
    hash_with_cap: Timing,
    hash_fixed: Timing,
}

fn measure(warmup: usize, iterations: usize, mut f: impl FnMut()) -> Timing {
    for _ in 0..warmup {
        f();
    }
    let mut samples = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let start = Instant::now();
        f();
        samples.push(start.elapsed().as_secs_f64() * 1e6);
    }
    Timing {
        avg_us: samples.iter().sum::<f64>() / samples.len().max(1) as f64,
        min_us: samples.iter().cloned().fold(f64::INFINITY, f64::min),
        max_us: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn main() {
    let cli = Cli::parse();
    let hasher = Poseidon::new(GeneratedConstants::new());
    let inputs: Vec<U256> = (1..=cli.inputs as u64).map(U256::from).collect();

    println!(
        "=== Poseidon Benchmark: widths {}..={} ({} warmup + {} measured, {} inputs) ===",
        cli.min_width, cli.max_width, cli.warmup, cli.iterations, cli.inputs
    );

    let mut results = Vec::new();
    for width in cli.min_width..=cli.max_width {
        let start = Instant::now();
        let constants = match hasher.provider().constants(width) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("skipping width {width}: {e}");
                continue;
            }
        };
        let constants_ms = start.elapsed().as_secs_f64() * 1000.0;
        let partial_rounds = constants.partial_rounds();

        let hash = measure(cli.warmup, cli.iterations, || {
            let _ = hasher.hash(&inputs, width);
        });
        let hash_with_cap = measure(cli.warmup, cli.iterations, || {
            let _ = hasher.hash_with_cap(&inputs, width, 0);
        });
        let fixed_inputs = &inputs[..(width - 1).min(inputs.len())];
        let hash_fixed = measure(cli.warmup, cli.iterations, || {
            let _ = hasher.hash_fixed(fixed_inputs);
        });

        println!(
            "  t={:>2}: constants {:.1}ms, hash {:.1}us, hash_with_cap {:.1}us, hash_fixed {:.1}us",
            width, constants_ms, hash.avg_us, hash_with_cap.avg_us, hash_fixed.avg_us
        );
        results.push(WidthResult {
            width,
            partial_rounds,
            constants_ms,
            hash,
            hash_with_cap,
            hash_fixed,
        });
    }

    let summary = serde_json::json!({
        "system": "poseidon-bn254",
        "inputs": cli.inputs,
        "iterations": cli.iterations,
        "results": results,
    });
    let pretty = serde_json::to_string_pretty(&summary).unwrap_or_default();
    println!("\n{pretty}");

    if let Some(path) = &cli.out {
        std::fs::write(path, &pretty)
            .unwrap_or_else(|e| eprintln!("warning: could not write {}: {e}", path.display()));
    }
}
