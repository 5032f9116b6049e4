use std::env;
use std::path::Path;
use std::process;

use numbench::benchmark;
use numbench::compressor;
use numbench::config::CompressorConfig;
use numbench::workload::{generate_input, RunSpec};

const DEFAULT_RESULTS_FILE: &str = "benchmark_results.json";
const DEFAULT_SEED: u64 = 0x5EED;

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <run_spec.json> [results.json]", args[0]);
        process::exit(1);
    }

    let spec = match RunSpec::load(&args[1]) {
        Ok(spec) => spec,
        Err(err) => {
            eprintln!("Error loading run spec '{}': {}", args[1], err);
            process::exit(1);
        }
    };
    let results_path = args
        .get(2)
        .map(String::as_str)
        .unwrap_or(DEFAULT_RESULTS_FILE);

    let (tag, dims) = match spec.data_tag().and_then(|tag| Ok((tag, spec.dimensions()?))) {
        Ok(resolved) => resolved,
        Err(err) => {
            eprintln!("Error in run spec: {}", err);
            process::exit(1);
        }
    };

    println!(
        "Running \"{}\": {} x {} over {} compressor(s), {} iteration(s)",
        spec.name,
        dims.element_count(),
        spec.data_type,
        spec.compressors.len(),
        spec.iterations
    );

    let mut results = Vec::new();
    let mut failures = 0usize;

    for compressor_spec in &spec.compressors {
        for iteration in 0..spec.iterations {
            // Fresh input per iteration; seeds stay reproducible per run.
            let seed = spec
                .seed
                .unwrap_or(DEFAULT_SEED)
                .wrapping_add(iteration as u64);
            let mut input = generate_input(tag, &dims, seed);

            let config = CompressorConfig::from_map(compressor_spec.params.clone());
            let mut comp = match compressor::create(&compressor_spec.name, config) {
                Ok(comp) => comp,
                Err(err) => {
                    eprintln!("Error: {}", err);
                    failures += 1;
                    input.release();
                    break; // the same name fails on every iteration
                }
            };

            match benchmark::run(comp.as_mut(), &spec.name, &input, tag, &dims) {
                Ok(result) => {
                    if let Err(err) = benchmark::append_result(&result, Path::new(results_path)) {
                        eprintln!("Error writing results to '{}': {}", results_path, err);
                    }
                    results.push(result);
                }
                Err(err) => {
                    eprintln!(
                        "Benchmark failed for compressor '{}': {}",
                        compressor_spec.name, err
                    );
                    failures += 1;
                }
            }

            input.release();
        }
    }

    benchmark::print_results(&results);

    if failures > 0 {
        eprintln!("{} run(s) failed", failures);
        process::exit(1);
    }
}
