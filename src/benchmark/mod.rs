//! Benchmark orchestration: one compress/decompress cycle per run, with
//! timing and memory instrumentation, plus result persistence and reporting.

use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::buffer::{Buffer, Dims, TypeTag};
use crate::compressor::Compressor;
use crate::error::BenchError;
use crate::memory::{self, MemoryDelta};
use crate::timer::Stopwatch;

/// Metrics of one full compress/decompress cycle. Immutable once created.
/// `ratio` is `None` when the compressed size is zero; division by zero is
/// never reported as a number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionResult {
    pub compressor_name: String,
    pub dataset_name: String,
    pub element_count: usize,
    pub input_bytes: usize,
    pub compressed_bytes: usize,
    pub ratio: Option<f64>,
    pub compress_time_s: f64,
    pub decompress_time_s: f64,
    pub compress_memory: MemoryDelta,
    pub decompress_memory: MemoryDelta,
}

/// Original bytes over compressed bytes; `None` for a zero compressed size.
pub fn compression_ratio(input_bytes: usize, compressed_bytes: usize) -> Option<f64> {
    if compressed_bytes == 0 {
        None
    } else {
        Some(input_bytes as f64 / compressed_bytes as f64)
    }
}

fn ratio_text(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) => format!("{:.3}", r),
        None => "undefined".to_string(),
    }
}

/// Drives one full cycle for one plugin instance and assembles the result.
///
/// Any compress/decompress failure aborts the remaining phase and surfaces as
/// the run's error; `close()` still executes, and no partial result escapes.
/// Nothing is retried here.
pub fn run(
    compressor: &mut dyn Compressor,
    dataset_name: &str,
    input: &Buffer,
    tag: TypeTag,
    dims: &Dims,
) -> Result<CompressionResult, BenchError> {
    compressor.init()?;
    let outcome = run_phases(compressor, dataset_name, input, tag, dims);
    compressor.close();
    outcome
}

fn run_phases(
    compressor: &mut dyn Compressor,
    dataset_name: &str,
    input: &Buffer,
    tag: TypeTag,
    dims: &Dims,
) -> Result<CompressionResult, BenchError> {
    let element_count = dims.element_count();
    let input_bytes = element_count * tag.width();
    let name = compressor.name().to_string();

    // === Compression phase ===
    let mut timer = Stopwatch::new();
    let mem_before = memory::sample();
    timer.start();
    let encoded = compressor.compress(input, tag, dims)?;
    timer.stop();
    let compress_memory = memory::delta(mem_before, memory::sample());
    let compress_time_s = timer.elapsed();

    let compressed_bytes = encoded.len();
    let ratio = compression_ratio(input_bytes, compressed_bytes);
    tracing::info!(
        "{} ~ InputBytes: {}, OutputBytes: {}, cRatio: {}, #elements: {}, CompressTime: {:.6} s",
        name,
        input_bytes,
        compressed_bytes,
        ratio_text(ratio),
        element_count,
        compress_time_s,
    );

    // === Decompression phase === (a distinct stopwatch per phase)
    let mut timer = Stopwatch::new();
    let mem_before = memory::sample();
    timer.start();
    let mut decoded = compressor.decompress(&encoded, tag, dims)?;
    timer.stop();
    let decompress_memory = memory::delta(mem_before, memory::sample());
    let decompress_time_s = timer.elapsed();

    tracing::info!(
        "{} ~ InputBytes: {}, OutputBytes: {}, cRatio: {}, #elements: {}, DecompressTime: {:.6} s",
        name,
        compressed_bytes,
        decoded.bytes().len(),
        ratio_text(ratio),
        element_count,
        decompress_time_s,
    );

    decoded.release();

    Ok(CompressionResult {
        compressor_name: name,
        dataset_name: dataset_name.to_string(),
        element_count,
        input_bytes,
        compressed_bytes,
        ratio,
        compress_time_s,
        decompress_time_s,
        compress_memory,
        decompress_memory,
    })
}

/// Reads previously persisted results; an unreadable or unparseable file
/// starts fresh with a warning.
pub fn read_results(path: &Path) -> Vec<CompressionResult> {
    if !path.exists() {
        return Vec::new();
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!("failed to read results file '{}': {}", path.display(), err);
            return Vec::new();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|_| {
        tracing::warn!("error parsing results file '{}'; starting fresh", path.display());
        Vec::new()
    })
}

/// Appends one result to a JSON array file, creating it on first use.
pub fn append_result(result: &CompressionResult, path: &Path) -> Result<(), BenchError> {
    let mut results = read_results(path);
    results.push(result.clone());
    let json = serde_json::to_string_pretty(&results)?;
    fs::write(path, json)?;
    Ok(())
}

/// Prints one table per compressor with per-dataset averages and an overall
/// AVERAGE row, in the spirit of the persisted JSON being the real record.
pub fn print_results(results: &[CompressionResult]) {
    // Group results by (compressor, dataset) and average over iterations.
    let mut grouped: HashMap<(String, String), Vec<&CompressionResult>> = HashMap::new();
    for result in results {
        grouped
            .entry((result.compressor_name.clone(), result.dataset_name.clone()))
            .or_default()
            .push(result);
    }

    let mut compressor_groups: HashMap<String, Vec<CompressionResult>> = HashMap::new();
    for ((compressor, dataset), group) in grouped {
        let len = group.len() as f64;
        let ratios: Vec<f64> = group.iter().filter_map(|r| r.ratio).collect();
        let averaged = CompressionResult {
            compressor_name: compressor.clone(),
            dataset_name: dataset,
            element_count: group[0].element_count,
            input_bytes: group[0].input_bytes,
            compressed_bytes: (group.iter().map(|r| r.compressed_bytes).sum::<usize>() as f64
                / len)
                .round() as usize,
            ratio: if ratios.is_empty() {
                None
            } else {
                Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
            },
            compress_time_s: group.iter().map(|r| r.compress_time_s).sum::<f64>() / len,
            decompress_time_s: group.iter().map(|r| r.decompress_time_s).sum::<f64>() / len,
            compress_memory: group[0].compress_memory,
            decompress_memory: group[0].decompress_memory,
        };
        compressor_groups
            .entry(compressor)
            .or_default()
            .push(averaged);
    }

    let mut compressor_names: Vec<&String> = compressor_groups.keys().collect();
    compressor_names.sort();

    for compressor in compressor_names {
        let mut rows = compressor_groups[compressor].clone();
        rows.sort_by(|a, b| a.dataset_name.cmp(&b.dataset_name));

        let mut table = Table::new();
        table.add_row(row![
            "Dataset",
            "Elements",
            "Input (B)",
            "Output (B)",
            "Ratio",
            "Comp Time (s)",
            "Decomp Time (s)"
        ]);
        for result in &rows {
            table.add_row(row![
                &result.dataset_name,
                result.element_count,
                result.input_bytes,
                result.compressed_bytes,
                ratio_text(result.ratio),
                format!("{:.6}", result.compress_time_s),
                format!("{:.6}", result.decompress_time_s),
            ]);
        }

        let len = rows.len() as f64;
        let ratios: Vec<f64> = rows.iter().filter_map(|r| r.ratio).collect();
        let avg_ratio = if ratios.is_empty() {
            None
        } else {
            Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
        };
        table.add_row(row![
            "AVERAGE",
            "",
            "",
            "",
            ratio_text(avg_ratio),
            format!(
                "{:.6}",
                rows.iter().map(|r| r.compress_time_s).sum::<f64>() / len
            ),
            format!(
                "{:.6}",
                rows.iter().map(|r| r.decompress_time_s).sum::<f64>() / len
            ),
        ]);

        println!("\nResults for compressor: {}", compressor);
        table.printstd();
    }
}
