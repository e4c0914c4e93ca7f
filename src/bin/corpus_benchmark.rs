//! Scaleup Corpus Benchmark
//!
//! Measures feature-extraction throughput over a synthetic corpus written to
//! a temporary directory, using the same loader and worker pool as `extract`.
//!
//! Usage:
//!   cargo run --features bench-tools --bin corpus_benchmark [-- [OPTIONS]]
//!
//! Options:
//!   --pieces <n>        Number of synthetic pieces (default: 400)
//!   --notes <n>         Note onsets per piece (default: 2000)
//!   --chunk-size <n>    Pieces per batch (default: 100)
//!   --verbose           Extra debug output

use std::path::PathBuf;
use std::time::{Duration, Instant};

use scaleup_lib::corpus::{CorpusProcessor, DEFAULT_CHUNK_SIZE};
use scaleup_lib::events::{write_event_csv, Event, EventTable};

const DEFAULT_PIECES: usize = 400;
const DEFAULT_NOTES: usize = 2000;

/// Result for one worker-count run
struct BenchmarkResult {
    workers: usize,
    elapsed: Duration,
    rows: usize,
    error: Option<String>,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let verbose = args.iter().any(|a| a == "--verbose");
    let pieces = numeric_arg(&args, "--pieces").unwrap_or(DEFAULT_PIECES).max(1);
    let notes = numeric_arg(&args, "--notes").unwrap_or(DEFAULT_NOTES).max(1);
    let chunk_size = numeric_arg(&args, "--chunk-size").unwrap_or(DEFAULT_CHUNK_SIZE);

    // Init logging
    let log_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    println!("\n=== Scaleup Corpus Benchmark ===\n");
    println!("  Pieces:     {}", pieces);
    println!("  Notes:      {} per piece", notes);
    println!("  Chunk size: {}", chunk_size);
    println!();

    let temp_dir = match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => {
            println!("  Failed to create temp dir: {}", e);
            std::process::exit(1);
        }
    };

    println!("  Writing synthetic corpus...\n");
    let mut inputs: Vec<PathBuf> = Vec::with_capacity(pieces);
    for i in 0..pieces {
        let path = temp_dir.path().join(format!("piece_{:05}.csv", i));
        let table = synthetic_piece(i as u64, notes);
        let written = std::fs::File::create(&path)
            .map_err(|e| e.to_string())
            .and_then(|f| write_event_csv(&table, std::io::BufWriter::new(f)).map_err(|e| e.to_string()));
        if let Err(e) = written {
            println!("  Failed to write {}: {}", path.display(), e);
            std::process::exit(1);
        }
        inputs.push(path);
    }

    let max_workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let mut worker_counts = vec![1];
    while worker_counts.last().copied().unwrap_or(1) * 2 <= max_workers {
        let next = worker_counts.last().copied().unwrap_or(1) * 2;
        worker_counts.push(next);
    }
    if worker_counts.last() != Some(&max_workers) {
        worker_counts.push(max_workers);
    }

    println!("  Running {} benchmarks...\n", worker_counts.len());

    let mut results = Vec::new();
    for (i, &workers) in worker_counts.iter().enumerate() {
        println!("  [{}/{}] {} workers...", i + 1, worker_counts.len(), workers);

        let processor = CorpusProcessor::new()
            .with_workers(workers)
            .with_chunk_size(chunk_size);
        let start = Instant::now();
        let result = match processor.process(&inputs) {
            Ok(report) => BenchmarkResult {
                workers,
                elapsed: start.elapsed(),
                rows: report.table.len(),
                error: None,
            },
            Err(e) => BenchmarkResult {
                workers,
                elapsed: start.elapsed(),
                rows: 0,
                error: Some(e.to_string()),
            },
        };

        match &result.error {
            Some(err) => println!("  [{}/{}] FAILED: {}\n", i + 1, worker_counts.len(), err),
            None => println!(
                "  [{}/{}] {} rows in {:.2}s\n",
                i + 1,
                worker_counts.len(),
                result.rows,
                result.elapsed.as_secs_f64()
            ),
        }
        results.push(result);
    }

    print_summary(&results);
}

fn numeric_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse::<usize>().ok())
}

/// Deterministic piece: a tempo map, a 4/4 bar grid, and two hands of notes
/// with occasional chords.
fn synthetic_piece(seed: u64, notes: usize) -> EventTable {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (state >> 33) as u32
    };

    let mut events = vec![
        Event::set_tempo(0, 0, 500_000),
        Event::time_signature(0, 0, 4, 4),
    ];
    let mut tick = 0u64;
    for n in 0..notes {
        let gap = [0u64, 120, 240, 480][(next() % 4) as usize];
        tick += gap;
        let track = (n % 2) as u32 + 1;
        let base = if track == 1 { 60 } else { 40 };
        let note = (base + next() % 24) as u8;
        let velocity = (40 + next() % 80) as u8;
        events.push(Event::note_on(tick, track, note, velocity).with_time(gap));
        events.push(Event::note_off(tick + 100, track, note).with_time(100));
        if n % 250 == 249 {
            events.push(Event::set_tempo(tick, 0, 400_000 + next() % 200_000));
        }
    }

    EventTable::from_events(events)
}

fn print_summary(results: &[BenchmarkResult]) {
    println!("=== Summary ===\n");
    println!("  {:>8}  {:>10}  {:>12}  {:>8}", "Workers", "Time (s)", "Pieces/s", "Speedup");
    println!("  {}", "-".repeat(44));

    let baseline = results
        .iter()
        .find(|r| r.error.is_none())
        .map(|r| r.elapsed.as_secs_f64());

    for result in results {
        if let Some(ref err) = result.error {
            println!("  {:>8}  FAILED: {}", result.workers, err);
            continue;
        }
        let secs = result.elapsed.as_secs_f64();
        let rate = if secs > 0.0 { result.rows as f64 / secs } else { 0.0 };
        let speedup = match baseline {
            Some(b) if secs > 0.0 => b / secs,
            _ => 0.0,
        };
        println!(
            "  {:>8}  {:>10.2}  {:>12.1}  {:>7.2}x",
            result.workers, secs, rate, speedup
        );
    }
    println!();
}
