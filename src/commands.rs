// Command handlers behind the CLI

use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::catalog::DifficultyCatalog;
use crate::cli::{ExtractArgs, RecommendArgs};
use crate::config::Config;
use crate::corpus::{
    discover_inputs, read_file_list, CorpusError, CorpusProcessor, OutputFormat, PieceSource,
};
use crate::events::{import_midi, load_event_table, write_event_csv};
use crate::features::{extract_features, FEATURE_COLUMNS};

// ============================================================================
// Feature Extraction
// ============================================================================

pub fn extract(args: ExtractArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let inputs = match &args.file_list {
        Some(list) => read_file_list(list)?,
        None => discover_inputs(&args.inputs, args.recursive, &config.extensions)?,
    };

    let output = args.output.unwrap_or_else(|| config.output_path.clone());
    let format = args
        .format
        .or_else(|| format_from_extension(&output))
        .unwrap_or(config.output_format);

    let mut processor =
        CorpusProcessor::new().with_chunk_size(args.chunk_size.unwrap_or(config.chunk_size));
    if let Some(workers) = args.workers.or(config.workers) {
        processor = processor.with_workers(workers);
    }

    log::info!(
        "Extracting features from {} files ({} workers, chunks of {})",
        inputs.len(),
        processor.workers(),
        processor.chunk_size()
    );

    let report = match processor.process(&inputs) {
        Ok(report) => report,
        Err(CorpusError::EmptyCorpusResult { skipped }) => {
            for piece in &skipped {
                log::debug!("{}: {}", piece.identity, piece.reason);
            }
            println!("No features found");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    report
        .table
        .save(&output, format)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} rows to {} ({} skipped)",
        report.table.len(),
        output.display(),
        report.skipped.len()
    );
    for piece in &report.skipped {
        println!("  skipped {}: {}", piece.identity, piece.reason);
    }

    Ok(ExitCode::SUCCESS)
}

pub fn features(file: &Path) -> anyhow::Result<()> {
    let table = load_event_table(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let vector = extract_features(&file.to_path_buf().identity(), &table)
        .with_context(|| format!("Cannot extract features from {}", file.display()))?;

    let width = FEATURE_COLUMNS.iter().map(|c| c.len()).max().unwrap_or(0);
    println!("{}", vector.file);
    for (column, value) in FEATURE_COLUMNS.iter().zip(vector.values()) {
        let shown = if value.is_undefined() {
            "undefined".to_string()
        } else {
            value.to_string()
        };
        println!("  {:<width$}  {}", column, shown, width = width);
    }

    Ok(())
}

pub fn convert(midi: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| midi.with_extension("csv"));
    let table = import_midi(midi).with_context(|| format!("Failed to import {}", midi.display()))?;

    let file = std::fs::File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = std::io::BufWriter::new(file);
    write_event_csv(&table, &mut writer)?;
    writer.flush()?;

    println!("Wrote {} events to {}", table.len(), output.display());
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

pub fn recommend(args: RecommendArgs, config: &Config) -> anyhow::Result<()> {
    let catalog = DifficultyCatalog::load(&args.catalog)
        .with_context(|| format!("Failed to load catalog {}", args.catalog.display()))?;

    let (target, exclude) = match (&args.piece, args.difficulty) {
        (Some(piece), _) => {
            let entry = catalog.lookup(piece)?;
            (entry.predicted_difficulty, Some(entry.file.clone()))
        }
        (None, Some(difficulty)) => (difficulty, None),
        (None, None) => anyhow::bail!("Either --piece or --difficulty is required"),
    };

    let mut window = config.recommendation;
    if let Some(count) = args.count {
        window.count = count;
    }

    let picks = catalog.recommend(target, &window, exclude.as_deref());
    if picks.is_empty() {
        println!("No pieces found near difficulty {:.2}", target);
        return Ok(());
    }

    println!("Pieces near difficulty {:.2}:", target);
    for entry in picks {
        println!("  {:.2}  {}", entry.predicted_difficulty, entry.title());
    }
    Ok(())
}

pub fn ranges(catalog_path: &Path) -> anyhow::Result<()> {
    let catalog = DifficultyCatalog::load(catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;

    for band in catalog.browse_ranges() {
        println!("{} ({} pieces)", band.label(), band.pieces.len());
        for entry in band.pieces {
            println!("  {:.2}  {}", entry.predicted_difficulty, entry.title());
        }
    }
    Ok(())
}

fn format_from_extension(path: &Path) -> Option<OutputFormat> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "json" => Some(OutputFormat::Json),
        "csv" => Some(OutputFormat::Csv),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPO_LESS: &str = "tick,track,type,note,velocity,time\n0,1,note_on,60,80,0\n";
    const PLAYABLE: &str =
        "tick,track,type,note,velocity,tempo,time\n0,0,set_tempo,,,500000,0\n0,1,note_on,60,80,,0\n";

    fn extract_args(dir: &Path, output: PathBuf) -> ExtractArgs {
        ExtractArgs {
            inputs: vec![dir.to_path_buf()],
            output: Some(output),
            recursive: false,
            file_list: None,
            chunk_size: Some(1),
            workers: Some(1),
            format: None,
        }
    }

    #[test]
    fn test_extract_without_usable_files_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), TEMPO_LESS).unwrap();
        std::fs::write(dir.path().join("b.csv"), TEMPO_LESS).unwrap();
        let output = dir.path().join("out").join("features.csv");

        let code = extract(extract_args(dir.path(), output.clone()), &Config::default()).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert!(!output.exists());
    }

    #[test]
    fn test_extract_writes_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), PLAYABLE).unwrap();
        std::fs::write(dir.path().join("b.csv"), TEMPO_LESS).unwrap();
        let output = dir.path().join("features.json");

        let code = extract(extract_args(dir.path(), output.clone()), &Config::default()).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let rows: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["file"], "a.csv");
    }

    #[test]
    fn test_chunk_size_is_at_least_one() {
        assert_eq!(CorpusProcessor::new().with_chunk_size(0).chunk_size(), 1);
    }

    #[test]
    fn test_format_follows_output_extension() {
        assert_eq!(format_from_extension(Path::new("out.JSON")), Some(OutputFormat::Json));
        assert_eq!(format_from_extension(Path::new("out.csv")), Some(OutputFormat::Csv));
        assert_eq!(format_from_extension(Path::new("out")), None);
    }
}
