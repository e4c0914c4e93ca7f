// Corpus runs over files on disk

use std::fs;
use std::path::{Path, PathBuf};

use scaleup_lib::corpus::{
    discover_inputs, read_file_list, CorpusError, CorpusProcessor, DiscoveryError, FeatureTable,
    OutputFormat, SkipReason,
};

const WITH_TEMPO: &str = "\
tick,track,type,note,velocity,tempo,time
0,0,set_tempo,,,500000,0
0,1,note_on,60,80,,0
0,1,note_on,64,80,,0
240,1,note_on,67,80,,240
480,1,note_off,67,0,,240
";

const WITHOUT_TEMPO: &str = "\
tick,track,type,note,velocity,time
0,1,note_on,60,80,0
240,1,note_on,62,80,240
";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn extensions() -> Vec<String> {
    vec!["csv".to_string(), "mid".to_string(), "midi".to_string()]
}

#[test]
fn test_file_without_tempo_is_skipped_by_name() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.csv", WITH_TEMPO);
    write(dir.path(), "b.csv", WITHOUT_TEMPO);
    write(dir.path(), "c.csv", WITH_TEMPO);

    let inputs = discover_inputs(&[dir.path().to_path_buf()], false, &extensions()).unwrap();
    assert_eq!(inputs.len(), 3);

    let report = CorpusProcessor::new()
        .with_workers(2)
        .process(&inputs)
        .unwrap();

    let files: Vec<&str> = report.table.rows().iter().map(|r| r.file.as_str()).collect();
    assert_eq!(files, vec!["a.csv", "c.csv"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].identity, "b.csv");
    assert_eq!(report.skipped[0].reason, SkipReason::MissingTempoColumn);
    assert!(!report.cancelled);
}

#[test]
fn test_corrupt_and_missing_files_are_contained() {
    let dir = tempfile::tempdir().unwrap();
    let good = write(dir.path(), "good.csv", WITH_TEMPO);
    let garbage = write(dir.path(), "garbage.csv", "tick,type,tempo\nsoon,note_on,1\n");
    let fake_midi = write(dir.path(), "fake.mid", "not a midi file");
    let gone = dir.path().join("gone.csv");

    let report = CorpusProcessor::new()
        .with_chunk_size(2)
        .process(&[good, garbage, fake_midi, gone])
        .unwrap();

    assert_eq!(report.table.len(), 1);
    let skipped: Vec<&str> = report.skipped.iter().map(|s| s.identity.as_str()).collect();
    assert_eq!(skipped, vec!["garbage.csv", "fake.mid", "gone.csv"]);
    assert!(report
        .skipped
        .iter()
        .all(|s| matches!(s.reason, SkipReason::Load(_))));
}

#[test]
fn test_all_skipped_is_distinct_condition() {
    let dir = tempfile::tempdir().unwrap();
    let only = write(dir.path(), "only.csv", WITHOUT_TEMPO);

    match CorpusProcessor::new().process(&[only]) {
        Err(CorpusError::EmptyCorpusResult { skipped }) => {
            assert_eq!(skipped.len(), 1);
            assert_eq!(skipped[0].identity, "only.csv");
        }
        other => panic!("expected EmptyCorpusResult, got {:?}", other.map(|r| r.table.len())),
    }
}

#[test]
fn test_discovery_respects_recursion_and_extensions() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "top.csv", WITH_TEMPO);
    write(dir.path(), "notes.txt", "ignored");
    write(dir.path(), "UPPER.MID", "");
    fs::create_dir(dir.path().join("nested")).unwrap();
    write(&dir.path().join("nested"), "deep.csv", WITH_TEMPO);

    let flat = discover_inputs(&[dir.path().to_path_buf()], false, &extensions()).unwrap();
    let names: Vec<_> = flat.iter().filter_map(|p| p.file_name()).collect();
    assert_eq!(names, vec!["UPPER.MID", "top.csv"]);

    let deep = discover_inputs(&[dir.path().to_path_buf()], true, &extensions()).unwrap();
    assert_eq!(deep.len(), 3);

    let missing = discover_inputs(&[dir.path().join("nowhere")], false, &extensions());
    assert!(matches!(missing, Err(DiscoveryError::PathNotFound(_))));

    let empty = tempfile::tempdir().unwrap();
    assert!(matches!(
        discover_inputs(&[empty.path().to_path_buf()], true, &extensions()),
        Err(DiscoveryError::NoInputs)
    ));
}

#[test]
fn test_file_list_feeds_processor() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", WITH_TEMPO);
    let b = write(dir.path(), "b.csv", WITH_TEMPO);
    let list = write(
        dir.path(),
        "inputs.txt",
        &format!("# corpus\n{}\n\n{}\n", b.display(), a.display()),
    );

    let inputs = read_file_list(&list).unwrap();
    assert_eq!(inputs, vec![b, a]);

    let report = CorpusProcessor::new().process(&inputs).unwrap();
    let files: Vec<&str> = report.table.rows().iter().map(|r| r.file.as_str()).collect();
    assert_eq!(files, vec!["b.csv", "a.csv"]);
}

#[test]
fn test_saved_table_has_schema_header() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.csv", WITH_TEMPO);
    let report = CorpusProcessor::new().process(&[a]).unwrap();

    let out = dir.path().join("out").join("features.csv");
    report.table.save(&out, OutputFormat::Csv).unwrap();

    let text = fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), FeatureTable::header().join(","));
    let row: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(row.len(), FeatureTable::header().len());
    assert_eq!(row[0], "a.csv");
    assert!(lines.next().is_none());
}
