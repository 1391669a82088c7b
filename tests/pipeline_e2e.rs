//! End-to-end pipeline tests through the public API
//!
//! These run the real `CliFilter` against `cat`, covering the full path:
//! glob discovery, transparent gzip decompression, external process wiring,
//! per-day aggregation, and the final fold modes.

#![cfg(unix)]

use chrono::{NaiveDate, NaiveDateTime};
use flate2::Compression;
use flate2::write::GzEncoder;
use logpull::{Config, FilterConfig, FinalMode, Pipeline, TimeRange};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn write_plain(log_dir: &Path, date: &str, name: &str, contents: &str) {
    let day_dir = log_dir.join(date);
    std::fs::create_dir_all(&day_dir).unwrap();
    std::fs::write(day_dir.join(name), contents).unwrap();
}

fn write_gzip(log_dir: &Path, date: &str, name: &str, contents: &str) {
    let day_dir = log_dir.join(date);
    std::fs::create_dir_all(&day_dir).unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(contents.as_bytes()).unwrap();
    std::fs::write(day_dir.join(name), encoder.finish().unwrap()).unwrap();
}

fn cat_config(root: &TempDir, range: TimeRange, final_mode: FinalMode) -> Config {
    Config {
        log_dir: root.path().join("logs"),
        output_dir: root.path().join("out"),
        log_type: "rdp".to_string(),
        filter: FilterConfig {
            program: "cat".to_string(),
            args: vec![],
        },
        time_range: range,
        parallelism: 4,
        final_mode,
    }
}

#[tokio::test]
async fn filters_mixed_plain_and_gzip_inputs_per_day() {
    let root = tempfile::tempdir().unwrap();
    let config = cat_config(
        &root,
        TimeRange::new(at(2024, 1, 1, 0), at(2024, 1, 2, 23)).unwrap(),
        FinalMode::None,
    );
    write_plain(&config.log_dir, "2024-01-01", "rdp.00.log", "plain d1h0\n");
    write_gzip(&config.log_dir, "2024-01-01", "rdp.01.log.gz", "gzip d1h1\n");
    write_gzip(&config.log_dir, "2024-01-02", "rdp.12.log.gz", "gzip d2h12\n");

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.tasks_dispatched, 3);
    assert_eq!(report.tasks_failed, 0);
    assert_eq!(report.days_succeeded, 2);

    assert_eq!(
        std::fs::read_to_string(config.output_dir.join("rdp-2024-01-01.json")).unwrap(),
        "plain d1h0\ngzip d1h1\n"
    );
    assert_eq!(
        std::fs::read_to_string(config.output_dir.join("rdp-2024-01-02.json")).unwrap(),
        "gzip d2h12\n"
    );

    // Exactly the two day files remain in the output tree.
    let files: Vec<String> = WalkDir::new(&config.output_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 2);
}

#[tokio::test]
async fn single_file_final_holds_every_day_in_order() {
    let root = tempfile::tempdir().unwrap();
    let config = cat_config(
        &root,
        TimeRange::new(at(2024, 1, 1, 0), at(2024, 1, 3, 23)).unwrap(),
        FinalMode::SingleFile,
    );
    write_plain(&config.log_dir, "2024-01-01", "rdp.04.log", "one\n");
    write_plain(&config.log_dir, "2024-01-02", "rdp.04.log", "two\n");
    write_plain(&config.log_dir, "2024-01-03", "rdp.04.log", "three\n");

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let report = pipeline.run().await.unwrap();

    let final_file = config.output_dir.join("rdp.json");
    assert_eq!(report.final_file.as_deref(), Some(final_file.as_path()));
    assert_eq!(
        std::fs::read_to_string(&final_file).unwrap(),
        "one\ntwo\nthree\n"
    );

    // Day files were folded into the final file and deleted.
    let files: Vec<String> = std::fs::read_dir(&config.output_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files, vec!["rdp.json".to_string()]);
}

#[tokio::test]
async fn stdout_final_leaves_no_output_directory() {
    let root = tempfile::tempdir().unwrap();
    let config = cat_config(
        &root,
        TimeRange::new(at(2024, 1, 1, 0), at(2024, 1, 1, 3)).unwrap(),
        FinalMode::Stdout,
    );
    write_plain(&config.log_dir, "2024-01-01", "rdp.02.log", "streamed\n");

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let report = pipeline.run().await.unwrap();

    assert!(!config.output_dir.exists());
    assert!(report.final_file.is_none());
}

#[tokio::test]
async fn unresolvable_filter_fails_before_any_dispatch() {
    let root = tempfile::tempdir().unwrap();
    let config = cat_config(
        &root,
        TimeRange::new(at(2024, 1, 1, 0), at(2024, 1, 1, 0)).unwrap(),
        FinalMode::None,
    );
    std::fs::create_dir_all(&config.log_dir).unwrap();

    let mut config = config;
    config.filter.program = "no-such-filter-binary-xyz".to_string();

    let err = Pipeline::new(config.clone()).unwrap_err();
    assert!(err.to_string().contains("no-such-filter-binary-xyz"));
    // Nothing was created.
    assert!(!config.output_dir.exists());
}

#[tokio::test]
async fn filter_arguments_are_passed_through() {
    let root = tempfile::tempdir().unwrap();
    let mut config = cat_config(
        &root,
        TimeRange::new(at(2024, 1, 1, 0), at(2024, 1, 1, 0)).unwrap(),
        FinalMode::None,
    );
    // `grep` as a stand-in for a real filter program.
    config.filter = FilterConfig {
        program: "grep".to_string(),
        args: vec!["keep".to_string()],
    };
    write_plain(
        &config.log_dir,
        "2024-01-01",
        "rdp.00.log",
        "keep this\ndrop that\nkeep too\n",
    );

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.tasks_failed, 0);
    assert_eq!(
        std::fs::read_to_string(config.output_dir.join("rdp-2024-01-01.json")).unwrap(),
        "keep this\nkeep too\n"
    );
}
