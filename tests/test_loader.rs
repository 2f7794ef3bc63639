//! Source chain: store first, CSV backup second, empty when both fail.

mod common;

use std::fs;
use std::io::Write;

use bakery_analytics::loader::read_transactions_csv;
use bakery_analytics::{BackupFileSource, DataLoader, DataSource, StoreSource, TransactionRow};
use flate2::write::GzEncoder;
use flate2::Compression;

// ---------------------------------------------------------------------------
// StoreSource
// ---------------------------------------------------------------------------

#[test]
fn store_source_reads_sales_table() {
    let tmp = tempfile::tempdir().unwrap();
    let db = common::create_store(tmp.path(), "sales.duckdb", &common::sample_rows());

    let rows = StoreSource::new(&db, "sales").try_load().unwrap().unwrap();
    assert_eq!(rows.len(), 6);
    assert!(rows.contains(&common::sample_rows()[4]));
}

#[test]
fn store_source_errors_when_database_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let result = StoreSource::new(tmp.path().join("absent.duckdb"), "sales").try_load();
    assert!(result.is_err());
}

#[test]
fn store_source_errors_when_table_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let db = common::create_store(tmp.path(), "sales.duckdb", &common::bagel_rows());
    assert!(StoreSource::new(&db, "orders").try_load().is_err());
}

// ---------------------------------------------------------------------------
// BackupFileSource
// ---------------------------------------------------------------------------

#[test]
fn backup_source_reads_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let csv = common::write_csv(tmp.path(), "backup.csv", &common::bagel_rows());

    let rows = BackupFileSource::new(&csv).try_load().unwrap().unwrap();
    assert_eq!(rows, common::bagel_rows());
}

#[test]
fn backup_source_reads_gzipped_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let plain = common::write_csv(tmp.path(), "backup.csv", &common::bagel_rows());
    let gz_path = tmp.path().join("backup.csv.gz");

    let mut encoder = GzEncoder::new(fs::File::create(&gz_path).unwrap(), Compression::default());
    encoder.write_all(&fs::read(plain).unwrap()).unwrap();
    encoder.finish().unwrap();

    let rows = BackupFileSource::new(&gz_path).try_load().unwrap().unwrap();
    assert_eq!(rows, common::bagel_rows());
}

#[test]
fn backup_source_missing_file_is_unavailable_not_error() {
    let tmp = tempfile::tempdir().unwrap();
    let result = BackupFileSource::new(tmp.path().join("nope.csv")).try_load().unwrap();
    assert!(result.is_none());
}

#[test]
fn backup_source_malformed_file_is_error() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad.csv");
    fs::write(&path, "city,product,units_sold\nNYC,Bagel,lots\n").unwrap();
    assert!(BackupFileSource::new(&path).try_load().is_err());
}

#[test]
fn csv_reader_rejects_non_finite_numbers() {
    let data = "city,product,units_sold,unit_price,cost_per_unit\n\
                NYC,Bagel,10,NaN,1.0\n";
    assert!(read_transactions_csv(data.as_bytes()).is_err());

    let data = "city,product,units_sold,unit_price,cost_per_unit\n\
                NYC,Bagel,inf,2.0,1.0\n";
    assert!(read_transactions_csv(data.as_bytes()).is_err());
}

#[test]
fn csv_reader_ignores_extra_columns_and_whitespace() {
    let data = "date,city,product,units_sold,unit_price,cost_per_unit\n\
                2024-01-01, NYC ,Bagel,10,2.0,1.0\n";
    let rows = read_transactions_csv(data.as_bytes()).unwrap();
    assert_eq!(rows, vec![common::bagel_rows()[0].clone()]);
}

// ---------------------------------------------------------------------------
// DataLoader
// ---------------------------------------------------------------------------

#[test]
fn loader_prefers_primary_store() {
    let tmp = tempfile::tempdir().unwrap();
    let db = common::create_store(tmp.path(), "sales.duckdb", &common::sample_rows());
    let csv = common::write_csv(tmp.path(), "backup.csv", &common::bagel_rows());

    let loader = DataLoader::new(vec![
        Box::new(StoreSource::new(&db, "sales")),
        Box::new(BackupFileSource::new(&csv)),
    ]);
    assert_eq!(loader.load().len(), 6);
}

#[test]
fn loader_falls_back_when_store_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let csv = common::write_csv(tmp.path(), "backup.csv", &common::bagel_rows());

    let loader = DataLoader::new(vec![
        Box::new(common::FailingSource),
        Box::new(BackupFileSource::new(&csv)),
    ]);
    assert_eq!(loader.load(), common::bagel_rows());
    // Every call retries the whole chain.
    assert_eq!(loader.load(), common::bagel_rows());
}

#[test]
fn loader_falls_back_when_store_is_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let db = common::create_store(tmp.path(), "sales.duckdb", &[]);
    let csv = common::write_csv(tmp.path(), "backup.csv", &common::bagel_rows());

    let loader = DataLoader::new(vec![
        Box::new(StoreSource::new(&db, "sales")),
        Box::new(BackupFileSource::new(&csv)),
    ]);
    assert_eq!(loader.load(), common::bagel_rows());
}

#[test]
fn loader_treats_non_finite_store_and_backup_alike() {
    let tmp = tempfile::tempdir().unwrap();
    let nan_row = TransactionRow::new("NYC", "Bagel", 10.0, f64::NAN, 1.0);
    let db = common::create_store(tmp.path(), "sales.duckdb", &[nan_row.clone()]);
    let bad_csv = common::write_csv(tmp.path(), "bad.csv", &[nan_row]);
    let good_csv = common::write_csv(tmp.path(), "backup.csv", &common::bagel_rows());

    let loader = DataLoader::new(vec![
        Box::new(StoreSource::new(&db, "sales")),
        Box::new(BackupFileSource::new(&bad_csv)),
        Box::new(BackupFileSource::new(&good_csv)),
    ]);
    assert_eq!(loader.load(), common::bagel_rows());
}

#[test]
fn loader_returns_empty_when_every_source_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let loader = DataLoader::new(vec![
        Box::new(common::FailingSource),
        Box::new(BackupFileSource::new(tmp.path().join("missing.csv"))),
    ]);
    assert!(loader.load().is_empty());
}

#[test]
fn loader_tries_sources_appended_later() {
    let tmp = tempfile::tempdir().unwrap();
    let mut loader = DataLoader::new(vec![
        Box::new(common::FailingSource),
        Box::new(BackupFileSource::new(tmp.path().join("missing.csv"))),
    ]);
    loader.push(Box::new(common::StaticSource(common::sample_rows())));

    assert_eq!(loader.source_names(), vec!["failing", "CSV backup", "static"]);
    assert_eq!(loader.load().len(), 6);
}

#[test]
fn empty_loader_returns_empty() {
    assert!(DataLoader::new(Vec::new()).load().is_empty());
}
