//! Loading series from files on disk.

use std::io::Write;

use shopping_forecast::core::YearMonth;
use shopping_forecast::io::{load_csv, LoaderConfig};
use shopping_forecast::ForecastError;

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn labels_series_with_file_stem() {
    let dir = tempfile::tempdir().unwrap();
    let mut contents = String::from("date,amount\n");
    for t in 0..24 {
        contents.push_str(&format!("{}-{:02},{}\n", 2021 + t / 12, t % 12 + 1, 500 + t));
    }
    let path = write_file(&dir, "kosis_online.csv", &contents);

    let series = load_csv(&path, &LoaderConfig::default()).unwrap();
    assert_eq!(series.label(), Some("kosis_online"));
    assert_eq!(series.len(), 24);
    assert_eq!(series.end(), YearMonth::new(2022, 12).unwrap());
    assert_eq!(series.year_total(2022), Some((512..524).sum::<i32>() as f64));
}

#[test]
fn explicit_label_and_column_win() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "wide.csv",
        "period,mobile,total\n2020-01,10,30\n2020-02,11,31\n",
    );
    let config = LoaderConfig::default()
        .with_value_column("mobile")
        .with_label("mobile sales");
    let series = load_csv(&path, &config).unwrap();
    assert_eq!(series.label(), Some("mobile sales"));
    assert_eq!(series.values(), &[10.0, 11.0]);
}

#[test]
fn missing_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_csv(dir.path().join("absent.csv"), &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, ForecastError::Load(_)));
}

#[test]
fn gap_reports_row_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "gap.csv", "date,amount\n2020-01,1\n2020-02,2\n2020-04,4\n");
    let err = load_csv(&path, &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, ForecastError::Parse { row: 4, .. }));
}

#[test]
fn empty_file_is_empty_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "empty.csv", "date,amount\n");
    assert_eq!(
        load_csv(&path, &LoaderConfig::default()).unwrap_err(),
        ForecastError::EmptyData
    );
}
