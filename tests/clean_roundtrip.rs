use std::fs;

use fit_cleaner::app::pipeline::{apply_edits_file, load_session_from};
use fit_cleaner::data::{SampleConfig, generate_sample};
use fit_cleaner::domain::{DataType, NormalizeConfig};

fn write_sample(dir: &std::path::Path, name: &str, seed: u64) -> std::path::PathBuf {
    let sample = generate_sample(&SampleConfig {
        rows: 80,
        seed,
        ..SampleConfig::default()
    })
    .unwrap();
    let path = dir.join(name);
    fs::write(&path, &sample.csv).unwrap();
    path
}

#[test]
fn cleaning_a_cleaned_export_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_sample(dir.path(), "prices.csv", 3);

    let first = load_session_from(&raw, NormalizeConfig::default()).unwrap();
    let cleaned = first.export_to_dir(dir.path()).unwrap();
    assert_eq!(cleaned.file_name().unwrap(), "cleaned_prices.csv");

    let second = load_session_from(&cleaned, NormalizeConfig::default()).unwrap();
    let recleaned = second.export_to_dir(&dir.path().join("again")).unwrap();
    assert_eq!(fs::read(&cleaned).unwrap(), fs::read(&recleaned).unwrap());

    let summary = second.summary().unwrap();
    assert_eq!(summary.duplicates_dropped, 0);
    assert!(summary.rejected_rows.is_empty());
    assert!(summary.cell_errors.is_empty());
}

#[test]
fn securities_export_has_the_fixed_schema_in_date_order() {
    let dir = tempfile::tempdir().unwrap();
    let raw = write_sample(dir.path(), "messy.csv", 11);
    let session = load_session_from(&raw, NormalizeConfig::default()).unwrap();
    let cleaned = session.export_to_dir(dir.path()).unwrap();

    let mut rdr = csv::Reader::from_path(&cleaned).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(header, ["date", "open", "high", "low", "close", "volume"]);

    let dates: Vec<String> = rdr.records().map(|r| r.unwrap()[0].to_string()).collect();
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn edits_file_is_exported_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("gdp.csv");
    fs::write(&raw, "observation_date,GDP\n2024-01-01,100\n2024-04-01,\n2024-07-01,102\n").unwrap();
    let edits = dir.path().join("edits.csv");
    fs::write(&edits, "row,column,value\n1,GDP,101.0\n").unwrap();

    let config = NormalizeConfig {
        data_type: DataType::Indicator,
        ..NormalizeConfig::default()
    };
    let mut session = load_session_from(&raw, config).unwrap();
    assert_eq!(session.missing_report().unwrap().total(), 1);
    apply_edits_file(&mut session, &edits).unwrap();
    assert_eq!(session.missing_report().unwrap().total(), 0);

    let cleaned = session.export_to_dir(dir.path()).unwrap();
    assert_eq!(
        fs::read_to_string(cleaned).unwrap(),
        "date,GDP\n2024-01-01,100\n2024-04-01,101.0\n2024-07-01,102\n"
    );
}
