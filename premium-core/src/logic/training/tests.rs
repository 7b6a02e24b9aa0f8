use std::io::Write;

use super::*;
use crate::logic::features::FEATURE_COUNT;
use crate::logic::model::{Contamination, MaxSamples};

const HEADER: &str = "age,sex,bmi,children,smoker,region,charges\n";

fn small_config() -> IsolationForestConfig {
    IsolationForestConfig {
        n_estimators: 50,
        max_samples: MaxSamples::Auto,
        contamination: Contamination::Fraction(0.05),
        seed: 7,
    }
}

/// Deterministic synthetic dataset shaped like the public insurance CSV
fn synthetic_csv(rows: usize) -> String {
    let sexes = ["female", "male"];
    let smokers = ["no", "no", "no", "yes"];
    let regions = ["northeast", "northwest", "southeast", "southwest"];

    let mut csv = String::from(HEADER);
    for i in 0..rows {
        let age = 18 + (i * 7) % 47;
        let bmi = 20.0 + ((i * 13) % 150) as f64 / 10.0;
        let children = (i * 3) % 4;
        csv.push_str(&format!(
            "{},{},{:.2},{},{},{},{:.2}\n",
            age,
            sexes[i % 2],
            bmi,
            children,
            smokers[i % 4],
            regions[(i / 2) % 4],
            1_000.0 + age as f64 * 250.0
        ));
    }
    csv
}

#[test]
fn test_read_rows_encodes_through_shared_vocabulary() {
    let data = format!("{HEADER}19,female,27.9,0,yes,southwest,16884.924\n33,Male , 22.705,0,no,northwest,21984.47\n");
    let rows = read_rows(data.as_bytes()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], [19.0, 0.0, 27.9, 0.0, 1.0, 3.0]);
    assert_eq!(rows[1], [33.0, 1.0, 22.705, 0.0, 0.0, 1.0]);
}

#[test]
fn test_unknown_category_reports_row() {
    let data = format!("{HEADER}19,female,27.9,0,yes,southwest,1\n40,male,30.0,1,sometimes,northeast,2\n");
    match read_rows(data.as_bytes()) {
        Err(TrainingError::UnknownCategory { row, field, value }) => {
            assert_eq!(row, 2);
            assert_eq!(field, "smoker");
            assert_eq!(value, "sometimes");
        }
        other => panic!("expected UnknownCategory, got {other:?}"),
    }
}

#[test]
fn test_malformed_numeric_reports_row() {
    let data = format!("{HEADER}19,female,27.9,0,yes,southwest,1\n20,male,n/a,1,no,northeast,2\n");
    let err = read_rows(data.as_bytes()).unwrap_err();
    assert!(matches!(err, TrainingError::Csv { row: 2, .. }), "{err}");
}

#[test]
fn test_empty_dataset_rejected() {
    assert!(matches!(read_rows(HEADER.as_bytes()), Err(TrainingError::EmptyDataset)));
}

#[test]
fn test_charges_column_optional() {
    let data = "age,sex,bmi,children,smoker,region\n50,m,31.0,2,n,northeast\n";
    let rows = read_rows(data.as_bytes()).unwrap();
    assert_eq!(rows[0], [50.0, 1.0, 31.0, 2.0, 0.0, 0.0]);
}

#[test]
fn test_fit_produces_forest_and_mean_background() {
    let rows = read_rows(synthetic_csv(300).as_bytes()).unwrap();
    let (forest, background) = fit(&rows, small_config()).unwrap();

    assert_eq!(forest.n_trees(), 50);
    assert_eq!(background.rows, 300);
    for i in 0..FEATURE_COUNT {
        let mean = rows.iter().map(|r| r[i]).sum::<f64>() / rows.len() as f64;
        assert!((background.values[i] - mean).abs() < 1e-9);
    }
}

#[test]
fn test_invalid_forest_config_keeps_fit_source() {
    let rows = read_rows(synthetic_csv(20).as_bytes()).unwrap();
    let config = IsolationForestConfig {
        n_estimators: 0,
        ..small_config()
    };
    let err = fit(&rows, config).unwrap_err();
    assert!(matches!(err, TrainingError::Fit(FitError::NoEstimators)));
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "n_estimators must be at least 1");
}

#[test]
fn test_train_writes_both_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("insurance.csv");
    std::fs::File::create(&data_path)
        .unwrap()
        .write_all(synthetic_csv(400).as_bytes())
        .unwrap();

    let options = TrainingOptions {
        data_path,
        output_path: dir.path().join("models/fraud_iforest.json"),
        background_path: dir.path().join("models/feature_background.json"),
        forest: small_config(),
    };
    let report = train(&options).unwrap();

    assert_eq!(report.rows, 400);
    assert_eq!(report.layout_hash, crate::logic::features::layout_hash());
    // roughly the contamination fraction of the training set is flagged
    assert!((10..=30).contains(&report.flagged), "flagged {}", report.flagged);

    let (forest, _) = IsolationForest::load(&options.output_path).unwrap();
    assert_eq!(forest.n_trees(), 50);
    let (background, _) = FeatureBackground::load(&options.background_path).unwrap();
    assert_eq!(background.rows, 400);
}

#[test]
fn test_missing_data_file() {
    let options = TrainingOptions {
        data_path: PathBuf::from("/definitely/not/here.csv"),
        ..TrainingOptions::default()
    };
    assert!(matches!(train(&options), Err(TrainingError::Io { .. })));
}
