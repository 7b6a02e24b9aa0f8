//! Insurance dataset loader
//!
//! Expected columns: age, sex, bmi, children, smoker, region, charges.
//! Categorical columns are encoded through `features::encoding`; any value
//! outside the vocabulary aborts the load with its 1-based data row number.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::TrainingError;
use crate::logic::features::{Categorical, FeatureVectorBuilder, Region, Sex, Smoker};
use crate::logic::model::iforest::Row;

/// One CSV record as stored on disk
#[derive(Debug, Clone, Deserialize)]
pub struct InsuranceRecord {
    pub age: f64,
    pub sex: String,
    pub bmi: f64,
    pub children: f64,
    pub smoker: String,
    pub region: String,
    /// Target of the premium model; unused by the anomaly detector
    #[serde(default)]
    pub charges: Option<f64>,
}

impl InsuranceRecord {
    /// Encode into the shared feature layout
    pub fn encode(&self, row: usize) -> Result<Row, TrainingError> {
        let sex = encode_label::<Sex>(&self.sex, row)?;
        let smoker = encode_label::<Smoker>(&self.smoker, row)?;
        let region = encode_label::<Region>(&self.region, row)?;

        let vector = FeatureVectorBuilder::new()
            .age(self.age)
            .sex(sex)
            .bmi(self.bmi)
            .children(self.children)
            .smoker(smoker)
            .region(region)
            .build();

        if let Some(bad) = vector.values.iter().position(|v| !v.is_finite()) {
            return Err(TrainingError::InvalidRow {
                row,
                reason: format!("non-finite value in column {}", bad),
            });
        }
        Ok(vector.values)
    }
}

fn encode_label<C: Categorical>(value: &str, row: usize) -> Result<C, TrainingError> {
    C::from_label(value).ok_or_else(|| TrainingError::UnknownCategory {
        row,
        field: C::FIELD,
        value: value.to_string(),
    })
}

/// Read and encode every record from a CSV source
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Row>, TrainingError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<InsuranceRecord>().enumerate() {
        let row = index + 1;
        let record = record.map_err(|source| TrainingError::Csv { row, source })?;
        rows.push(record.encode(row)?);
    }

    if rows.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }
    Ok(rows)
}

pub fn load_rows(path: impl AsRef<Path>) -> Result<Vec<Row>, TrainingError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TrainingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_rows(file)?;
    log::info!("Loaded {} training rows from {}", rows.len(), path.display());
    Ok(rows)
}
