use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use vg_schemas::{
    FeatureFrame, FeatureRow, ModelError, TargetValueMapping, CASE_ID_COLUMN, COMPANY_AGE_COLUMN,
    ESTABLISHMENT_YEAR_COLUMN, FEATURE_COLUMNS, TARGET_COLUMN,
};

/// Labeled held-out data: feature frame plus binary targets, row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationDataset {
    frame: FeatureFrame,
    targets: Vec<u8>,
}

impl EvaluationDataset {
    /// Fails with `InvalidDataset` when empty or when targets and rows are
    /// not aligned, and with `UnknownLabel` for a target outside `{0, 1}`.
    pub fn new(frame: FeatureFrame, targets: Vec<u8>) -> Result<Self, ModelError> {
        if frame.is_empty() {
            return Err(ModelError::InvalidDataset {
                reason: "dataset has no rows".to_string(),
            });
        }
        if frame.len() != targets.len() {
            return Err(ModelError::InvalidDataset {
                reason: format!("{} rows but {} targets", frame.len(), targets.len()),
            });
        }
        if let Some((row, t)) = targets.iter().enumerate().find(|(_, t)| **t > 1) {
            return Err(ModelError::UnknownLabel {
                value: t.to_string(),
                row,
            });
        }
        Ok(Self { frame, targets })
    }

    pub fn load_csv(path: &Path, current_year: i32) -> Result<Self, ModelError> {
        let file = File::open(path).map_err(|e| ModelError::io(path, &e))?;
        Self::from_csv_reader(file, current_year)
    }

    /// Parse the raw visa CSV and engineer features.
    ///
    /// Header contract (order-independent): every feature column except
    /// `company_age`, plus `yr_of_estab` and `case_status`; `case_id` is
    /// optional. `case_id` and `yr_of_estab` are dropped after deriving
    /// `company_age`, which is appended as the last column (or recomputed in
    /// place if the file already carries it). Any other column is a schema
    /// mismatch. Feature column order follows the file, so a reordered file
    /// is caught later by the model's schema check.
    pub fn from_csv_reader<R: Read>(reader: R, current_year: i32) -> Result<Self, ModelError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()
            .map_err(invalid_csv)?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let target_idx = headers
            .iter()
            .position(|h| h == TARGET_COLUMN)
            .ok_or_else(|| ModelError::InvalidDataset {
                reason: format!("missing target column '{TARGET_COLUMN}'"),
            })?;
        let year_idx = headers
            .iter()
            .position(|h| h == ESTABLISHMENT_YEAR_COLUMN)
            .ok_or_else(|| {
                ModelError::schema(format!("missing column '{ESTABLISHMENT_YEAR_COLUMN}'"))
            })?;

        let mut columns: Vec<String> = Vec::new();
        for h in &headers {
            match h.as_str() {
                TARGET_COLUMN | ESTABLISHMENT_YEAR_COLUMN | CASE_ID_COLUMN => {}
                c if FEATURE_COLUMNS.contains(&c) => columns.push(c.to_string()),
                c => return Err(ModelError::schema(format!("unexpected column '{c}'"))),
            }
        }
        if !columns.iter().any(|c| c == COMPANY_AGE_COLUMN) {
            columns.push(COMPANY_AGE_COLUMN.to_string());
        }

        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for (row, rec) in rdr.records().enumerate() {
            let rec = rec.map_err(invalid_csv)?;
            let cell = |i: usize| rec.get(i).unwrap_or("");

            let year_raw = cell(year_idx);
            let year: i64 = year_raw.parse().map_err(|_| {
                ModelError::schema(format!(
                    "row {row}: '{ESTABLISHMENT_YEAR_COLUMN}' is not a year: {year_raw:?}"
                ))
            })?;

            let mut fields: BTreeMap<String, String> = headers
                .iter()
                .enumerate()
                .filter(|(_, h)| FEATURE_COLUMNS.contains(&h.as_str()))
                .map(|(i, h)| (h.clone(), cell(i).to_string()))
                .collect();
            fields.insert(
                COMPANY_AGE_COLUMN.to_string(),
                (i64::from(current_year) - year).to_string(),
            );

            let features = FeatureRow::from_fields(&fields).map_err(|e| match e {
                ModelError::FeatureSchemaMismatch { detail } => {
                    ModelError::schema(format!("row {row}: {detail}"))
                }
                other => other,
            })?;
            rows.push(features);
            targets.push(TargetValueMapping::encode(cell(target_idx), row)?);
        }

        Self::new(FeatureFrame::new(columns, rows)?, targets)
    }

    pub fn frame(&self) -> &FeatureFrame {
        &self.frame
    }

    pub fn targets(&self) -> &[u8] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

fn invalid_csv(e: csv::Error) -> ModelError {
    ModelError::InvalidDataset {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "case_id,continent,education_of_employee,has_job_experience,requires_job_training,no_of_employees,yr_of_estab,region_of_employment,prevailing_wage,unit_of_wage,full_time_position,case_status";

    #[test]
    fn company_age_is_derived_and_helper_columns_dropped() {
        let csv = format!(
            "{HEADER}\nEZYV01,Asia,Master's,Y,N,14513,2007,West,592.2029,Hour,Y,Denied\n"
        );
        let ds = EvaluationDataset::from_csv_reader(csv.as_bytes(), 2024).unwrap();

        let cols: Vec<&str> = ds.frame().columns().iter().map(|c| c.as_str()).collect();
        assert_eq!(cols, FEATURE_COLUMNS.to_vec());
        assert_eq!(ds.frame().rows()[0].company_age, 17);
        assert_eq!(ds.targets(), &[1]);
    }

    #[test]
    fn header_only_is_invalid_dataset() {
        let err = EvaluationDataset::from_csv_reader(format!("{HEADER}\n").as_bytes(), 2024)
            .unwrap_err();
        assert_eq!(err.kind(), "INVALID_DATASET");
    }
}
