use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// ---------------------------------------------------------------------------
// Column vocabulary
// ---------------------------------------------------------------------------

/// Training-time feature columns, in training-time order.
pub const FEATURE_COLUMNS: [&str; 10] = [
    "continent",
    "education_of_employee",
    "has_job_experience",
    "requires_job_training",
    "no_of_employees",
    "region_of_employment",
    "prevailing_wage",
    "unit_of_wage",
    "full_time_position",
    "company_age",
];

pub const TARGET_COLUMN: &str = "case_status";
pub const ESTABLISHMENT_YEAR_COLUMN: &str = "yr_of_estab";
pub const CASE_ID_COLUMN: &str = "case_id";
pub const COMPANY_AGE_COLUMN: &str = "company_age";

pub const WAGE_UNITS: [&str; 4] = ["Hour", "Week", "Month", "Year"];

/// Columns a classifier sees as [`FeatureValue::Numeric`]; the rest are categorical.
pub const NUMERIC_COLUMNS: [&str; 3] = ["no_of_employees", "prevailing_wage", "company_age"];

const FLAG_COLUMNS: [&str; 3] = [
    "has_job_experience",
    "requires_job_training",
    "full_time_position",
];

pub fn canonical_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
}

// ---------------------------------------------------------------------------
// FeatureRow
// ---------------------------------------------------------------------------

/// Borrowed view of one cell, as a classifier sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Categorical(&'a str),
    Numeric(f64),
}

/// One applicant, already feature-engineered (company age derived).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub continent: String,
    pub education_of_employee: String,
    /// "Y" | "N"
    pub has_job_experience: String,
    /// "Y" | "N"
    pub requires_job_training: String,
    pub no_of_employees: i64,
    pub region_of_employment: String,
    pub prevailing_wage: f64,
    /// One of [`WAGE_UNITS`].
    pub unit_of_wage: String,
    /// "Y" | "N"
    pub full_time_position: String,
    pub company_age: i64,
}

impl FeatureRow {
    /// Look up a cell by column name. `None` for columns outside the schema.
    pub fn value(&self, column: &str) -> Option<FeatureValue<'_>> {
        let v = match column {
            "continent" => FeatureValue::Categorical(&self.continent),
            "education_of_employee" => FeatureValue::Categorical(&self.education_of_employee),
            "has_job_experience" => FeatureValue::Categorical(&self.has_job_experience),
            "requires_job_training" => FeatureValue::Categorical(&self.requires_job_training),
            "no_of_employees" => FeatureValue::Numeric(self.no_of_employees as f64),
            "region_of_employment" => FeatureValue::Categorical(&self.region_of_employment),
            "prevailing_wage" => FeatureValue::Numeric(self.prevailing_wage),
            "unit_of_wage" => FeatureValue::Categorical(&self.unit_of_wage),
            "full_time_position" => FeatureValue::Categorical(&self.full_time_position),
            "company_age" => FeatureValue::Numeric(self.company_age as f64),
            _ => return None,
        };
        Some(v)
    }

    /// Build a row from named string fields.
    ///
    /// Every one of [`FEATURE_COLUMNS`] must be present and non-blank; numbers
    /// must parse, flags must be `Y`/`N`, the wage unit must be one of
    /// [`WAGE_UNITS`]. No defaults are ever substituted. Fields outside the
    /// schema are ignored.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> Result<Self, ModelError> {
        let text = |name: &str| -> Result<String, ModelError> {
            match fields.get(name).map(|s| s.trim()) {
                Some(v) if !v.is_empty() => Ok(v.to_string()),
                Some(_) => Err(ModelError::schema(format!("field '{name}' is blank"))),
                None => Err(ModelError::schema(format!("missing field '{name}'"))),
            }
        };
        let int = |name: &str| -> Result<i64, ModelError> {
            let raw = text(name)?;
            // Tolerate "1200.0" style values coming out of spreadsheets.
            if let Ok(v) = raw.parse::<i64>() {
                return Ok(v);
            }
            match raw.parse::<f64>() {
                // `as` saturates; 2^63 itself is already out of range.
                Ok(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f) => {
                    Ok(f as i64)
                }
                _ => Err(ModelError::schema(format!(
                    "field '{name}' is not an integer: {raw:?}"
                ))),
            }
        };
        let float = |name: &str| -> Result<f64, ModelError> {
            let raw = text(name)?;
            match raw.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(f),
                _ => Err(ModelError::schema(format!(
                    "field '{name}' is not a number: {raw:?}"
                ))),
            }
        };

        let row = FeatureRow {
            continent: text("continent")?,
            education_of_employee: text("education_of_employee")?,
            has_job_experience: text("has_job_experience")?,
            requires_job_training: text("requires_job_training")?,
            no_of_employees: int("no_of_employees")?,
            region_of_employment: text("region_of_employment")?,
            prevailing_wage: float("prevailing_wage")?,
            unit_of_wage: text("unit_of_wage")?,
            full_time_position: text("full_time_position")?,
            company_age: int("company_age")?,
        };
        row.validate()?;
        Ok(row)
    }

    fn validate(&self) -> Result<(), ModelError> {
        for col in FLAG_COLUMNS {
            if let Some(FeatureValue::Categorical(v)) = self.value(col) {
                if v != "Y" && v != "N" {
                    return Err(ModelError::schema(format!(
                        "field '{col}' must be Y or N, got {v:?}"
                    )));
                }
            }
        }
        if !WAGE_UNITS.contains(&self.unit_of_wage.as_str()) {
            return Err(ModelError::schema(format!(
                "field 'unit_of_wage' must be one of {:?}, got {:?}",
                WAGE_UNITS, self.unit_of_wage
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FeatureFrame
// ---------------------------------------------------------------------------

/// Ordered columns plus rows. Column order is part of the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureFrame {
    /// `columns` must be a permutation of [`FEATURE_COLUMNS`].
    pub fn new(columns: Vec<String>, rows: Vec<FeatureRow>) -> Result<Self, ModelError> {
        let mut seen = BTreeSet::new();
        for c in &columns {
            if !FEATURE_COLUMNS.contains(&c.as_str()) {
                return Err(ModelError::schema(format!("unexpected column '{c}'")));
            }
            if !seen.insert(c.as_str()) {
                return Err(ModelError::schema(format!("duplicate column '{c}'")));
            }
        }
        if let Some(missing) = FEATURE_COLUMNS.iter().find(|c| !seen.contains(*c)) {
            return Err(ModelError::schema(format!("missing column '{missing}'")));
        }
        Ok(Self { columns, rows })
    }

    /// A one-row frame in canonical column order (the predictor's input shape).
    pub fn single(row: FeatureRow) -> Self {
        Self {
            columns: canonical_columns(),
            rows: vec![row],
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Fail with `FeatureSchemaMismatch` unless `actual` equals `expected` in
/// both names and order.
pub fn ensure_same_schema(expected: &[String], actual: &[String]) -> Result<(), ModelError> {
    if expected == actual {
        return Ok(());
    }

    let exp: BTreeSet<&str> = expected.iter().map(|s| s.as_str()).collect();
    let act: BTreeSet<&str> = actual.iter().map(|s| s.as_str()).collect();
    let missing: Vec<&str> = exp.difference(&act).copied().collect();
    let unexpected: Vec<&str> = act.difference(&exp).copied().collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(ModelError::schema(format!(
            "column set differs: missing {missing:?}, unexpected {unexpected:?}"
        )));
    }
    if expected.len() != actual.len() {
        return Err(ModelError::schema(format!(
            "expected {} columns, got {}",
            expected.len(),
            actual.len()
        )));
    }

    let pos = expected
        .iter()
        .zip(actual.iter())
        .position(|(e, a)| e != a)
        .unwrap_or(0);
    Err(ModelError::schema(format!(
        "column order differs at position {pos}: expected '{}', got '{}'",
        expected[pos], actual[pos]
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> BTreeMap<String, String> {
        [
            ("continent", "Asia"),
            ("education_of_employee", "Master's"),
            ("has_job_experience", "Y"),
            ("requires_job_training", "N"),
            ("no_of_employees", "2412"),
            ("region_of_employment", "Northeast"),
            ("prevailing_wage", "83425.65"),
            ("unit_of_wage", "Year"),
            ("full_time_position", "Y"),
            ("company_age", "17"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn complete_fields_parse() {
        let row = FeatureRow::from_fields(&fields()).unwrap();
        assert_eq!(row.no_of_employees, 2412);
        assert_eq!(row.value("company_age"), Some(FeatureValue::Numeric(17.0)));
        assert_eq!(row.value("case_id"), None);
    }

    #[test]
    fn out_of_range_integer_is_schema_mismatch() {
        for raw in ["1e300", "-1e300", "9223372036854775808", "9.3e18"] {
            let mut f = fields();
            f.insert("no_of_employees".to_string(), raw.to_string());
            let err = FeatureRow::from_fields(&f).unwrap_err();
            assert_eq!(err.kind(), "FEATURE_SCHEMA_MISMATCH", "{raw}");
        }

        let mut f = fields();
        f.insert("no_of_employees".to_string(), "1200.0".to_string());
        assert_eq!(FeatureRow::from_fields(&f).unwrap().no_of_employees, 1200);
    }

    #[test]
    fn malformed_number_is_schema_mismatch() {
        let mut f = fields();
        f.insert("prevailing_wage".into(), "lots".into());
        let err = FeatureRow::from_fields(&f).unwrap_err();
        assert_eq!(err.kind(), "FEATURE_SCHEMA_MISMATCH");
    }

    #[test]
    fn bad_flag_is_schema_mismatch() {
        let mut f = fields();
        f.insert("full_time_position".into(), "yes".into());
        assert!(matches!(
            FeatureRow::from_fields(&f),
            Err(ModelError::FeatureSchemaMismatch { .. })
        ));
    }

    #[test]
    fn reordered_columns_are_rejected() {
        let expected = canonical_columns();
        let mut actual = expected.clone();
        actual.swap(0, 1);
        let err = ensure_same_schema(&expected, &actual).unwrap_err();
        assert!(err.to_string().contains("position 0"), "{err}");
    }

    #[test]
    fn frame_requires_every_column() {
        let mut cols = canonical_columns();
        cols.pop();
        assert!(FeatureFrame::new(cols, vec![]).is_err());
    }
}
