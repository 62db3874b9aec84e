//! Shared fixtures for scenario tests: raw visa CSVs with a known confusion
//! matrix, tiny models whose predictions are obvious from the row, and a
//! temp-dir layout mirroring a deployed gate.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use vg_artifacts::{save_model, LinearClassifier, ModelArtifact};
use vg_config::GateSettings;
use vg_schemas::{canonical_columns, FeatureRow};

/// Column order of the raw applications export.
pub const DATASET_HEADER: &str = "case_id,continent,education_of_employee,has_job_experience,requires_job_training,no_of_employees,yr_of_estab,region_of_employment,prevailing_wage,unit_of_wage,full_time_position,case_status";

/// Year every fixture uses as "now" when deriving `company_age`.
pub const FIXTURE_YEAR: i32 = 2024;

// ---------------------------------------------------------------------------
// Datasets
// ---------------------------------------------------------------------------

/// Row counts per confusion cell against [`continent_model`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfusionFixture {
    pub true_positive: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_negative: usize,
}

impl ConfusionFixture {
    pub fn new(tp: usize, fp: usize, fn_: usize, tn: usize) -> Self {
        Self {
            true_positive: tp,
            false_positive: fp,
            false_negative: fn_,
            true_negative: tn,
        }
    }
}

/// One raw CSV line (no newline).
pub fn applicant_line(case_id: &str, continent: &str, case_status: &str) -> String {
    format!("{case_id},{continent},Bachelor's,Y,N,250,2010,Northeast,72000.5,Year,Y,{case_status}")
}

/// Raw CSV whose F1 under [`continent_model`] is determined by `mix`:
/// Asia/Denied are true positives, Europe/Certified false positives,
/// Africa/Denied false negatives, Oceania/Certified true negatives.
pub fn dataset_csv(mix: ConfusionFixture) -> String {
    let cells = [
        ("Asia", "Denied", mix.true_positive),
        ("Europe", "Certified", mix.false_positive),
        ("Africa", "Denied", mix.false_negative),
        ("Oceania", "Certified", mix.true_negative),
    ];

    let mut out = String::from(DATASET_HEADER);
    out.push('\n');
    let mut n = 0;
    for (continent, status, count) in cells {
        for _ in 0..count {
            n += 1;
            out.push_str(&applicant_line(&format!("EZYV{n:05}"), continent, status));
            out.push('\n');
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Predicts `1` (Denied) for Asia and Europe, `0` for everything else.
pub fn continent_model() -> ModelArtifact {
    let mut classifier = LinearClassifier {
        intercept: -0.5,
        ..Default::default()
    };
    classifier.categorical.insert(
        "continent".to_string(),
        BTreeMap::from([("Asia".to_string(), 1.0), ("Europe".to_string(), 1.0)]),
    );
    ModelArtifact::new(canonical_columns(), classifier)
}

/// Predicts `label` for every row.
pub fn constant_model(label: u8) -> ModelArtifact {
    let intercept = if label == 1 { 1.0 } else { -1.0 };
    ModelArtifact::new(
        canonical_columns(),
        LinearClassifier {
            intercept,
            ..Default::default()
        },
    )
}

/// Web-form fields for one applicant (all ten, valid).
pub fn sample_fields(continent: &str) -> BTreeMap<String, String> {
    [
        ("continent", continent),
        ("education_of_employee", "Master's"),
        ("has_job_experience", "Y"),
        ("requires_job_training", "N"),
        ("no_of_employees", "2412"),
        ("region_of_employment", "West"),
        ("prevailing_wage", "83425.65"),
        ("unit_of_wage", "Year"),
        ("full_time_position", "Y"),
        ("company_age", "22"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

pub fn sample_row(continent: &str) -> FeatureRow {
    FeatureRow {
        continent: continent.to_string(),
        education_of_employee: "Master's".to_string(),
        has_job_experience: "Y".to_string(),
        requires_job_training: "N".to_string(),
        no_of_employees: 2412,
        region_of_employment: "West".to_string(),
        prevailing_wage: 83425.65,
        unit_of_wage: "Year".to_string(),
        full_time_position: "Y".to_string(),
        company_age: 22,
    }
}

// ---------------------------------------------------------------------------
// GateWorkspace
// ---------------------------------------------------------------------------

/// Temp directory laid out like a deployment:
///
/// ```text
/// serving/model.json        active slot
/// archive/model.json        archive slot
/// cycles/<cycle_id>/        per-cycle artifacts
/// history/promotions.jsonl  hash-chained history
/// data/test.csv             held-out dataset
/// challengers/*.json        training outputs
/// ```
pub struct GateWorkspace {
    dir: TempDir,
    pub active: PathBuf,
    pub archive: PathBuf,
    pub cycles_root: PathBuf,
    pub history_log: PathBuf,
    pub dataset_path: PathBuf,
}

impl GateWorkspace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp workspace")?;
        let root = dir.path().to_path_buf();
        Ok(Self {
            active: root.join("serving").join("model.json"),
            archive: root.join("archive").join("model.json"),
            cycles_root: root.join("cycles"),
            history_log: root.join("history").join("promotions.jsonl"),
            dataset_path: root.join("data").join("test.csv"),
            dir,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_dataset(&self, csv: &str) -> Result<&Path> {
        write_file(&self.dataset_path, csv.as_bytes())?;
        Ok(&self.dataset_path)
    }

    pub fn write_challenger(&self, name: &str, model: &ModelArtifact) -> Result<PathBuf> {
        let path = self.root().join("challengers").join(format!("{name}.json"));
        save_model(&path, model).with_context(|| format!("save challenger {name}"))?;
        Ok(path)
    }

    /// Write arbitrary bytes where a challenger would live.
    pub fn write_challenger_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.root().join("challengers").join(format!("{name}.json"));
        write_file(&path, bytes)?;
        Ok(path)
    }

    pub fn install_incumbent(&self, model: &ModelArtifact) -> Result<()> {
        save_model(&self.active, model).context("install incumbent")
    }

    pub fn install_active_bytes(&self, bytes: &[u8]) -> Result<()> {
        write_file(&self.active, bytes)
    }

    /// Raw bytes of the active slot, `None` when empty.
    pub fn active_bytes(&self) -> Option<Vec<u8>> {
        fs::read(&self.active).ok()
    }

    pub fn settings(&self) -> GateSettings {
        GateSettings {
            active_model_path: self.active.clone(),
            archive_model_path: self.archive.clone(),
            cycles_root: self.cycles_root.clone(),
            history_log: self.history_log.clone(),
            test_dataset_path: Some(self.dataset_path.clone()),
            current_year: FIXTURE_YEAR,
            daemon_addr: ([127, 0, 0, 1], 8899).into(),
        }
    }

    /// YAML equivalent of [`GateWorkspace::settings`].
    pub fn config_yaml(&self) -> String {
        format!(
            "storage:\n  active_model_path: \"{}\"\n  archive_model_path: \"{}\"\n  cycles_root: \"{}\"\n  history_log: \"{}\"\nevaluation:\n  test_dataset_path: \"{}\"\n  current_year: {}\n",
            self.active.display(),
            self.archive.display(),
            self.cycles_root.display(),
            self.history_log.display(),
            self.dataset_path.display(),
            FIXTURE_YEAR,
        )
    }

    pub fn write_config(&self) -> Result<PathBuf> {
        let path = self.root().join("config").join("gate.yaml");
        write_file(&path, self.config_yaml().as_bytes())?;
        Ok(path)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}
