//! Raw CSV → EvaluationDataset.
//!
//! GREEN when:
//! - a missing target column is INVALID_DATASET
//! - a target outside Certified/Denied is UNKNOWN_LABEL with its row
//! - an unknown column or a missing yr_of_estab is FEATURE_SCHEMA_MISMATCH
//! - company_age = current_year - yr_of_estab, replacing any value in the file
//! - loading from disk matches loading from memory

use vg_eval::EvaluationDataset;
use vg_schemas::ModelError;
use vg_testkit::{applicant_line, dataset_csv, ConfusionFixture, GateWorkspace, DATASET_HEADER};

#[test]
fn missing_target_column_is_invalid_dataset() {
    let csv = "case_id,continent,education_of_employee,has_job_experience,requires_job_training,no_of_employees,yr_of_estab,region_of_employment,prevailing_wage,unit_of_wage,full_time_position\n\
               EZYV1,Asia,Bachelor's,Y,N,250,2010,Northeast,72000.5,Year,Y\n";
    let err = EvaluationDataset::from_csv_reader(csv.as_bytes(), 2024).unwrap_err();
    assert_eq!(err.kind(), "INVALID_DATASET");
}

#[test]
fn unknown_target_value_reports_row() {
    let csv = format!(
        "{DATASET_HEADER}\n{}\n{}\n",
        applicant_line("EZYV1", "Asia", "Denied"),
        applicant_line("EZYV2", "Asia", "Withdrawn"),
    );
    let err = EvaluationDataset::from_csv_reader(csv.as_bytes(), 2024).unwrap_err();
    assert_eq!(
        err,
        ModelError::UnknownLabel {
            value: "Withdrawn".to_string(),
            row: 1
        }
    );
}

#[test]
fn unexpected_column_is_schema_mismatch() {
    let csv = format!(
        "{DATASET_HEADER},notes\n{},late filing\n",
        applicant_line("EZYV1", "Asia", "Denied")
    );
    let err = EvaluationDataset::from_csv_reader(csv.as_bytes(), 2024).unwrap_err();
    assert_eq!(err.kind(), "FEATURE_SCHEMA_MISMATCH");
}

#[test]
fn missing_establishment_year_is_schema_mismatch() {
    let csv = "continent,education_of_employee,has_job_experience,requires_job_training,no_of_employees,region_of_employment,prevailing_wage,unit_of_wage,full_time_position,case_status\n\
               Asia,Bachelor's,Y,N,250,Northeast,72000.5,Year,Y,Denied\n";
    let err = EvaluationDataset::from_csv_reader(csv.as_bytes(), 2024).unwrap_err();
    assert_eq!(err.kind(), "FEATURE_SCHEMA_MISMATCH");
}

#[test]
fn existing_company_age_is_recomputed_in_place() {
    let csv = "continent,education_of_employee,has_job_experience,requires_job_training,no_of_employees,region_of_employment,prevailing_wage,unit_of_wage,full_time_position,company_age,yr_of_estab,case_status\n\
               Asia,Bachelor's,Y,N,250,Northeast,72000.5,Year,Y,99,2000,Certified\n";
    let ds = EvaluationDataset::from_csv_reader(csv.as_bytes(), 2024).unwrap();
    assert_eq!(ds.frame().rows()[0].company_age, 24);
    assert_eq!(ds.frame().columns().last().map(String::as_str), Some("company_age"));
    assert_eq!(ds.targets(), &[0]);
}

#[test]
fn disk_and_memory_loads_agree() {
    let ws = GateWorkspace::new().unwrap();
    let csv = dataset_csv(ConfusionFixture::new(2, 1, 1, 1));
    let path = ws.write_dataset(&csv).unwrap();

    let from_disk = EvaluationDataset::load_csv(path, 2024).unwrap();
    let from_mem = EvaluationDataset::from_csv_reader(csv.as_bytes(), 2024).unwrap();
    assert_eq!(from_disk, from_mem);
    assert_eq!(from_disk.len(), 5);
}

#[test]
fn missing_file_is_io() {
    let ws = GateWorkspace::new().unwrap();
    let err = EvaluationDataset::load_csv(&ws.dataset_path, 2024).unwrap_err();
    assert_eq!(err.kind(), "IO");
}
