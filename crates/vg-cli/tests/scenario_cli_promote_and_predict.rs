use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

use vg_testkit::{constant_model, continent_model, dataset_csv, ConfusionFixture, GateWorkspace};

fn vg() -> Command {
    let mut cmd = Command::cargo_bin("vg").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn workspace() -> (GateWorkspace, String) {
    let ws = GateWorkspace::new().unwrap();
    // continent_model scores 0.75 on this set.
    ws.write_dataset(&dataset_csv(ConfusionFixture::new(3, 1, 1, 2)))
        .unwrap();
    let cfg = ws.write_config().unwrap().display().to_string();
    (ws, cfg)
}

#[test]
fn config_hash_prints_hash_and_canonical_json() {
    let (_ws, cfg) = workspace();
    vg().args(["config-hash", &cfg])
        .assert()
        .success()
        .stdout(predicate::str::contains("config_hash="))
        .stdout(predicate::str::contains("\"active_model_path\""));
}

#[test]
fn promote_cold_start_then_reject_weaker() {
    let (ws, cfg) = workspace();
    let first = ws.write_challenger("first", &continent_model()).unwrap();
    let second = ws.write_challenger("second", &constant_model(1)).unwrap();

    vg().args(["promote", "--config", &cfg, "--challenger"])
        .arg(&first)
        .args(["--f1", "0.81"])
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted=true"))
        .stdout(predicate::str::contains("incumbent_score=none"))
        .stdout(predicate::str::contains("score_delta=0.81"));
    assert!(ws.active.is_file());

    vg().args(["promote", "--config", &cfg, "--challenger"])
        .arg(&second)
        .args(["--f1", "0.70"])
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted=false"))
        .stdout(predicate::str::contains("incumbent_score=0.75"))
        .stdout(predicate::str::contains(format!(
            "promoted_model_path={}",
            ws.archive.display()
        )));

    vg().args(["audit", "verify", "--path"])
        .arg(&ws.history_log)
        .assert()
        .success()
        .stdout(predicate::str::contains("chain=valid lines=2"));
}

#[test]
fn promote_with_corrupt_incumbent_fails_and_keeps_slot() {
    let (ws, cfg) = workspace();
    ws.install_active_bytes(b"garbage").unwrap();
    let challenger = ws.write_challenger("c", &continent_model()).unwrap();

    vg().args(["promote", "--config", &cfg, "--challenger"])
        .arg(&challenger)
        .args(["--f1", "0.99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CORRUPT_ARTIFACT"));
    assert_eq!(ws.active_bytes(), Some(b"garbage".to_vec()));
}

#[test]
fn evaluate_prints_metrics() {
    let (ws, cfg) = workspace();
    let model = ws.write_challenger("m", &continent_model()).unwrap();

    vg().args(["evaluate", "--config", &cfg, "--model"])
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("f1=0.75"))
        .stdout(predicate::str::contains("\"true_positive\": 3"));
}

#[test]
fn predict_requires_model_and_complete_fields() {
    let (ws, cfg) = workspace();
    let fields = [
        "continent=Asia",
        "education_of_employee=Master's",
        "has_job_experience=Y",
        "requires_job_training=N",
        "no_of_employees=2412",
        "region_of_employment=West",
        "prevailing_wage=83425.65",
        "unit_of_wage=Year",
        "full_time_position=Y",
        "company_age=22",
    ];
    let field_args: Vec<String> = fields.iter().flat_map(|f| ["--field".to_string(), f.to_string()]).collect();

    vg().args(["predict", "--config", &cfg])
        .args(&field_args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("NO_MODEL_DEPLOYED"));

    ws.install_incumbent(&continent_model()).unwrap();

    vg().args(["predict", "--config", &cfg])
        .args(&field_args)
        .assert()
        .success()
        .stdout(predicate::str::contains("label=1"))
        .stdout(predicate::str::contains("outcome=Visa Not-Approved"));

    vg().args(["predict", "--config", &cfg])
        .args(&field_args[..field_args.len() - 2])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FEATURE_SCHEMA_MISMATCH"));
}
