use std::path::PathBuf;

use vg_config::{
    consumed_pointers_for_mode, load_layered_yaml_from_strings, report_unused_keys, ConfigMode,
    GateSettings, UnusedKeyPolicy, DEFAULT_DAEMON_ADDR,
};

const FULL_YAML: &str = r#"
storage:
  active_model_path: "serving/model.json"
  archive_model_path: "evaluation/model.json"
  cycles_root: "cycles"
  history_log: "promotion_history.jsonl"
evaluation:
  test_dataset_path: "data/test.csv"
  current_year: 2024
daemon:
  addr: "0.0.0.0:9000"
"#;

#[test]
fn promote_mode_reads_every_section() {
    let loaded = load_layered_yaml_from_strings(&[FULL_YAML]).unwrap();
    let s = GateSettings::from_config_json(ConfigMode::Promote, &loaded.config_json).unwrap();

    assert_eq!(s.active_model_path, PathBuf::from("serving/model.json"));
    assert_eq!(s.archive_model_path, PathBuf::from("evaluation/model.json"));
    assert_eq!(s.test_dataset_path, Some(PathBuf::from("data/test.csv")));
    assert_eq!(s.current_year, 2024);
    assert_eq!(s.daemon_addr.port(), 9000);

    let report =
        report_unused_keys(ConfigMode::Promote, &loaded.config_json, UnusedKeyPolicy::Fail)
            .expect("every key is consumed in PROMOTE mode");
    assert!(report.is_clean());
}

#[test]
fn promote_mode_requires_dataset() {
    let yaml = r#"
storage:
  active_model_path: "serving/model.json"
  archive_model_path: "evaluation/model.json"
  cycles_root: "cycles"
  history_log: "promotion_history.jsonl"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();

    let err = GateSettings::from_config_json(ConfigMode::Promote, &loaded.config_json).unwrap_err();
    assert!(err.to_string().contains("/evaluation/test_dataset_path"), "{err}");

    let serve = GateSettings::from_config_json(ConfigMode::Serve, &loaded.config_json).unwrap();
    assert_eq!(serve.test_dataset_path, None);
    assert_eq!(serve.daemon_addr.to_string(), DEFAULT_DAEMON_ADDR);
}

#[test]
fn same_path_for_both_slots_is_rejected() {
    let yaml = r#"
storage:
  active_model_path: "model.json"
  archive_model_path: "model.json"
  cycles_root: "cycles"
  history_log: "promotion_history.jsonl"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    assert!(GateSettings::from_config_json(ConfigMode::Serve, &loaded.config_json).is_err());
}

#[test]
fn serve_mode_warns_on_evaluation_section() {
    let loaded = load_layered_yaml_from_strings(&[FULL_YAML]).unwrap();

    let report =
        report_unused_keys(ConfigMode::Serve, &loaded.config_json, UnusedKeyPolicy::Warn)
            .expect("warn mode must not error");
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/evaluation/current_year".to_string(),
            "/evaluation/test_dataset_path".to_string(),
        ]
    );

    assert!(
        report_unused_keys(ConfigMode::Serve, &loaded.config_json, UnusedKeyPolicy::Fail).is_err()
    );
}

#[test]
fn prefix_boundary_is_respected() {
    let yaml = r#"
storage:
  active_model_path: "a.json"
  active_model_path_backup: "b.json"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Serve, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/storage/active_model_path_backup".to_string()]
    );
}

#[test]
fn serve_mode_ignores_malformed_evaluation_values() {
    let yaml = r#"
storage:
  active_model_path: "serving/model.json"
  archive_model_path: "evaluation/model.json"
  cycles_root: "cycles"
  history_log: "promotion_history.jsonl"
evaluation:
  current_year: "not a year"
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();

    // Serve never reads the key, so it cannot fail on it; the lint flags it instead.
    assert!(GateSettings::from_config_json(ConfigMode::Serve, &loaded.config_json).is_ok());
    let report =
        report_unused_keys(ConfigMode::Serve, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(report.unused_leaf_pointers, vec!["/evaluation/current_year".to_string()]);

    let err = GateSettings::from_config_json(ConfigMode::Promote, &loaded.config_json).unwrap_err();
    assert!(err.to_string().contains("CONFIG"), "{err}");
}

#[test]
fn unknown_sections_are_reported_whole_or_per_key() {
    let yaml = r#"
storage:
  active_model_path: "a.json"
training:
  epochs: 10
  seed: 7
verbose: true
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report =
        report_unused_keys(ConfigMode::Promote, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec![
            "/training/epochs".to_string(),
            "/training/seed".to_string(),
            "/verbose".to_string(),
        ]
    );
}

#[test]
fn every_consumed_pointer_is_a_section_key() {
    for mode in [ConfigMode::Promote, ConfigMode::Serve] {
        for p in consumed_pointers_for_mode(mode) {
            assert_eq!(p.matches('/').count(), 2, "{p}");
        }
    }
}
