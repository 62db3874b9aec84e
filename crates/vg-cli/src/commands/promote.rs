use std::path::Path;

use anyhow::{Context, Result};
use vg_artifacts::load_model;
use vg_config::{ConfigMode, GateSettings};
use vg_eval::{evaluate, EvaluationDataset};
use vg_promotion::{ChallengerModel, PromotionGate};

use super::{load_settings, model_err};

fn load_dataset(settings: &GateSettings) -> Result<EvaluationDataset> {
    let path = settings
        .test_dataset_path
        .as_deref()
        .context("CONFIG_MISSING: /evaluation/test_dataset_path is required")?;
    EvaluationDataset::load_csv(path, settings.current_year)
        .map_err(model_err)
        .with_context(|| format!("load held-out dataset failed: {}", path.display()))
}

pub fn run_promote(config_paths: &[String], challenger: &str, f1_score: f64) -> Result<()> {
    let (loaded, settings) = load_settings(config_paths, ConfigMode::Promote)?;
    let dataset = load_dataset(&settings)?;

    let gate = PromotionGate::from_settings(&settings);
    let challenger = ChallengerModel::new(challenger, f1_score);

    let record = gate
        .run_cycle(&challenger, &dataset, &loaded.config_hash)
        .map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;

    println!("cycle_id={}", record.cycle_id);
    println!("accepted={}", record.accepted);
    println!("challenger_score={}", record.challenger_score);
    println!(
        "incumbent_score={}",
        record
            .incumbent_score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    println!("score_delta={}", record.score_delta);
    println!("promoted_model_path={}", record.promoted_model_path.display());
    println!("config_hash={}", loaded.config_hash);
    Ok(())
}

pub fn run_evaluate(config_paths: &[String], model: &str) -> Result<()> {
    let (_loaded, settings) = load_settings(config_paths, ConfigMode::Promote)?;
    let dataset = load_dataset(&settings)?;

    let artifact = load_model(Path::new(model)).map_err(model_err)?;
    let metrics = evaluate(&artifact, &dataset).map_err(model_err)?;

    println!("model_id={}", artifact.model_id);
    println!("f1={}", metrics.f1);
    println!(
        "{}",
        serde_json::to_string_pretty(&metrics).context("serialize metrics failed")?
    );
    Ok(())
}
