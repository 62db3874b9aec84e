use anyhow::Result;
use vg_config::ConfigMode;
use vg_serving::{fields_from_assignments, Predictor};

use super::{load_settings, model_err};

pub fn run_predict(config_paths: &[String], fields: &[String]) -> Result<()> {
    let (_loaded, settings) = load_settings(config_paths, ConfigMode::Serve)?;

    let fields = fields_from_assignments(fields).map_err(model_err)?;
    let prediction = Predictor::from_path(&settings.active_model_path)
        .predict_fields(&fields)
        .map_err(model_err)?;

    println!("label={}", prediction.label);
    println!("outcome={}", prediction.outcome);
    println!("model_id={}", prediction.model_id);
    Ok(())
}
