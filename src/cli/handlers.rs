use crate::{
    app::App,
    detection::DetectionService,
    preprocess::{self, PreprocessOptions},
};
use anyhow::{Context, Result};
use serde_json::json;
use std::io::BufRead;
use std::sync::Arc;

use super::{InputArgs, ModelArgs};

pub fn handle_analyze(
    app: &App,
    threshold: Option<f32>,
    model_args: ModelArgs,
    input: InputArgs,
) -> Result<()> {
    let documents = read_documents(&input)?;
    let threshold = threshold.unwrap_or(app.config.default_threshold);
    let model = model_key(app, &model_args);

    let result = service_for(app, &model_args).analyze(&documents, &model, threshold)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn handle_detailed(
    app: &App,
    strict: Option<f32>,
    threshold: Option<f32>,
    model_args: ModelArgs,
    input: InputArgs,
) -> Result<()> {
    let documents = read_documents(&input)?;
    let strict = strict.unwrap_or(app.config.strict_threshold);
    let moderate = threshold.unwrap_or(app.config.default_threshold);
    let model = model_key(app, &model_args);

    let result =
        service_for(app, &model_args).detect_multi_level(&documents, &model, strict, moderate)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

pub fn handle_compare(app: &App, model_args: ModelArgs, text_a: &str, text_b: &str) -> Result<()> {
    let model = model_key(app, &model_args);
    let report = service_for(app, &model_args).compare_two_documents(text_a, text_b, &model)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn handle_models(app: &App) -> Result<()> {
    let models = app.provider().models();
    let output = json!({
        "default_model": app.config.default_model,
        "models": models,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn handle_preprocess(text: &str, options: PreprocessOptions, stats: bool) -> Result<()> {
    let processed = preprocess::preprocess_for_similarity(text, &options);

    if stats {
        let output = json!({
            "text": processed,
            "original_stats": preprocess::text_stats(text),
            "processed_stats": preprocess::text_stats(&processed),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{processed}");
    }
    Ok(())
}

fn model_key(app: &App, model_args: &ModelArgs) -> String {
    model_args
        .model
        .clone()
        .unwrap_or_else(|| app.config.default_model.clone())
}

/// The shared service, or a variant with preprocessing switched on when the
/// flag asks for it and config.yaml does not.
fn service_for(app: &App, model_args: &ModelArgs) -> Arc<DetectionService> {
    if !model_args.preprocess || app.service.options().preprocessing.is_some() {
        return app.service.clone();
    }

    let mut options = app.service.options().clone();
    options.preprocessing = Some(app.config.preprocessing.steps());
    Arc::new(DetectionService::new(app.provider().clone(), options))
}

/// One document per file, or one per non-empty stdin line.
fn read_documents(input: &InputArgs) -> Result<Vec<String>> {
    if input.files.is_empty() {
        let stdin = std::io::stdin();
        let mut documents = Vec::new();
        for line in stdin.lock().lines() {
            let line = line.context("Failed to read stdin")?;
            if !line.trim().is_empty() {
                documents.push(line);
            }
        }
        return Ok(documents);
    }

    input
        .files
        .iter()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect()
}
