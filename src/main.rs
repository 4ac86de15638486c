use std::fs;
use std::process::ExitCode;

use adaptive_recommender::config::Config;
use adaptive_recommender::error::RecommendError;
use adaptive_recommender::logging::{init_tracing, LogConfig};
use adaptive_recommender::recommender::config::RecommenderConfig;
use adaptive_recommender::recommender::types::{
    CandidateQuestion, RecommendationRequest, UserProfile,
};
use adaptive_recommender::recommender::RecommendationEngine;
use adaptive_recommender::validation::validate_request;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationInput {
    request: RecommendationRequest,
    profile: UserProfile,
    #[serde(default)]
    candidates: Vec<CandidateQuestion>,
    /// 固定评估时刻，便于复现；缺省取当前时间
    #[serde(default)]
    now: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no input file: pass a path or set RECOMMENDER_INPUT_PATH")]
    MissingInput,
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed input: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request rejected: {0}")]
    Validation(&'static str),
    #[error(transparent)]
    Recommend(#[from] RecommendError),
}

fn read_file(path: &str) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })
}

fn load_recommender_config(config: &Config) -> Result<RecommenderConfig, CliError> {
    match &config.recommender.config_path {
        Some(path) => {
            let mut loaded = RecommenderConfig::from_json(&read_file(path)?)?;
            loaded.parallel_scoring_threshold = config.recommender.parallel_scoring_threshold;
            tracing::info!(path = %path, "Loaded recommender config file");
            Ok(loaded)
        }
        None => Ok(RecommenderConfig::from_env(&config.recommender)),
    }
}

fn run(config: &Config) -> Result<String, CliError> {
    let input_path = std::env::args()
        .nth(1)
        .or_else(|| config.input_path.clone())
        .ok_or(CliError::MissingInput)?;

    let input: RecommendationInput = serde_json::from_str(&read_file(&input_path)?)?;
    validate_request(&input.request).map_err(CliError::Validation)?;

    let engine = RecommendationEngine::new(load_recommender_config(config)?)?;
    let now = input.now.unwrap_or_else(Utc::now);
    let response = engine.generate_recommendations_at(
        &input.request,
        &input.profile,
        &input.candidates,
        now,
    )?;

    tracing::info!(
        user_id = %input.request.user_id,
        session_id = %response.session_metadata.session_id,
        recommended = response.recommendations.len(),
        "Recommendation session planned"
    );

    Ok(serde_json::to_string_pretty(&response)?)
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });
    tracing::debug!(?config, "Starting adaptive-recommender");

    match run(&config) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Recommendation failed");
            ExitCode::FAILURE
        }
    }
}
