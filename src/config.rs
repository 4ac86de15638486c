use std::env;
use std::str::FromStr;

use crate::constants::DEFAULT_PARALLEL_SCORING_THRESHOLD;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub input_path: Option<String>,
    pub recommender: RecommenderEnvConfig,
}

#[derive(Debug, Clone)]
pub struct RecommenderEnvConfig {
    pub parallel_scoring_threshold: usize,
    /// 可选的调参 JSON 文件，覆盖内置默认值
    pub config_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            input_path: env_opt("RECOMMENDER_INPUT_PATH"),
            recommender: RecommenderEnvConfig {
                parallel_scoring_threshold: env_or_parse(
                    "RECOMMENDER_PARALLEL_THRESHOLD",
                    DEFAULT_PARALLEL_SCORING_THRESHOLD,
                ),
                config_path: env_opt("RECOMMENDER_CONFIG_PATH"),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
