use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // stdout 留给推荐结果 JSON，日志统一写 stderr
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    let registry = Registry::default().with(env_filter).with(stderr_layer);

    if config.enable_file_logs {
        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("adaptive-recommender")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&config.log_dir)
            .expect("Failed to create rolling file appender");
        let file_layer = fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .json();
        keep_existing_subscriber(registry.with(file_layer).try_init());
    } else {
        keep_existing_subscriber(registry.try_init());
    }
}

/// 进程内已装好 subscriber（测试或库宿主先初始化）时沿用它，其余初始化错误直接中止
fn keep_existing_subscriber(result: Result<(), TryInitError>) {
    if let Err(e) = result {
        if !e.to_string().contains("already been set") {
            panic!("Failed to initialize tracing: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let cfg = LogConfig::default();
        init_tracing(&cfg);
        init_tracing(&cfg);
    }

    #[test]
    fn file_logging_after_init_does_not_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = LogConfig {
            log_level: "debug".to_string(),
            enable_file_logs: true,
            log_dir: dir.path().to_string_lossy().into_owned(),
        };
        init_tracing(&LogConfig::default());
        init_tracing(&cfg);
    }
}
