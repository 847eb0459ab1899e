use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

const DEFAULT_JSON_LOG_FILE: &str = "agentic.logs.jsonl";

/// Where console logs go when no JSON log file is configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    /// Keeps stdout free for program output.
    Stderr,
}

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn observability_enabled() -> bool {
    for key in ["AGENTIC_OBSERVABILITY_ENABLED", "AGENTIC_OBSERVABILITY"] {
        if let Ok(value) = std::env::var(key) {
            return parse_bool_env(&value).unwrap_or(true);
        }
    }
    true
}

fn resolve_env_filter() -> tracing_subscriber::EnvFilter {
    if let Ok(level) = std::env::var("AGENTIC_LOG_LEVEL")
        && let Ok(filter) = tracing_subscriber::EnvFilter::try_new(level)
    {
        return filter;
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Splits the JSONL log path into the directory to create and the file name.
fn json_log_location(path: &Path) -> (PathBuf, String) {
    if path.as_os_str().is_empty() || path.to_string_lossy().ends_with(['/', '\\']) {
        return (dir_or_cwd(path), DEFAULT_JSON_LOG_FILE.to_string());
    }
    let dir = dir_or_cwd(path.parent().unwrap_or(Path::new("")));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_JSON_LOG_FILE)
        .to_string();
    (dir, file_name)
}

fn dir_or_cwd(dir: &Path) -> PathBuf {
    if dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        dir.to_path_buf()
    }
}

/// Initialize observability logging once per process, compact logs on stdout.
pub fn init_observability() {
    init_observability_with(ConsoleTarget::Stdout);
}

/// Initialize observability logging once per process.
///
/// Environment variables:
/// - `AGENTIC_OBSERVABILITY_ENABLED` / `AGENTIC_OBSERVABILITY`: optional enable/disable flag (default enabled).
/// - `AGENTIC_LOG_LEVEL`: optional level/filter override (`info`, `debug`, etc.).
/// - `AGENTIC_JSON_LOG_PATH`: optional log file path. If set, logs are JSONL in that file
///   (a path ending in a separator gets `agentic.logs.jsonl`). If unset, compact human-readable logs
///   go to stdout or stderr as chosen by `console`.
/// - `RUST_LOG`: optional filter override.
pub fn init_observability_with(console: ConsoleTarget) {
    INIT.get_or_init(|| {
        if !observability_enabled() {
            return;
        }

        let env_filter = resolve_env_filter();
        if let Ok(path_raw) = std::env::var("AGENTIC_JSON_LOG_PATH") {
            let (dir, file_name) = json_log_location(Path::new(&path_raw));
            let _ = std::fs::create_dir_all(&dir);
            let writer = tracing_appender::rolling::never(dir, file_name);
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(false)
                .with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init();
            return;
        }

        let layer = tracing_subscriber::fmt::layer().compact().with_target(false);
        let _ = match console {
            ConsoleTarget::Stdout => tracing_subscriber::registry()
                .with(env_filter)
                .with(layer.with_writer(std::io::stdout))
                .try_init(),
            ConsoleTarget::Stderr => tracing_subscriber::registry()
                .with(env_filter)
                .with(layer.with_writer(std::io::stderr))
                .try_init(),
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_env_values() {
        assert_eq!(parse_bool_env(" Yes "), Some(true));
        assert_eq!(parse_bool_env("off"), Some(false));
        assert_eq!(parse_bool_env("maybe"), None);
    }

    #[test]
    fn json_log_path_splits_into_dir_and_file() {
        assert_eq!(
            json_log_location(Path::new("logs/run.jsonl")),
            (PathBuf::from("logs"), "run.jsonl".to_string())
        );
        assert_eq!(
            json_log_location(Path::new("run.jsonl")),
            (PathBuf::from("."), "run.jsonl".to_string())
        );
        assert_eq!(
            json_log_location(Path::new("logs/")),
            (PathBuf::from("logs/"), DEFAULT_JSON_LOG_FILE.to_string())
        );
    }
}
