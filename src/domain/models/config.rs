use serde::{Deserialize, Serialize};

/// Main configuration structure for Foreman
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Maximum fix attempts per task before it is marked failed
    #[serde(default = "default_max_fix_attempts")]
    pub max_fix_attempts: u32,

    /// Wall-clock budget for one DAG run, in seconds
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Workspace root the Reality Engine mutates
    #[serde(default = "default_workspace")]
    pub workspace: String,
}

const fn default_max_fix_attempts() -> u32 {
    3
}

const fn default_run_timeout_secs() -> u64 {
    600
}

fn default_workspace() -> String {
    ".".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_fix_attempts: default_max_fix_attempts(),
            run_timeout_secs: default_run_timeout_secs(),
            workspace: default_workspace(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.max_fix_attempts, 3);
        assert_eq!(config.engine.run_timeout_secs, 600);
        assert_eq!(config.engine.workspace, ".");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("engine:\n  max_fix_attempts: 5\n").unwrap();
        assert_eq!(config.engine.max_fix_attempts, 5);
        assert_eq!(config.engine.run_timeout_secs, 600);
    }
}
