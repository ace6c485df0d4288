//! RuntimeConfig - 環境変数からの設定読み込み
//!
//! `config` クレートの `Environment` ソースで読む。キーは小文字化されるので
//! `INPUT_KEY` は `input_key` フィールドに対応する。
//! テストではプロセス環境の代わりに map を渡せる（`from_pairs`）。

use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use super::retry::RetryPolicy;
use crate::domain::ConfigError;
use crate::impls::{LaunchMode, ProcessLauncher};

fn default_input_key() -> String {
    "metrics".to_string()
}

fn default_output_key() -> String {
    "metrics-output".to_string()
}

fn default_poll_period_seconds() -> u64 {
    5
}

fn default_entry_point() -> String {
    "handler".to_string()
}

fn default_archive_path() -> String {
    "/mnt/shared/function.zip".to_string()
}

fn default_entry_file() -> String {
    "main.py".to_string()
}

fn default_handler_interpreter() -> String {
    "python3".to_string()
}

fn default_handler_mode() -> String {
    LaunchMode::default().to_string()
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_store_retry_attempts() -> u32 {
    5
}

fn default_store_retry_base_ms() -> u64 {
    200
}

/// Every recognised option, with its default.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_input_key")]
    pub input_key: String,

    #[serde(default = "default_output_key")]
    pub output_key: String,

    #[serde(default = "default_poll_period_seconds")]
    pub poll_period_seconds: u64,

    #[serde(default = "default_entry_point")]
    pub entry_point: String,

    /// If this path exists the handler comes from the archive.
    #[serde(default = "default_archive_path")]
    pub archive_path: String,

    /// Program text used when no archive is present.
    #[serde(default)]
    pub inline_code: String,

    /// Entry file inside the archive.
    #[serde(default = "default_entry_file")]
    pub entry_file: String,

    /// Program that runs the handler unit.
    #[serde(default = "default_handler_interpreter")]
    pub handler_interpreter: String,

    /// `bootstrap` or `direct`, see `LaunchMode`.
    #[serde(default = "default_handler_mode")]
    pub handler_mode: String,

    #[serde(default = "default_redis_host")]
    pub redis_host: String,

    #[serde(default = "default_redis_port")]
    pub redis_port: u16,

    #[serde(default = "default_store_retry_attempts")]
    pub store_retry_attempts: u32,

    #[serde(default = "default_store_retry_base_ms")]
    pub store_retry_base_ms: u64,
}

impl RuntimeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default())
    }

    /// Load from explicit `NAME=value` pairs instead of the process environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: config::Map<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_source(Environment::default().source(Some(map)))
    }

    fn from_source(env: Environment) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_period_seconds == 0 {
            return Err(ConfigError::Invalid {
                key: "POLL_PERIOD_SECONDS",
                reason: "must be a positive integer".into(),
            });
        }
        if self.input_key.is_empty() {
            return Err(ConfigError::Invalid {
                key: "INPUT_KEY",
                reason: "must not be empty".into(),
            });
        }
        if self.output_key.is_empty() {
            return Err(ConfigError::Invalid {
                key: "OUTPUT_KEY",
                reason: "must not be empty".into(),
            });
        }
        if self.entry_point.is_empty() {
            return Err(ConfigError::Invalid {
                key: "ENTRY_POINT",
                reason: "must not be empty".into(),
            });
        }
        self.launch_mode()?;
        if self.store_retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "STORE_RETRY_ATTEMPTS",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn launch_mode(&self) -> Result<LaunchMode, ConfigError> {
        self.handler_mode
            .parse()
            .map_err(|reason| ConfigError::Invalid {
                key: "HANDLER_MODE",
                reason,
            })
    }

    /// Launcher for the configured interpreter and mode.
    pub fn launcher(&self) -> Result<ProcessLauncher, ConfigError> {
        Ok(ProcessLauncher::new(self.handler_interpreter.clone()).with_mode(self.launch_mode()?))
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_period_seconds)
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/0", self.redis_host, self.redis_port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_millis(self.store_retry_base_ms),
            multiplier: 2.0,
            max_attempts: self.store_retry_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn load(pairs: &[(&str, &str)]) -> Result<RuntimeConfig, ConfigError> {
        RuntimeConfig::from_pairs(pairs.iter().map(|(k, v)| (*k, *v)))
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.input_key, "metrics");
        assert_eq!(cfg.output_key, "metrics-output");
        assert_eq!(cfg.poll_period(), Duration::from_secs(5));
        assert_eq!(cfg.entry_point, "handler");
        assert_eq!(cfg.archive_path, "/mnt/shared/function.zip");
        assert_eq!(cfg.inline_code, "");
        assert_eq!(cfg.entry_file, "main.py");
        assert_eq!(cfg.launch_mode().unwrap(), LaunchMode::Bootstrap);
        assert_eq!(cfg.launcher().unwrap().interpreter(), "python3");
        assert_eq!(cfg.redis_url(), "redis://localhost:6379/0");
        assert_eq!(cfg.retry_policy().max_attempts, 5);
    }

    #[test]
    fn upper_case_variables_override_defaults() {
        let cfg = load(&[
            ("INPUT_KEY", "cpu"),
            ("OUTPUT_KEY", "cpu-out"),
            ("POLL_PERIOD_SECONDS", "2"),
            ("ENTRY_POINT", "run"),
            ("INLINE_CODE", "def run(e, c): return e"),
            ("REDIS_HOST", "redis.internal"),
            ("REDIS_PORT", "6380"),
            ("HANDLER_INTERPRETER", "sh"),
            ("HANDLER_MODE", "direct"),
        ])
        .unwrap();

        assert_eq!(cfg.input_key, "cpu");
        assert_eq!(cfg.output_key, "cpu-out");
        assert_eq!(cfg.poll_period(), Duration::from_secs(2));
        assert_eq!(cfg.entry_point, "run");
        assert_eq!(cfg.inline_code, "def run(e, c): return e");
        assert_eq!(cfg.redis_url(), "redis://redis.internal:6380/0");
        let launcher = cfg.launcher().unwrap();
        assert_eq!(launcher.interpreter(), "sh");
        assert_eq!(launcher.mode(), LaunchMode::Direct);
    }

    #[rstest]
    #[case::zero_period(&[("POLL_PERIOD_SECONDS", "0")], "POLL_PERIOD_SECONDS")]
    #[case::empty_entry_point(&[("ENTRY_POINT", "")], "ENTRY_POINT")]
    #[case::no_retries(&[("STORE_RETRY_ATTEMPTS", "0")], "STORE_RETRY_ATTEMPTS")]
    #[case::unknown_mode(&[("HANDLER_MODE", "wasm")], "HANDLER_MODE")]
    fn invalid_values_are_rejected(#[case] pairs: &[(&str, &str)], #[case] key: &str) {
        let err = load(pairs).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: k, .. } if k == key), "{err}");
    }

    #[test]
    fn non_numeric_period_is_a_source_error() {
        let err = load(&[("POLL_PERIOD_SECONDS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Source(_)), "{err}");
    }
}
