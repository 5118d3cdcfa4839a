//! Centralized server configuration.
//!
//! Loaded via the `config` crate from an optional file named by
//! `REALTY_ASSIST_CONFIG`, overridden by environment variables with `__` as
//! the nesting separator (`GEMINI__API_KEY`, `ROUTING__STRATEGY`, `PORT`).

use realty_assist_ai::GeminiConfig;
use realty_assist_routing::RoutingConfig;
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an optional configuration file.
pub const CONFIG_FILE_ENV: &str = "REALTY_ASSIST_CONFIG";

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Model backend configuration.
    pub gemini: GeminiConfig,

    /// Routing strategy and temperatures.
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout for downloading images referenced by URL.
    #[serde(default = "default_image_fetch_timeout_secs")]
    pub image_fetch_timeout_secs: u64,

    /// Largest accepted request body, uploads included.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_image_fetch_timeout_secs() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

impl ServerConfig {
    /// Loads configuration from the environment, layered over the file
    /// named by `REALTY_ASSIST_CONFIG` if set.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::load(file.as_deref().map(Path::new), true)
    }

    /// Loads configuration from a file only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparsable or incomplete.
    pub fn from_file(path: &Path) -> Result<Self, config::ConfigError> {
        Self::load(Some(path), false)
    }

    fn load(file: Option<&Path>, with_env: bool) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        if with_env {
            builder = builder.add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            );
        }
        builder.build()?.try_deserialize()
    }

    /// Address to bind, as `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realty_assist_routing::RoutingStrategy;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let file = write_config(
            r#"
            [gemini]
            api_key = "test-key"
            "#,
        );

        let config = ServerConfig::from_file(file.path()).expect("load");

        assert_eq!(config.gemini.api_key, "test-key");
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.routing.strategy, RoutingStrategy::HeuristicFirst);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn file_overrides() {
        let file = write_config(
            r#"
            host = "127.0.0.1"
            port = 9000

            [gemini]
            api_key = "k"
            model = "gemini-1.5-pro"
            request_timeout_secs = 20

            [routing]
            strategy = "classifier"
            classifier_temperature = 0.1
            "#,
        );

        let config = ServerConfig::from_file(file.path()).expect("load");

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.gemini.request_timeout_secs, Some(20));
        assert_eq!(config.routing.strategy, RoutingStrategy::Classifier);
        assert!((config.routing.classifier_temperature - 0.1).abs() < f32::EPSILON);
        assert!((config.routing.router_temperature - 0.55).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let file = write_config("port = 8081\n");
        assert!(ServerConfig::from_file(file.path()).is_err());
    }
}
