//! Console configuration, read the same way as the server's.

use crate::error::CliError;
use realty_assist_ai::GeminiConfig;
use realty_assist_routing::RoutingConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default = "default_image_fetch_timeout_secs")]
    pub image_fetch_timeout_secs: u64,
}

fn default_image_fetch_timeout_secs() -> u64 {
    30
}

impl CliConfig {
    /// Reads `GEMINI__API_KEY` and friends from the environment, over an
    /// optional file.
    pub fn load(file: Option<&Path>) -> realty_assist_core::Result<Self, CliError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config: Self = builder
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(CliError::from)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realty_assist_routing::RoutingStrategy;
    use std::io::Write;

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            "[gemini]\napi_key = \"cli-key\"\n\n[routing]\nstrategy = \"classifier\""
        )
        .expect("write");

        let config = CliConfig::load(Some(file.path())).expect("load");

        assert_eq!(config.gemini.api_key, "cli-key");
        assert_eq!(config.routing.strategy, RoutingStrategy::Classifier);
        assert_eq!(config.image_fetch_timeout_secs, 30);
    }
}
