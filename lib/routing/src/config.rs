//! Routing configuration.

use crate::capabilities::Capabilities;
use crate::classifier::ClassifierRouter;
use crate::heuristic::HeuristicFirstRouter;
use crate::router::Router;
use realty_assist_ai::{ImageFetcher, LlmBackend};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How routing decisions are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    /// Image shortcut, then model-driven function calling over the history.
    #[default]
    HeuristicFirst,
    /// Stateless single-shot classification returning a JSON decision.
    Classifier,
}

impl fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeuristicFirst => f.write_str("heuristic_first"),
            Self::Classifier => f.write_str("classifier"),
        }
    }
}

impl FromStr for RoutingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "heuristic_first" | "heuristic" => Ok(Self::HeuristicFirst),
            "classifier" => Ok(Self::Classifier),
            other => Err(format!("unknown routing strategy '{other}'")),
        }
    }
}

/// Routing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub strategy: RoutingStrategy,

    /// Temperature for the function-calling router call.
    #[serde(default = "default_router_temperature")]
    pub router_temperature: f32,

    #[serde(default = "default_issue_temperature")]
    pub issue_temperature: f32,

    #[serde(default = "default_tenancy_temperature")]
    pub tenancy_temperature: f32,

    /// Temperature for the classification call.
    #[serde(default = "default_classifier_temperature")]
    pub classifier_temperature: f32,
}

fn default_router_temperature() -> f32 {
    0.55
}

fn default_issue_temperature() -> f32 {
    crate::issue::DEFAULT_TEMPERATURE
}

fn default_tenancy_temperature() -> f32 {
    crate::tenancy::DEFAULT_TEMPERATURE
}

fn default_classifier_temperature() -> f32 {
    0.3
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            strategy: RoutingStrategy::default(),
            router_temperature: default_router_temperature(),
            issue_temperature: default_issue_temperature(),
            tenancy_temperature: default_tenancy_temperature(),
            classifier_temperature: default_classifier_temperature(),
        }
    }
}

impl RoutingConfig {
    /// Builds the configured router over one backend.
    #[must_use]
    pub fn build_router(
        &self,
        backend: Arc<dyn LlmBackend>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Arc<dyn Router> {
        let capabilities = Capabilities::from_config(backend.clone(), fetcher, self);
        match self.strategy {
            RoutingStrategy::HeuristicFirst => Arc::new(
                HeuristicFirstRouter::new(backend, capabilities)
                    .with_temperature(self.router_temperature),
            ),
            RoutingStrategy::Classifier => Arc::new(
                ClassifierRouter::new(backend, capabilities)
                    .with_temperature(self.classifier_temperature),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFetcher, ScriptedBackend};

    #[test]
    fn defaults() {
        let config = RoutingConfig::default();
        assert_eq!(config.strategy, RoutingStrategy::HeuristicFirst);
        assert!((config.router_temperature - 0.55).abs() < f32::EPSILON);
        assert!((config.issue_temperature - 0.3).abs() < f32::EPSILON);
        assert!((config.tenancy_temperature - 0.5).abs() < f32::EPSILON);
        assert!((config.classifier_temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!(
            "classifier".parse::<RoutingStrategy>(),
            Ok(RoutingStrategy::Classifier)
        );
        assert_eq!(
            "Heuristic-First".parse::<RoutingStrategy>(),
            Ok(RoutingStrategy::HeuristicFirst)
        );
        assert!("round_robin".parse::<RoutingStrategy>().is_err());
    }

    #[test]
    fn builds_selected_strategy() {
        let backend = Arc::new(ScriptedBackend::replying([]));
        let fetcher = Arc::new(FakeFetcher::png());
        let config = RoutingConfig {
            strategy: RoutingStrategy::Classifier,
            ..RoutingConfig::default()
        };

        let router = config.build_router(backend, fetcher);
        assert_eq!(router.strategy(), RoutingStrategy::Classifier);
    }
}
