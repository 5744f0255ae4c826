//! Engine configuration.
//!
//! All tunable knobs live here: rollout percentage, fan-out width, and the
//! per-service routing policies (timeouts, retry budgets, backoff delays).
//! Loading and persisting the configuration file is the infrastructure
//! layer's job; this module only defines the shape and the defaults.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DeckflowError, Result};

/// Retry and pacing policy for one downstream content service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePolicy {
    /// Wall-clock limit for a single call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Total attempt budget when the backend keeps rate limiting.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Total attempt budget for timeouts and connection failures.
    /// Smaller than the rate-limit budget.
    #[serde(default = "default_transient_retries")]
    pub transient_retries: u32,
    /// First backoff delay, in milliseconds. Doubles on each retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Ceiling for any backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Minimum spacing between consecutive calls to the same backend,
    /// in milliseconds.
    #[serde(default = "default_inter_call_delay_ms")]
    pub inter_call_delay_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    4
}

fn default_transient_retries() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8_000
}

fn default_inter_call_delay_ms() -> u64 {
    200
}

impl Default for ServicePolicy {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            transient_retries: default_transient_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            inter_call_delay_ms: default_inter_call_delay_ms(),
        }
    }
}

impl ServicePolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_millis(self.inter_call_delay_ms)
    }

    /// The backoff delay to sleep after the given attempt (1-based).
    ///
    /// Doubles per attempt starting from `base_delay_ms` and never exceeds
    /// `max_delay_ms`, so the observed sequence is non-decreasing.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay_ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// The attempt budget that applies to the given failure, or `None` when
    /// the failure class is never retried.
    pub fn attempt_budget(&self, error: &DeckflowError) -> Option<u32> {
        match error {
            DeckflowError::RateLimited { .. } => Some(self.max_retries),
            DeckflowError::TransientNetwork { .. } => Some(self.transient_retries),
            _ => None,
        }
    }
}

/// Routing policies for the whole service fleet.
///
/// `default` applies to any service without an entry in `services`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub default: ServicePolicy,
    #[serde(default)]
    pub services: BTreeMap<String, ServicePolicy>,
}

impl RouterConfig {
    pub fn policy_for(&self, service_name: &str) -> &ServicePolicy {
        self.services.get(service_name).unwrap_or(&self.default)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Percentage of sessions (0-100) routed to the candidate generation
    /// pipeline. 0 disables the candidate entirely.
    #[serde(default)]
    pub rollout_percentage: u8,
    /// Upper bound on concurrent per-item generation tasks in one batch.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Base URLs for downstream services, keyed by service name.
    #[serde(default)]
    pub service_base_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub router: RouterConfig,
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rollout_percentage: 0,
            max_concurrency: default_max_concurrency(),
            service_base_urls: BTreeMap::new(),
            router: RouterConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validates cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.rollout_percentage > 100 {
            return Err(DeckflowError::configuration(format!(
                "rollout_percentage must be 0-100, got {}",
                self.rollout_percentage
            )));
        }
        if self.max_concurrency == 0 {
            return Err(DeckflowError::configuration(
                "max_concurrency must be at least 1",
            ));
        }
        for (name, policy) in &self.router.services {
            if policy.max_retries == 0 || policy.transient_retries == 0 {
                return Err(DeckflowError::configuration(format!(
                    "service '{}' must allow at least one attempt",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = ServicePolicy {
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            ..ServicePolicy::default()
        };
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(1_000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(2_000));
        assert_eq!(policy.backoff_delay(5), Duration::from_millis(8_000));
        assert_eq!(policy.backoff_delay(12), Duration::from_millis(8_000));
    }

    #[test]
    fn backoff_sequence_is_non_decreasing() {
        let policy = ServicePolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 1..=10 {
            let delay = policy.backoff_delay(attempt);
            assert!(delay >= previous, "delay shrank at attempt {attempt}");
            previous = delay;
        }
    }

    #[test]
    fn attempt_budget_follows_failure_class() {
        let policy = ServicePolicy::default();
        let rate_limited = DeckflowError::rate_limited("chart", "slow down", None);
        let transient = DeckflowError::transient_network("chart", "timed out");
        let permanent = DeckflowError::permanent_service("chart", Some(400), "bad request");

        assert_eq!(policy.attempt_budget(&rate_limited), Some(policy.max_retries));
        assert_eq!(
            policy.attempt_budget(&transient),
            Some(policy.transient_retries)
        );
        assert_eq!(policy.attempt_budget(&permanent), None);
    }

    #[test]
    fn policy_lookup_falls_back_to_default() {
        let mut config = RouterConfig::default();
        config.services.insert(
            "chart".to_string(),
            ServicePolicy {
                timeout_ms: 5_000,
                ..ServicePolicy::default()
            },
        );

        assert_eq!(config.policy_for("chart").timeout_ms, 5_000);
        assert_eq!(
            config.policy_for("layout").timeout_ms,
            ServicePolicy::default().timeout_ms
        );
    }

    #[test]
    fn validate_rejects_out_of_range_rollout() {
        let config = EngineConfig {
            rollout_percentage: 101,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            rollout_percentage: 100,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrips_through_toml() {
        let mut config = EngineConfig::default();
        config.rollout_percentage = 25;
        config
            .service_base_urls
            .insert("layout".to_string(), "http://localhost:8101".to_string());
        config.router.services.insert(
            "layout".to_string(),
            ServicePolicy {
                max_retries: 6,
                ..ServicePolicy::default()
            },
        );

        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
