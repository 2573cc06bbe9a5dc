//! Engine configuration.

use crate::error::{CallshimError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// What the hook does when no stub rule matches a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Let the real implementation run.
    #[default]
    CallOriginal,
    /// Skip the real implementation and return the zero value.
    ReturnDefault,
}

impl FromStr for UnmatchedPolicy {
    type Err = CallshimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "original" | "call_original" => Ok(Self::CallOriginal),
            "default" | "return_default" => Ok(Self::ReturnDefault),
            other => Err(CallshimError::InvalidConfig {
                field: "unmatched".to_string(),
                cause: format!("unknown policy '{other}', expected 'original' or 'default'"),
            }),
        }
    }
}

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Behavior for calls no rule answers.
    pub unmatched: UnmatchedPolicy,
    /// Whether intercepted calls are appended to the ledger.
    pub recording: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            unmatched: UnmatchedPolicy::default(),
            recording: true,
        }
    }
}

impl EngineConfig {
    /// Create a new builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CALLSHIM_UNMATCHED`: "original" or "default"
    /// - `CALLSHIM_RECORDING`: "true"/"1" or "false"/"0"
    pub fn from_env() -> Result<Self> {
        let unmatched = env::var("CALLSHIM_UNMATCHED").ok();
        let recording = env::var("CALLSHIM_RECORDING").ok();
        Self::from_values(unmatched.as_deref(), recording.as_deref())
    }

    /// Build a configuration from raw setting strings, rejecting unknown
    /// values with `InvalidConfig`. Absent settings keep their defaults.
    pub fn from_values(unmatched: Option<&str>, recording: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(policy) = unmatched {
            config.unmatched = policy.parse()?;
        }

        if let Some(recording) = recording {
            config.recording = parse_flag("CALLSHIM_RECORDING", recording)?;
        }

        Ok(config)
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(CallshimError::InvalidConfig {
            field: field.to_string(),
            cause: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the unmatched-call policy.
    pub fn unmatched(mut self, policy: UnmatchedPolicy) -> Self {
        self.config.unmatched = policy;
        self
    }

    /// Enable or disable recording.
    pub fn recording(mut self, enabled: bool) -> Self {
        self.config.recording = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
