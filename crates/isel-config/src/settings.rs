use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use isel_reconcile::StateFetchPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed view of the merged config. Every field has a default, so an empty
/// document is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub apic: ApicSettings,
    pub reconcile: ReconcileSettings,
    pub report: ReportSettings,
}

impl AppConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: AppConfig =
            serde_json::from_value(config_json.clone()).context("config does not match schema")?;
        cfg.state_fetch_policy()?;
        if cfg.apic.timeout_secs == 0 {
            bail!("apic.timeout_secs: must be at least 1, got 0");
        }
        Ok(cfg)
    }

    pub fn state_fetch_policy(&self) -> Result<StateFetchPolicy> {
        let raw = &self.reconcile.on_state_fetch_failure;
        StateFetchPolicy::parse(raw).ok_or_else(|| {
            anyhow!("reconcile.on_state_fetch_failure: expected 'halt' or 'degrade', got '{raw}'")
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApicSettings {
    /// Bare host or base URL. Empty means "ask the operator".
    pub host: String,
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub credentials_env: CredentialsEnv,
}

impl ApicSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApicSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            timeout_secs: 30,
            accept_invalid_certs: true,
            credentials_env: CredentialsEnv::default(),
        }
    }
}

/// Env var NAMES holding the APIC credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsEnv {
    pub username: String,
    pub password: String,
}

impl Default for CredentialsEnv {
    fn default() -> Self {
        Self {
            username: "ISEL_APIC_USERNAME".to_string(),
            password: "ISEL_APIC_PASSWORD".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileSettings {
    /// `halt` or `degrade`.
    pub on_state_fetch_failure: String,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            on_state_fetch_failure: StateFetchPolicy::Halt.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub dir: PathBuf,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}
