//! Runtime credential resolution.
//!
//! Config YAML stores only env var NAMES. The binary calls
//! [`resolve_credentials`] once at startup; anything still missing is asked
//! for interactively. Error and log text names the variable, never the value.

use crate::AppConfig;

/// APIC credentials found in the environment. Either half may be absent.
/// **Values are redacted in `Debug` output.**
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ResolvedCredentials {
    pub fn is_complete(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

pub fn resolve_credentials(cfg: &AppConfig) -> ResolvedCredentials {
    resolve_credentials_with(cfg, |name| std::env::var(name).ok())
}

/// Same as [`resolve_credentials`] with an explicit variable lookup.
pub fn resolve_credentials_with<F>(cfg: &AppConfig, lookup: F) -> ResolvedCredentials
where
    F: Fn(&str) -> Option<String>,
{
    let names = &cfg.apic.credentials_env;
    let read = |name: &str| -> Option<String> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        lookup(name).filter(|v| !v.trim().is_empty())
    };

    let resolved = ResolvedCredentials {
        username: read(&names.username).map(|u| u.trim().to_string()),
        password: read(&names.password),
    };
    if resolved.username.is_none() {
        tracing::debug!(var = %names.username, "apic username not set in environment");
    }
    if resolved.password.is_none() {
        tracing::debug!(var = %names.password, "apic password not set in environment");
    }
    resolved
}
