//! Snapshot gate.
//!
//! Decides what a failed state fetch means for the run. Under
//! [`StateFetchPolicy::Halt`] the run stops before any row is processed.
//! Under [`StateFetchPolicy::DegradeToEmpty`] the run continues against an
//! empty index, so every desired row is treated as absent and will attempt
//! to apply (duplicate-apply risk; the snapshot is flagged as degraded).
//!
//! No IO.

use std::fmt;

use tracing::{info, warn};

use crate::ExistingStateIndex;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StateFetchPolicy {
    #[default]
    Halt,
    DegradeToEmpty,
}

impl StateFetchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateFetchPolicy::Halt => "halt",
            StateFetchPolicy::DegradeToEmpty => "degrade",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "halt" => Some(StateFetchPolicy::Halt),
            "degrade" | "degrade_to_empty" | "empty" => Some(StateFetchPolicy::DegradeToEmpty),
            _ => None,
        }
    }
}

/// The index a run will reconcile against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub index: ExistingStateIndex,
    /// Set when the fetch failed and the policy allowed an empty index;
    /// carries the fetch error text.
    pub degraded: Option<String>,
}

impl Snapshot {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// State fetch failed and the policy refused to continue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateFetchRefused {
    pub detail: String,
}

impl fmt::Display for StateFetchRefused {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot read existing selectors, refusing to apply blind: {}",
            self.detail
        )
    }
}

impl std::error::Error for StateFetchRefused {}

pub fn resolve_snapshot<E: fmt::Display>(
    fetched: Result<ExistingStateIndex, E>,
    policy: StateFetchPolicy,
) -> Result<Snapshot, StateFetchRefused> {
    match fetched {
        Ok(index) => {
            info!(
                selectors = index.selector_count(),
                profiles = index.profile_count(),
                "existing state snapshot taken"
            );
            Ok(Snapshot {
                index,
                degraded: None,
            })
        }
        Err(e) => match policy {
            StateFetchPolicy::Halt => Err(StateFetchRefused {
                detail: e.to_string(),
            }),
            StateFetchPolicy::DegradeToEmpty => {
                warn!(
                    error = %e,
                    "state fetch failed; continuing with an empty index, every row will attempt to apply"
                );
                Ok(Snapshot {
                    index: ExistingStateIndex::empty(),
                    degraded: Some(e.to_string()),
                })
            }
        },
    }
}
