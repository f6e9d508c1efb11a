#![allow(dead_code)]

use std::cell::RefCell;

use isel_reconcile::*;

/// Encoder that never fails; the payload names the binding.
pub struct EchoEncoder;

impl SelectorEncoder for EchoEncoder {
    fn encode(&self, r: &DesiredRecord) -> Result<String, EncodeError> {
        Ok(format!(
            "{}|{}|{}|{}|{}",
            r.profile, r.selector_name, r.from_port, r.to_port, r.description
        ))
    }
}

/// Applier that records every call and fails for the configured profiles.
#[derive(Default)]
pub struct FakeController {
    pub fail_profiles: Vec<String>,
    pub calls: RefCell<Vec<ApplyCall>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyCall {
    pub profile: String,
    pub payload: String,
    pub dry_run: bool,
}

impl FakeController {
    pub fn failing(profiles: &[&str]) -> Self {
        Self {
            fail_profiles: profiles.iter().map(|p| p.to_string()).collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Calls that would have touched the controller.
    pub fn live_calls(&self) -> usize {
        self.calls.borrow().iter().filter(|c| !c.dry_run).count()
    }
}

impl SelectorApplier for FakeController {
    fn apply(&self, profile: &str, payload: &str, dry_run: bool) -> Result<(), ApplyError> {
        self.calls.borrow_mut().push(ApplyCall {
            profile: profile.to_string(),
            payload: payload.to_string(),
            dry_run,
        });
        if dry_run {
            return Ok(());
        }
        if self.fail_profiles.iter().any(|p| p == profile) {
            return Err(ApplyError::Transport(format!("connection reset ({profile})")));
        }
        Ok(())
    }
}

pub fn row(p: &str, s: &str, from: &str, to: &str, descr: &str) -> DesiredRow {
    DesiredRecord::new(p, s, from, to, descr).into()
}
