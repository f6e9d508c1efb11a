use isel_reconcile::{ApplyError, SelectorApplier, PROFILE_RN_PREFIX};
use tracing::{debug, info};

use crate::model::envelope_error_text;
use crate::session::ApicSession;

/// Pushes encoded selector documents through an authenticated session.
#[derive(Debug, Clone, Copy)]
pub struct ApicApplier<'a> {
    session: &'a ApicSession,
}

impl<'a> ApicApplier<'a> {
    pub fn new(session: &'a ApicSession) -> Self {
        Self { session }
    }

    /// `/api/node/mo/uni/infra/accportprof-{profile}.xml`
    pub fn target_path(profile: &str) -> String {
        format!("/api/node/mo/uni/infra/{PROFILE_RN_PREFIX}-{profile}.xml")
    }
}

impl SelectorApplier for ApicApplier<'_> {
    fn apply(&self, profile: &str, payload: &str, dry_run: bool) -> Result<(), ApplyError> {
        if dry_run {
            info!("[DRY RUN] Would push config for {profile}");
            return Ok(());
        }

        let url = self.session.url(&Self::target_path(profile));
        debug!(%url, bytes = payload.len(), "apic config push");

        let resp = self
            .session
            .http()
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/xml")
            .header(reqwest::header::COOKIE, self.session.cookie())
            .body(payload.to_string())
            .send()
            .map_err(transport)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let text = resp.text().unwrap_or_default();
        Err(ApplyError::Rejected {
            status: status.as_u16(),
            body: envelope_error_text(&text).unwrap_or_else(|| text.trim().to_string()),
        })
    }
}

fn transport(e: reqwest::Error) -> ApplyError {
    if e.is_timeout() {
        ApplyError::Transport(format!("timed out: {e}"))
    } else {
        ApplyError::Transport(e.to_string())
    }
}
