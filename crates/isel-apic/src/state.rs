//! StateReader: one class query, grouped into an [`ExistingStateIndex`].

use isel_reconcile::{classify_selector_dn, ExistingStateIndex, SelectorOwner};
use tracing::{debug, info};

use crate::model::{HPortItem, ImData};
use crate::session::{http_error, ApicSession};
use crate::ApicError;

pub const SELECTOR_CLASS: &str = "infraHPortS";

/// A selector object as the controller reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorObject {
    pub dn: String,
    pub name: String,
}

impl SelectorObject {
    pub fn new(dn: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            name: name.into(),
        }
    }
}

/// Query capability: every selector object currently configured.
pub trait SelectorSource {
    fn list_selectors(&self) -> Result<Vec<SelectorObject>, ApicError>;
}

impl SelectorSource for ApicSession {
    /// `GET /api/node/class/infraHPortS.json`
    fn list_selectors(&self) -> Result<Vec<SelectorObject>, ApicError> {
        let url = self.url(&format!("/api/node/class/{SELECTOR_CLASS}.json"));
        debug!(%url, "apic class query");

        let resp = self
            .http()
            .get(&url)
            .header(reqwest::header::COOKIE, self.cookie())
            .send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(http_error(status.as_u16(), &text));
        }

        let parsed: ImData<HPortItem> = serde_json::from_str(&text)
            .map_err(|e| ApicError::Decode(format!("{SELECTOR_CLASS} query response: {e}")))?;
        Ok(parsed
            .imdata
            .into_iter()
            .filter_map(|i| i.hport)
            .map(|h| SelectorObject::new(h.attributes.dn, h.attributes.name))
            .collect())
    }
}

/// Builds the existing-state snapshot from a [`SelectorSource`].
pub struct StateReader<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: SelectorSource + ?Sized> StateReader<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// One query, no retries. Objects whose DN is not under an interface
    /// profile are left out silently.
    pub fn fetch_existing(&self) -> Result<ExistingStateIndex, ApicError> {
        let objects = self.source.list_selectors()?;
        let total_objects = objects.len();

        let mut foreign = 0usize;
        let index = ExistingStateIndex::from_pairs(objects.into_iter().filter_map(|o| {
            match classify_selector_dn(&o.dn) {
                SelectorOwner::Profile(profile) if !o.name.is_empty() => Some((profile, o.name)),
                _ => {
                    foreign += 1;
                    None
                }
            }
        }));

        debug!(total_objects, foreign, "selector objects classified");
        info!(
            "Found {} selectors across {} profiles",
            index.selector_count(),
            index.profile_count()
        );
        Ok(index)
    }
}
