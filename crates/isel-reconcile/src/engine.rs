use std::fmt;

use tracing::{debug, error, info, warn};

use crate::{DesiredRecord, DesiredRow, ExistingStateIndex, OutcomeRecord, RunSummary};

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Why a desired record could not be turned into a configuration document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeError {
    pub field: &'static str,
    pub reason: String,
}

impl EncodeError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot encode field '{}': {}", self.field, self.reason)
    }
}

impl std::error::Error for EncodeError {}

/// Failure reported by the apply capability for a single document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApplyError {
    /// Connect/timeout/IO failure; nothing is known about controller state.
    Transport(String),
    /// The controller answered with a non-success status.
    Rejected { status: u16, body: String },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::Transport(msg) => write!(f, "transport error: {msg}"),
            ApplyError::Rejected { status, body } if body.is_empty() => {
                write!(f, "HTTP {status}")
            }
            ApplyError::Rejected { status, body } => write!(f, "HTTP {status}: {body}"),
        }
    }
}

impl std::error::Error for ApplyError {}

/// Serialises one `(profile, selector)` binding into the document the
/// controller accepts.
pub trait SelectorEncoder {
    fn encode(&self, record: &DesiredRecord) -> Result<String, EncodeError>;
}

/// Pushes one encoded document to the controller.
///
/// With `dry_run` set an implementation must not produce any network effect
/// and must report success.
pub trait SelectorApplier {
    fn apply(&self, profile: &str, payload: &str, dry_run: bool) -> Result<(), ApplyError>;
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Drives the skip/apply decision for each desired row against one snapshot.
pub struct Reconciler<'a, E: ?Sized, A: ?Sized> {
    existing: &'a ExistingStateIndex,
    encoder: &'a E,
    applier: &'a A,
    dry_run: bool,
}

impl<'a, E, A> Reconciler<'a, E, A>
where
    E: SelectorEncoder + ?Sized,
    A: SelectorApplier + ?Sized,
{
    pub fn new(existing: &'a ExistingStateIndex, encoder: &'a E, applier: &'a A) -> Self {
        Self {
            existing,
            encoder,
            applier,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Single transition `Pending -> {Skipped | Pushed | Failed}` for one row.
    ///
    /// Only the snapshot is consulted for the skip check; earlier pushes in
    /// the same run do not count, so two identical rows absent from the
    /// snapshot both reach the applier.
    pub fn decide(&self, row: &DesiredRow) -> OutcomeRecord {
        let record = match row {
            DesiredRow::Valid(r) => r,
            DesiredRow::Malformed {
                row,
                profile,
                selector_name,
                reason,
            } => {
                warn!(
                    row,
                    profile = %profile,
                    selector = %selector_name,
                    reason = %reason,
                    "malformed desired row"
                );
                return OutcomeRecord::failed(profile, selector_name, &format!("row {row}: {reason}"));
            }
        };

        let profile = record.profile.as_str();
        let selector = record.selector_name.as_str();

        if self.existing.contains(profile, selector) {
            debug!(profile, selector, "selector already present, skipping");
            return OutcomeRecord::skipped(profile, selector);
        }

        let payload = match self.encoder.encode(record) {
            Ok(p) => p,
            Err(e) => {
                error!(profile, selector, error = %e, "encode failed");
                return OutcomeRecord::failed(profile, selector, &e.to_string());
            }
        };

        match self.applier.apply(profile, &payload, self.dry_run) {
            Ok(()) => {
                info!(profile, selector, dry_run = self.dry_run, "selector pushed");
                OutcomeRecord::pushed(profile, selector, self.dry_run)
            }
            Err(e) => {
                error!(profile, selector, error = %e, "apply failed");
                OutcomeRecord::failed(profile, selector, &e.to_string())
            }
        }
    }

    pub fn run<'r, I>(&self, rows: I) -> RunSummary
    where
        I: IntoIterator<Item = &'r DesiredRow>,
    {
        self.run_with(rows, |_| {})
    }

    /// Like [`Reconciler::run`], handing each outcome to `on_outcome` as soon
    /// as it is decided (live console output).
    pub fn run_with<'r, I, F>(&self, rows: I, mut on_outcome: F) -> RunSummary
    where
        I: IntoIterator<Item = &'r DesiredRow>,
        F: FnMut(&OutcomeRecord),
    {
        let mut outcomes = Vec::new();
        for row in rows {
            let outcome = self.decide(row);
            on_outcome(&outcome);
            outcomes.push(outcome);
        }
        RunSummary::from_outcomes(outcomes)
    }
}

// ---------------------------------------------------------------------------
// Internal unit tests
// ---------------------------------------------------------------------------
