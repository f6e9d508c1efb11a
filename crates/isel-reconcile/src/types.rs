use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

/// Selectors currently configured on the controller, keyed by owning profile.
///
/// Built once per run from the controller snapshot and never mutated after
/// construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExistingStateIndex {
    profiles: BTreeMap<String, BTreeSet<String>>,
}

impl ExistingStateIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an index from `(profile, selector_name)` pairs. A profile key is
    /// created the first time it is seen; duplicate pairs collapse.
    pub fn from_pairs<I, P, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<String>,
        S: Into<String>,
    {
        let mut profiles: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (profile, selector) in pairs {
            profiles
                .entry(profile.into())
                .or_default()
                .insert(selector.into());
        }
        Self { profiles }
    }

    pub fn contains(&self, profile: &str, selector_name: &str) -> bool {
        self.profiles
            .get(profile)
            .map(|set| set.contains(selector_name))
            .unwrap_or(false)
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }

    pub fn selector_count(&self) -> usize {
        self.profiles.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// One desired selector, as read from the input file.
///
/// Port identifiers and the description are opaque; they are handed to the
/// encoder untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DesiredRecord {
    pub profile: String,
    pub selector_name: String,
    pub from_port: String,
    pub to_port: String,
    pub description: String,
}

impl DesiredRecord {
    pub fn new(
        profile: impl Into<String>,
        selector_name: impl Into<String>,
        from_port: impl Into<String>,
        to_port: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            selector_name: selector_name.into(),
            from_port: from_port.into(),
            to_port: to_port.into(),
            description: description.into(),
        }
    }
}

/// A row of the desired set after loading.
///
/// Malformed rows are carried through to the reconciler so they surface as a
/// `Failed` outcome in their input position instead of failing the load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DesiredRow {
    Valid(DesiredRecord),
    Malformed {
        /// 1-based line in the source (header is line 1).
        row: usize,
        profile: String,
        selector_name: String,
        reason: String,
    },
}

impl DesiredRow {
    pub fn profile(&self) -> &str {
        match self {
            DesiredRow::Valid(r) => &r.profile,
            DesiredRow::Malformed { profile, .. } => profile,
        }
    }

    pub fn selector_name(&self) -> &str {
        match self {
            DesiredRow::Valid(r) => &r.selector_name,
            DesiredRow::Malformed { selector_name, .. } => selector_name,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DesiredRow::Valid(_))
    }
}

impl From<DesiredRecord> for DesiredRow {
    fn from(r: DesiredRecord) -> Self {
        DesiredRow::Valid(r)
    }
}

/// Terminal state of one desired row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Pushed,
    Skipped,
    Failed,
}

/// Outcome for one desired row. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutcomeRecord {
    pub profile: String,
    pub selector_name: String,
    pub status: OutcomeStatus,
    /// Operator-facing line. For `Failed` it ends with the underlying detail,
    /// verbatim.
    pub message: String,
}

impl OutcomeRecord {
    pub fn skipped(profile: &str, selector_name: &str) -> Self {
        Self {
            profile: profile.to_string(),
            selector_name: selector_name.to_string(),
            status: OutcomeStatus::Skipped,
            message: format!(
                "Skipped: selector '{selector_name}' already exists under profile '{profile}'"
            ),
        }
    }

    pub fn pushed(profile: &str, selector_name: &str, dry_run: bool) -> Self {
        let suffix = if dry_run { " (dry run)" } else { "" };
        Self {
            profile: profile.to_string(),
            selector_name: selector_name.to_string(),
            status: OutcomeStatus::Pushed,
            message: format!("Pushed: selector '{selector_name}' under profile '{profile}'{suffix}"),
        }
    }

    pub fn failed(profile: &str, selector_name: &str, detail: &str) -> Self {
        Self {
            profile: profile.to_string(),
            selector_name: selector_name.to_string(),
            status: OutcomeStatus::Failed,
            message: format!(
                "Failed: selector '{selector_name}' under profile '{profile}': {detail}"
            ),
        }
    }

    /// `profile:selector` form used in the skip list.
    pub fn identifier(&self) -> String {
        format!("{}:{}", self.profile, self.selector_name)
    }
}

impl fmt::Display for OutcomeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Aggregate of one reconciler run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub pushed_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    /// `profile:selector` for every skipped row, in input order.
    pub skipped_identifiers: Vec<String>,
    /// One entry per desired row, in input order.
    pub outcomes: Vec<OutcomeRecord>,
}

impl RunSummary {
    /// Fold outcomes into counts. The result depends only on `outcomes`.
    pub fn from_outcomes(outcomes: Vec<OutcomeRecord>) -> Self {
        let mut summary = RunSummary::default();
        for o in &outcomes {
            match o.status {
                OutcomeStatus::Pushed => summary.pushed_count += 1,
                OutcomeStatus::Skipped => {
                    summary.skipped_count += 1;
                    summary.skipped_identifiers.push(o.identifier());
                }
                OutcomeStatus::Failed => summary.failed_count += 1,
            }
        }
        summary.outcomes = outcomes;
        summary
    }

    pub fn total(&self) -> usize {
        self.pushed_count + self.skipped_count + self.failed_count
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }

    pub fn pushed(&self) -> impl Iterator<Item = &OutcomeRecord> {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Pushed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_groups_by_profile_and_dedups() {
        let idx = ExistingStateIndex::from_pairs([
            ("LF1101", "ISEL-1"),
            ("LF1101", "ISEL-2"),
            ("LF1101", "ISEL-1"),
            ("LF1102", "ISEL-1"),
        ]);
        assert_eq!(idx.profile_count(), 2);
        assert_eq!(idx.selector_count(), 3);
        assert!(idx.contains("LF1101", "ISEL-2"));
        assert!(!idx.contains("LF1102", "ISEL-2"));
        assert!(!idx.contains("LF9999", "ISEL-1"));
    }

    #[test]
    fn summary_fold_counts_and_skip_list() {
        let s = RunSummary::from_outcomes(vec![
            OutcomeRecord::skipped("P1", "S1"),
            OutcomeRecord::pushed("P1", "S2", false),
            OutcomeRecord::failed("P2", "S3", "HTTP 400: bad"),
            OutcomeRecord::skipped("P2", "S4"),
        ]);
        assert_eq!(s.pushed_count, 1);
        assert_eq!(s.skipped_count, 2);
        assert_eq!(s.failed_count, 1);
        assert_eq!(s.total(), 4);
        assert_eq!(s.skipped_identifiers, vec!["P1:S1", "P2:S4"]);
        assert!(s.has_failures());
    }

    #[test]
    fn failed_message_carries_detail_verbatim() {
        let o = OutcomeRecord::failed("P", "S", "HTTP 400: <imdata/>");
        assert!(o.to_string().ends_with("HTTP 400: <imdata/>"));
    }

    #[test]
    fn dry_run_push_is_marked() {
        assert!(OutcomeRecord::pushed("P", "S", true).message.ends_with("(dry run)"));
        assert!(!OutcomeRecord::pushed("P", "S", false).message.contains("dry run"));
    }

    #[test]
    fn status_serializes_snake_case() {
        let v = serde_json::to_value(OutcomeStatus::Skipped).unwrap();
        assert_eq!(v, serde_json::json!("skipped"));
    }
}
