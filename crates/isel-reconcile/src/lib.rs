//! isel-reconcile
//!
//! Selector reconciliation core.
//!
//! Architectural decisions:
//! - One snapshot of existing selectors per run, read before any write
//! - Skip check is against that snapshot only; it is never refreshed mid-run
//! - Every desired row produces exactly one outcome, in input order
//! - A failing row never aborts the batch
//!
//! Deterministic, pure logic. No IO. No controller calls. The controller side
//! plugs in through [`SelectorEncoder`] and [`SelectorApplier`].

mod dn;
mod engine;
mod gate;
mod types;

pub use dn::{classify_selector_dn, Dn, DnError, Rn, SelectorOwner, PROFILE_RN_PREFIX};
pub use engine::{ApplyError, EncodeError, Reconciler, SelectorApplier, SelectorEncoder};
pub use gate::{resolve_snapshot, Snapshot, StateFetchPolicy, StateFetchRefused};
pub use types::*;
