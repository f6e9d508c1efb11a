//! isel-desired
//!
//! Loads the desired selector set from a delimited text file.
//!
//! This crate does **not** talk to the controller or decide anything; it only
//! turns a file into ordered [`isel_reconcile::DesiredRow`]s for the reconciler.

pub mod loader;
pub mod sniff;

pub use loader::{load_file, load_str, DesiredSet, LoadError, REQUIRED_COLUMNS};
pub use sniff::{sniff_delimiter, Delimiter, SNIFF_SAMPLE_BYTES};
