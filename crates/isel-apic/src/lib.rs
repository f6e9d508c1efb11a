//! isel-apic
//!
//! Controller side of the selector sync: login, selector query, XML encoding
//! and config push against a Cisco APIC.
//!
//! Everything here is blocking and sequential. Every request carries the
//! per-call timeout from [`ClientOptions`]; a timeout is reported like any
//! other transport failure and nothing is retried.

mod apply;
mod encoder;
mod model;
mod session;
mod state;

use std::fmt;

pub use apply::ApicApplier;
pub use encoder::XmlSelectorEncoder;
pub use session::{normalize_base_url, ApicClient, ApicSession, ClientOptions, Credentials};
pub use state::{SelectorObject, SelectorSource, StateReader};

/// Errors from the controller boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApicError {
    /// Host or client settings are unusable.
    Config(String),
    /// Connect, TLS, timeout or IO failure.
    Transport(String),
    /// Non-success HTTP status; `message` is the APIC error text when the
    /// body carried one, otherwise the raw body.
    Http { status: u16, message: String },
    /// Response body did not have the expected shape.
    Decode(String),
}

impl fmt::Display for ApicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApicError::Config(msg) => write!(f, "apic config error: {msg}"),
            ApicError::Transport(msg) => write!(f, "apic transport error: {msg}"),
            ApicError::Http { status, message } if message.is_empty() => {
                write!(f, "apic http error status={status}")
            }
            ApicError::Http { status, message } => {
                write!(f, "apic http error status={status}: {message}")
            }
            ApicError::Decode(msg) => write!(f, "apic decode error: {msg}"),
        }
    }
}

impl std::error::Error for ApicError {}

impl From<reqwest::Error> for ApicError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApicError::Transport(format!("timed out: {e}"))
        } else {
            ApicError::Transport(e.to_string())
        }
    }
}
