//! # popgrab-core
//!
//! The pipeline behind popgrab: account configuration, delta detection
//! against persisted listing snapshots, message decoding, attachment
//! extraction, and the per-account polling loop.
//!
//! ## Flow
//!
//! ```text
//! Poller -> Mailbox session (listing)
//!        -> delta (diff against persisted snapshot)
//!        -> per new message: retrieve -> decode -> extract
//!        -> persist the observed listing as the next baseline
//! ```
//!
//! State only advances after a fully drained cycle, so a crash or a failed
//! account re-fetches next tick instead of skipping mail: attachment
//! delivery is at-least-once, never lossy.
//!
//! ## Modules
//!
//! - [`account`]: Account model and the supported protocol variant
//! - [`config`]: Operator-facing YAML configuration
//! - [`decode`]: Raw lines → decoded headers + MIME tree
//! - [`delta`]: New-message detection keyed on stable unique ids
//! - [`extract`]: Attachment extraction to per-sender directories
//! - [`poll`]: The per-account cycle and interval loop
//! - [`state`]: Versioned listing snapshots, one file per account

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
pub mod decode;
pub mod delta;
mod error;
pub mod extract;
mod paths;
pub mod poll;
pub mod state;

pub use account::{Account, Protocol};
pub use config::Config;
pub use decode::{DecodedHeaders, DecodedMessage};
pub use error::{Error, Result};
pub use extract::ExtractionResult;
pub use poll::{Connect, Mailbox, Pop3Connector, Poller};
pub use state::{ListingRecord, ListingSnapshot, StateStore};
