//! # popgrab-pop3
//!
//! An async POP3 client library implementing RFC 1939, with implicit TLS
//! via rustls.
//!
//! ## Features
//!
//! - **Type-state connection management**: Compile-time enforcement of valid
//!   POP3 state transitions (`NotAuthenticated` → `Authenticated`)
//! - **TLS via rustls**: Secure connections without OpenSSL dependency
//! - **Sans-I/O response parsing**: Protocol parsing separated from network I/O
//! - **Byte-stuffing aware framing**: Multi-line responses are read to the
//!   lone-dot terminator and dot-unstuffed
//!
//! ## Quick Start
//!
//! ```ignore
//! use popgrab_pop3::{Client, connection::connect_tls};
//!
//! #[tokio::main]
//! async fn main() -> popgrab_pop3::Result<()> {
//!     let stream = connect_tls("pop.example.com", popgrab_pop3::DEFAULT_TLS_PORT).await?;
//!     let client = Client::from_stream(stream).await?;
//!
//!     // Authenticate
//!     let mut client = client.login("user@example.com", "password").await?;
//!
//!     // How much mail is waiting?
//!     let stat = client.stat().await?;
//!     println!("{} messages, {} octets", stat.count, stat.octets);
//!
//!     // Stable unique ids for delta detection
//!     let listing = client.uidl().await?;
//!     for entry in listing.iter() {
//!         println!("{} {}", entry.number, entry.uid);
//!     }
//!
//!     // Retrieve a message as raw byte lines
//!     if let Some(entry) = listing.iter().next() {
//!         let lines = client.retr(entry.number).await?;
//!         println!("{} lines", lines.len());
//!     }
//!
//!     client.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! The library uses the type-state pattern to enforce valid POP3 operations
//! at compile time:
//!
//! ```text
//! NotAuthenticated --- login() ---> Authenticated --- quit() ---> closed
//! ```
//!
//! ## Modules
//!
//! - [`command`]: POP3 command serialization
//! - [`connection`]: Connection management and type-state client
//! - [`response`]: Sans-I/O response parser
//! - [`types`]: Core POP3 types (message numbers, unique ids, listings)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod response;
pub mod types;

pub use command::Command;
pub use connection::{Authenticated, Client, FramedStream, NotAuthenticated, Pop3Stream};
pub use error::{Error, Result};
pub use response::Status;
pub use types::{ListingEntry, MailboxListing, MailboxStat, MessageNumber, UniqueId};

/// Default port for POP3 over implicit TLS (RFC 2595).
pub const DEFAULT_TLS_PORT: u16 = 995;
