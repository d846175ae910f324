//! # popgrab-mime
//!
//! MIME message parsing and decoding for mail retrieval.
//!
//! ## Features
//!
//! - **Message parsing**: Full part-tree parsing with nested multipart
//!   support; attachments are found at any depth
//! - **Transfer decoding**: Base64 and Quoted-Printable at the byte level
//! - **Header decoding**: RFC 2047 encoded words with per-word charsets
//! - **Charset handling**: Statistical detection (chardetng) plus declared
//!   label decoding (`encoding_rs`), with remaps for aliases that lie
//!
//! ## Quick Start
//!
//! ```ignore
//! use popgrab_mime::{Message, Part, charset, encoding};
//!
//! // Raw protocol lines are decoded individually before parsing.
//! let text: String = raw_lines
//!     .iter()
//!     .map(|line| charset::decode_line(line))
//!     .collect::<Vec<_>>()
//!     .join("\n");
//!
//! let message = Message::parse(&text)?;
//! for part in message.walk() {
//!     if let Some(raw_name) = part.filename() {
//!         let name = encoding::decode_rfc2047(&raw_name);
//!         let payload = part.decode_body()?;
//!         println!("{name}: {} bytes", payload.len());
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod charset;
mod content_type;
pub mod encoding;
mod error;
mod header;
mod message;

pub use content_type::{ContentDisposition, ContentType};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
