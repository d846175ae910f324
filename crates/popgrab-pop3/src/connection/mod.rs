//! Connection management for POP3 sessions.

mod client;
mod framed;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated};
pub use framed::FramedStream;
pub use stream::{Pop3Stream, connect_plain, connect_tls, create_tls_connector};
