//! Type-state POP3 client connection.
//!
//! Uses the type-state pattern to enforce valid state transitions at compile
//! time. The POP3 connection states are:
//!
//! - `NotAuthenticated`: Initial state after connection (RFC 1939
//!   AUTHORIZATION state)
//! - `Authenticated`: After successful USER/PASS (TRANSACTION state)
//!
//! Each state only exposes methods that are valid for that state.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod states;

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::states::{Authenticated, NotAuthenticated};
use super::framed::FramedStream;
use crate::response::{Status, parse_status};
use crate::{Error, Result};

/// POP3 client connection with type-state.
///
/// The type parameter `State` tracks the connection state at compile time.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) greeting: String,
    _state: PhantomData<State>,
}

// Manual Debug implementation since FramedStream doesn't implement Debug
impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("greeting", &self.greeting)
            .finish_non_exhaustive()
    }
}

/// Shared implementation for all states.
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the greeting text the server sent on connect.
    #[must_use]
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Transitions to another state, keeping the stream and greeting.
    pub(crate) fn into_state<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            greeting: self.greeting,
            _state: PhantomData,
        }
    }

    /// Reads and parses the next status line.
    pub(crate) async fn read_status(&mut self) -> Result<Status> {
        let line = self.stream.read_line().await?;
        parse_status(&line)
    }

    /// Reads the next status line, mapping `-ERR` to `Error::Server`.
    pub(crate) async fn expect_ok(&mut self) -> Result<String> {
        match self.read_status().await? {
            Status::Ok(text) => Ok(text),
            Status::Err(text) => Err(Error::Server(text)),
        }
    }
}
