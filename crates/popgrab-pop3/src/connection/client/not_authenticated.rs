//! Implementation for the not-authenticated state.

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::Command;
use crate::connection::framed::FramedStream;
use crate::response::{Status, parse_status};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads and validates the server greeting.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let line = framed.read_line().await?;
        let greeting = match parse_status(&line)? {
            Status::Ok(text) => text,
            Status::Err(text) => {
                return Err(Error::Protocol(format!("server refused session: {text}")));
            }
        };
        tracing::debug!(%greeting, "POP3 server greeting");

        Ok(Self {
            stream: framed,
            greeting,
            _state: PhantomData,
        })
    }

    /// Authenticates with the server using USER/PASS.
    ///
    /// Consumes self and returns an authenticated client on success. A
    /// server `-ERR` to either command is reported as `Error::Auth`.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        let cmd = Command::User(username.to_string()).serialize();
        self.stream.write_command(&cmd).await?;
        if let Status::Err(text) = self.read_status().await? {
            return Err(Error::Auth(text));
        }

        let cmd = Command::Pass(password.to_string()).serialize();
        self.stream.write_command(&cmd).await?;
        if let Status::Err(text) = self.read_status().await? {
            return Err(Error::Auth(text));
        }

        Ok(self.into_state())
    }
}
