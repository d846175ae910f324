//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::Authenticated;
use crate::command::Command;
use crate::response::{parse_list_entry, parse_stat, parse_uidl_entry};
use crate::types::{MailboxListing, MailboxStat, MessageNumber};
use crate::{Error, Result};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the message count and total mailbox size in octets.
    ///
    /// Advisory only: the authoritative per-message view comes from
    /// [`Self::uidl`].
    pub async fn stat(&mut self) -> Result<MailboxStat> {
        let cmd = Command::Stat.serialize();
        self.stream.write_command(&cmd).await?;

        let text = self.expect_ok().await?;
        let stat = parse_stat(&text)?;
        tracing::debug!(count = stat.count, octets = stat.octets, "STAT");
        Ok(stat)
    }

    /// Returns the per-message sizes in octets.
    pub async fn list(&mut self) -> Result<Vec<(MessageNumber, u64)>> {
        let cmd = Command::List.serialize();
        self.stream.write_command(&cmd).await?;
        self.expect_ok().await?;

        let lines = self.stream.read_multiline().await?;
        lines.iter().map(|line| parse_list_entry(line)).collect()
    }

    /// Returns the current mailbox listing: message numbers paired with
    /// their stable unique ids.
    pub async fn uidl(&mut self) -> Result<MailboxListing> {
        let cmd = Command::Uidl.serialize();
        self.stream.write_command(&cmd).await?;
        self.expect_ok().await?;

        let lines = self.stream.read_multiline().await?;
        let entries = lines
            .iter()
            .map(|line| parse_uidl_entry(line))
            .collect::<Result<Vec<_>>>()?;
        Ok(MailboxListing::new(entries))
    }

    /// Retrieves one message as its raw byte lines, dot-unstuffed and
    /// stripped of line terminators.
    ///
    /// The message number is only valid within this session.
    pub async fn retr(&mut self, number: MessageNumber) -> Result<Vec<Vec<u8>>> {
        let cmd = Command::Retr(number).serialize();
        self.stream.write_command(&cmd).await?;
        self.expect_ok().await?;

        self.stream.read_multiline().await
    }

    /// Ends the session cleanly.
    ///
    /// Consumes the client. A server `-ERR` to QUIT is propagated because it
    /// means the server did not commit the transaction.
    pub async fn quit(mut self) -> Result<()> {
        let cmd = Command::Quit.serialize();
        self.stream.write_command(&cmd).await?;

        match self.read_status().await? {
            crate::response::Status::Ok(_) => Ok(()),
            crate::response::Status::Err(text) => Err(Error::Server(text)),
        }
    }
}
