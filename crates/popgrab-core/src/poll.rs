//! Account polling and scheduling.
//!
//! Drives one cycle per account per tick:
//!
//! ```text
//! connect -> stat -> listing -> delta -> retrieve/decode/extract* -> quit -> persist
//! ```
//!
//! The snapshot is persisted only after a fully drained cycle; any failure
//! leaves the previous baseline intact, so nothing is ever silently
//! skipped; the next tick simply re-fetches. One account's failure never
//! blocks the others. Accounts are processed strictly sequentially:
//! message numbers are session-scoped, and the protocol offers nothing that
//! would make concurrent sessions against one maildrop safe.

use std::time::Duration;

use popgrab_pop3::{Authenticated, Client, MailboxListing, MailboxStat, MessageNumber, Pop3Stream};

use crate::account::Account;
use crate::config::Config;
use crate::error::Result;
use crate::state::{ListingSnapshot, StateStore};
use crate::{decode, delta, extract, paths};

/// One open, authenticated mailbox session.
///
/// The seam between the poller and the wire protocol; tests drive the
/// poller through scripted implementations.
#[allow(async_fn_in_trait)]
pub trait Mailbox {
    /// Returns advisory message count and total size.
    async fn stat(&mut self) -> Result<MailboxStat>;

    /// Returns the current listing of message numbers and unique ids.
    async fn listing(&mut self) -> Result<MailboxListing>;

    /// Retrieves one message as raw byte lines.
    async fn retrieve(&mut self, number: MessageNumber) -> Result<Vec<Vec<u8>>>;

    /// Ends the session cleanly.
    async fn quit(self) -> Result<()>
    where
        Self: Sized;
}

/// Opens an authenticated session for an account.
#[allow(async_fn_in_trait)]
pub trait Connect {
    /// Session type produced by this connector.
    type Session: Mailbox;

    /// Opens and authenticates a session against the account's server.
    async fn connect(&self, account: &Account) -> Result<Self::Session>;
}

/// Production connector: POP3 over implicit TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pop3Connector;

/// A live POP3 session.
pub struct Pop3Session(Client<Pop3Stream, Authenticated>);

impl Connect for Pop3Connector {
    type Session = Pop3Session;

    async fn connect(&self, account: &Account) -> Result<Pop3Session> {
        let stream = popgrab_pop3::connection::connect_tls(&account.host, account.port).await?;
        let client = Client::from_stream(stream).await?;
        let client = client.login(&account.address, &account.password).await?;
        Ok(Pop3Session(client))
    }
}

impl Mailbox for Pop3Session {
    async fn stat(&mut self) -> Result<MailboxStat> {
        Ok(self.0.stat().await?)
    }

    async fn listing(&mut self) -> Result<MailboxListing> {
        Ok(self.0.uidl().await?)
    }

    async fn retrieve(&mut self, number: MessageNumber) -> Result<Vec<Vec<u8>>> {
        Ok(self.0.retr(number).await?)
    }

    async fn quit(self) -> Result<()> {
        Ok(self.0.quit().await?)
    }
}

/// Polls configured accounts, once or on a fixed interval.
#[derive(Debug)]
pub struct Poller<C> {
    connector: C,
    config: Config,
    store: StateStore,
}

impl<C: Connect> Poller<C> {
    /// Creates a poller over the given configuration and connector.
    #[must_use]
    pub fn new(config: Config, connector: C) -> Self {
        let store = StateStore::new(&config.state_path);
        Self {
            connector,
            config,
            store,
        }
    }

    /// Runs until done: a single pass, or forever at the configured
    /// interval in continuous mode.
    pub async fn run(&self) {
        loop {
            self.run_once().await;
            if !self.config.continuous {
                break;
            }
            tokio::time::sleep(Duration::from_secs(self.config.interval)).await;
        }
    }

    /// Runs one pass over all configured accounts.
    ///
    /// A failing account is logged and skipped with its previous state
    /// intact; the pass continues with the remaining accounts.
    pub async fn run_once(&self) {
        for (name, account) in &self.config.accounts {
            match self.cycle_account(name, account).await {
                Ok(fetched) => {
                    tracing::info!(account = %name, new_messages = fetched, "cycle complete");
                }
                Err(error) => {
                    tracing::warn!(account = %name, %error, "cycle failed, keeping previous state");
                }
            }
        }
    }

    /// Runs one full cycle for one account and returns how many new
    /// messages were fetched.
    async fn cycle_account(&self, name: &str, account: &Account) -> Result<usize> {
        let previous = self.store.load(name)?;

        let mut session = self.connector.connect(account).await?;
        let outcome = self.drain_session(&mut session, name, previous.as_ref()).await;

        // The session is closed whether or not draining succeeded.
        let quit_result = session.quit().await;

        let (snapshot, fetched) = outcome?;
        // A failed QUIT means the server may not have committed the
        // transaction; do not advance the baseline past it.
        quit_result?;

        self.store.save(name, &snapshot)?;
        Ok(fetched)
    }

    /// Lists, diffs, and fetches everything new in one open session.
    async fn drain_session(
        &self,
        session: &mut C::Session,
        name: &str,
        previous: Option<&ListingSnapshot>,
    ) -> Result<(ListingSnapshot, usize)> {
        let stat = session.stat().await?;
        tracing::debug!(account = %name, count = stat.count, octets = stat.octets, "mailbox stat");

        let listing = session.listing().await?;
        let new = delta::new_messages(&listing, previous, self.config.first_run_limit);
        tracing::debug!(account = %name, listed = listing.len(), new = new.len(), "delta computed");

        let attach_base = self.config.attach_path.join(paths::sanitize_component(name));

        for number in &new {
            let raw_lines = session.retrieve(*number).await?;

            let decoded = match decode::decode_message(&raw_lines) {
                Ok(decoded) => decoded,
                Err(error) => {
                    tracing::warn!(account = %name, message = %number, %error, "undecodable message skipped");
                    continue;
                }
            };

            let result = extract::extract_attachments(&decoded, &attach_base)?;
            tracing::info!(
                account = %name,
                message = %number,
                from = decoded.headers.from.as_deref().unwrap_or(""),
                subject = decoded.headers.subject.as_deref().unwrap_or(""),
                attachments = ?result.filenames,
                "message processed"
            );
        }

        Ok((ListingSnapshot::capture(&listing), new.len()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::error::Error;
    use popgrab_pop3::{ListingEntry, UniqueId};
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    /// Scripted mail server shared by every mock session.
    #[derive(Default)]
    struct MockServer {
        /// Per account address: (uid, raw message text) in maildrop order.
        mailboxes: HashMap<String, Vec<(String, String)>>,
        /// Addresses whose connection attempts fail.
        fail_connect: HashSet<String>,
        /// Every RETR issued, as (address, message number).
        retrieved: Mutex<Vec<(String, u32)>>,
        /// Sessions opened, across all accounts.
        connects: Mutex<u32>,
    }

    #[derive(Clone)]
    struct MockConnector(Arc<MockServer>);

    struct MockSession {
        address: String,
        messages: Vec<(String, String)>,
        server: Arc<MockServer>,
    }

    impl Connect for MockConnector {
        type Session = MockSession;

        async fn connect(&self, account: &Account) -> Result<MockSession> {
            *self.0.connects.lock().unwrap() += 1;
            if self.0.fail_connect.contains(&account.address) {
                return Err(Error::Pop3(popgrab_pop3::Error::Auth(
                    "mock rejection".to_string(),
                )));
            }
            Ok(MockSession {
                address: account.address.clone(),
                messages: self
                    .0
                    .mailboxes
                    .get(&account.address)
                    .cloned()
                    .unwrap_or_default(),
                server: Arc::clone(&self.0),
            })
        }
    }

    impl Mailbox for MockSession {
        async fn stat(&mut self) -> Result<MailboxStat> {
            Ok(MailboxStat {
                count: u32::try_from(self.messages.len()).unwrap(),
                octets: 0,
            })
        }

        async fn listing(&mut self) -> Result<MailboxListing> {
            Ok(MailboxListing::new(
                self.messages
                    .iter()
                    .enumerate()
                    .map(|(i, (uid, _))| ListingEntry {
                        number: MessageNumber::new(u32::try_from(i).unwrap() + 1).unwrap(),
                        uid: UniqueId::new(uid.clone()),
                    })
                    .collect(),
            ))
        }

        async fn retrieve(&mut self, number: MessageNumber) -> Result<Vec<Vec<u8>>> {
            self.server
                .retrieved
                .lock()
                .unwrap()
                .push((self.address.clone(), number.get()));
            let (_, text) = self
                .messages
                .get(number.get() as usize - 1)
                .ok_or_else(|| Error::State("no such message".to_string()))?;
            Ok(text.lines().map(|l| l.as_bytes().to_vec()).collect())
        }

        async fn quit(self) -> Result<()> {
            Ok(())
        }
    }

    fn message_with_attachment(filename: &str) -> String {
        format!(
            concat!(
                "From: Alice <a@x.com>\n",
                "Content-Type: multipart/mixed; boundary=b\n",
                "\n",
                "--b\n",
                "Content-Disposition: attachment; filename=\"{}\"\n",
                "\n",
                "payload\n",
                "--b--\n"
            ),
            filename
        )
    }

    fn account(address: &str) -> Account {
        Account {
            address: address.to_string(),
            password: "pw".to_string(),
            host: "pop.test".to_string(),
            port: 995,
            protocol: crate::account::Protocol::Pop3,
        }
    }

    fn config(accounts: &[&str], attach: &Path, state: &Path) -> Config {
        Config {
            accounts: accounts
                .iter()
                .map(|name| ((*name).to_string(), account(&format!("{name}@x.com"))))
                .collect::<BTreeMap<_, _>>(),
            attach_path: attach.to_path_buf(),
            state_path: state.to_path_buf(),
            interval: 0,
            continuous: false,
            first_run_limit: None,
        }
    }

    #[tokio::test]
    async fn second_pass_with_no_new_mail_fetches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MockServer::default();
        server.mailboxes.insert(
            "a@x.com".to_string(),
            vec![
                ("uid-1".to_string(), message_with_attachment("one.txt")),
                ("uid-2".to_string(), message_with_attachment("two.txt")),
            ],
        );
        let server = Arc::new(server);

        let poller = Poller::new(
            config(&["a"], &dir.path().join("attach"), &dir.path().join("state")),
            MockConnector(Arc::clone(&server)),
        );

        poller.run_once().await;
        assert_eq!(server.retrieved.lock().unwrap().len(), 2);

        poller.run_once().await;
        // Idempotent: nothing new on the server, nothing re-fetched.
        assert_eq!(server.retrieved.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn only_delta_is_fetched_on_later_passes() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MockServer::default();
        server.mailboxes.insert(
            "a@x.com".to_string(),
            vec![("uid-1".to_string(), message_with_attachment("one.txt"))],
        );
        let server = Arc::new(server);

        let poller_config =
            config(&["a"], &dir.path().join("attach"), &dir.path().join("state"));

        let poller = Poller::new(poller_config.clone(), MockConnector(Arc::clone(&server)));
        poller.run_once().await;

        // New mail arrives; the old message keeps its uid but renumbers.
        let mut server2 = MockServer::default();
        server2.mailboxes.insert(
            "a@x.com".to_string(),
            vec![
                ("uid-1".to_string(), message_with_attachment("one.txt")),
                ("uid-2".to_string(), message_with_attachment("two.txt")),
            ],
        );
        let server2 = Arc::new(server2);
        let poller = Poller::new(poller_config, MockConnector(Arc::clone(&server2)));
        poller.run_once().await;

        let retrieved = server2.retrieved.lock().unwrap();
        assert_eq!(*retrieved, vec![("a@x.com".to_string(), 2)]);
    }

    #[tokio::test]
    async fn first_run_limit_caps_fetch_volume() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MockServer::default();
        server.mailboxes.insert(
            "a@x.com".to_string(),
            (1..=5)
                .map(|i| (format!("uid-{i}"), message_with_attachment("f.txt")))
                .collect(),
        );
        let server = Arc::new(server);

        let mut poller_config =
            config(&["a"], &dir.path().join("attach"), &dir.path().join("state"));
        poller_config.first_run_limit = Some(3);

        let poller = Poller::new(poller_config, MockConnector(Arc::clone(&server)));
        poller.run_once().await;

        assert_eq!(server.retrieved.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failing_account_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MockServer::default();
        for name in ["a", "b", "c"] {
            server.mailboxes.insert(
                format!("{name}@x.com"),
                vec![("uid-1".to_string(), message_with_attachment("f.txt"))],
            );
        }
        server.fail_connect.insert("b@x.com".to_string());
        let server = Arc::new(server);

        let state_dir = dir.path().join("state");
        let poller = Poller::new(
            config(&["a", "b", "c"], &dir.path().join("attach"), &state_dir),
            MockConnector(Arc::clone(&server)),
        );
        poller.run_once().await;

        // A (before) and C (after) completed and persisted; B did not.
        assert!(state_dir.join("a.json").exists());
        assert!(!state_dir.join("b.json").exists());
        assert!(state_dir.join("c.json").exists());

        let retrieved = server.retrieved.lock().unwrap();
        let addresses: Vec<&str> = retrieved.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(addresses, vec!["a@x.com", "c@x.com"]);
    }

    #[tokio::test]
    async fn failed_account_state_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let state_dir = dir.path().join("state");

        // First pass succeeds and persists a baseline.
        let mut server = MockServer::default();
        server.mailboxes.insert(
            "a@x.com".to_string(),
            vec![("uid-1".to_string(), message_with_attachment("f.txt"))],
        );
        let server = Arc::new(server);
        let poller_config = config(&["a"], &dir.path().join("attach"), &state_dir);
        Poller::new(poller_config.clone(), MockConnector(server))
            .run_once()
            .await;

        let baseline = std::fs::read_to_string(state_dir.join("a.json")).unwrap();

        // Second pass cannot connect; the baseline must survive unchanged.
        let mut server = MockServer::default();
        server.fail_connect.insert("a@x.com".to_string());
        Poller::new(poller_config, MockConnector(Arc::new(server)))
            .run_once()
            .await;

        let after = std::fs::read_to_string(state_dir.join("a.json")).unwrap();
        assert_eq!(baseline, after);
    }

    #[tokio::test]
    async fn one_pass_persists_independent_state_per_account() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MockServer::default();
        server.mailboxes.insert(
            "a@x.com".to_string(),
            vec![("uid-a".to_string(), message_with_attachment("a.txt"))],
        );
        server.mailboxes.insert(
            "b@x.com".to_string(),
            vec![("uid-b".to_string(), message_with_attachment("b.txt"))],
        );
        let server = Arc::new(server);

        let state_dir = dir.path().join("state");
        let poller = Poller::new(
            config(&["a", "b"], &dir.path().join("attach"), &state_dir),
            MockConnector(Arc::clone(&server)),
        );
        poller.run_once().await;

        let a: crate::state::ListingSnapshot =
            serde_json::from_str(&std::fs::read_to_string(state_dir.join("a.json")).unwrap())
                .unwrap();
        let b: crate::state::ListingSnapshot =
            serde_json::from_str(&std::fs::read_to_string(state_dir.join("b.json")).unwrap())
                .unwrap();
        assert_eq!(a.entries[0].uid, "uid-a");
        assert_eq!(b.entries[0].uid, "uid-b");
    }

    #[tokio::test]
    async fn run_terminates_after_one_pass_without_continuous() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MockServer::default();
        server.mailboxes.insert(
            "a@x.com".to_string(),
            vec![("uid-1".to_string(), message_with_attachment("f.txt"))],
        );
        let server = Arc::new(server);

        let poller = Poller::new(
            config(&["a"], &dir.path().join("attach"), &dir.path().join("state")),
            MockConnector(Arc::clone(&server)),
        );

        // Completes rather than looping forever.
        poller.run().await;
        assert_eq!(server.retrieved.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn continuous_mode_repeats_passes_and_keeps_state_per_account() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MockServer::default();
        server.mailboxes.insert(
            "a@x.com".to_string(),
            vec![("uid-a".to_string(), message_with_attachment("a.txt"))],
        );
        server.mailboxes.insert(
            "b@x.com".to_string(),
            vec![("uid-b".to_string(), message_with_attachment("b.txt"))],
        );
        let server = Arc::new(server);

        let state_dir = dir.path().join("state");
        let mut poller_config = config(&["a", "b"], &dir.path().join("attach"), &state_dir);
        poller_config.continuous = true;
        poller_config.interval = 1;

        let poller = Poller::new(poller_config, MockConnector(Arc::clone(&server)));

        // Continuous mode never returns on its own; let a few virtual
        // ticks elapse, cut it off, and inspect what the passes left.
        let result = tokio::time::timeout(Duration::from_secs(5), poller.run()).await;
        assert!(result.is_err());

        assert!(state_dir.join("a.json").exists());
        assert!(state_dir.join("b.json").exists());

        // Multiple full passes ran (two accounts per pass)...
        assert!(*server.connects.lock().unwrap() >= 4);
        // ...but each message was fetched exactly once.
        assert_eq!(server.retrieved.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn attachments_land_under_account_and_sender() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = MockServer::default();
        server.mailboxes.insert(
            "work@x.com".to_string(),
            vec![("uid-1".to_string(), message_with_attachment("report.txt"))],
        );
        let server = Arc::new(server);

        let attach_dir = dir.path().join("attach");
        let poller = Poller::new(
            config(&["work"], &attach_dir, &dir.path().join("state")),
            MockConnector(Arc::clone(&server)),
        );
        poller.run_once().await;

        let expected = attach_dir
            .join("work")
            .join("Alice <a@x.com>")
            .join("report.txt");
        assert!(expected.exists());
    }
}
