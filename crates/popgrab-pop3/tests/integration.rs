//! Integration tests for the POP3 client.
//!
//! These tests use a mock stream to simulate POP3 server responses
//! without requiring a real server connection.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use popgrab_pop3::{Client, Error, MessageNumber};

/// Mock stream that returns predefined responses.
struct MockStream {
    /// Responses to return (in order).
    responses: Cursor<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Vec<u8>,
}

impl MockStream {
    fn new(responses: &[u8]) -> Self {
        Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Vec::new(),
        }
    }

    fn sent_data(&self) -> &[u8] {
        &self.sent
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let data = self.responses.get_ref();
        let pos = self.responses.position() as usize;

        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn greeting_is_read_on_connect() {
    let mock = MockStream::new(b"+OK POP3 server ready <1896.697170952@dbc.mtview.ca.us>\r\n");
    let client = Client::from_stream(mock).await.unwrap();

    assert!(client.greeting().starts_with("POP3 server ready"));
}

#[tokio::test]
async fn refused_greeting_is_an_error() {
    let mock = MockStream::new(b"-ERR maildrop busy\r\n");
    let result = Client::from_stream(mock).await;

    assert!(matches!(result, Err(Error::Protocol(_))));
}

#[tokio::test]
async fn login_succeeds_on_two_oks() {
    let mock = MockStream::new(b"+OK ready\r\n+OK user accepted\r\n+OK maildrop locked\r\n");
    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("alice@example.com", "hunter2").await.unwrap();

    assert_eq!(client.greeting(), "ready");
}

#[tokio::test]
async fn login_rejected_password_maps_to_auth_error() {
    let mock = MockStream::new(b"+OK ready\r\n+OK send PASS\r\n-ERR invalid password\r\n");
    let client = Client::from_stream(mock).await.unwrap();
    let result = client.login("alice@example.com", "wrong").await;

    match result {
        Err(Error::Auth(text)) => assert_eq!(text, "invalid password"),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn login_rejected_user_maps_to_auth_error() {
    let mock = MockStream::new(b"+OK ready\r\n-ERR no such mailbox\r\n");
    let client = Client::from_stream(mock).await.unwrap();
    let result = client.login("nobody@example.com", "pw").await;

    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn stat_parses_count_and_octets() {
    let mock = MockStream::new(b"+OK ready\r\n+OK\r\n+OK\r\n+OK 2 320\r\n");
    let client = Client::from_stream(mock).await.unwrap();
    let mut client = client.login("a", "b").await.unwrap();

    let stat = client.stat().await.unwrap();
    assert_eq!(stat.count, 2);
    assert_eq!(stat.octets, 320);
}

#[tokio::test]
async fn uidl_returns_listing_in_server_order() {
    let mock = MockStream::new(
        b"+OK ready\r\n+OK\r\n+OK\r\n+OK\r\n1 whqtswO00WBw418f9t5JxYwZ\r\n2 QhdPYR:00WBw1Ph7x7\r\n.\r\n",
    );
    let client = Client::from_stream(mock).await.unwrap();
    let mut client = client.login("a", "b").await.unwrap();

    let listing = client.uidl().await.unwrap();
    assert_eq!(listing.len(), 2);
    let entries = listing.entries();
    assert_eq!(entries[0].number.get(), 1);
    assert_eq!(entries[0].uid.as_str(), "whqtswO00WBw418f9t5JxYwZ");
    assert_eq!(entries[1].number.get(), 2);
    assert_eq!(entries[1].uid.as_str(), "QhdPYR:00WBw1Ph7x7");
}

#[tokio::test]
async fn list_returns_sizes() {
    let mock = MockStream::new(b"+OK ready\r\n+OK\r\n+OK\r\n+OK 2 messages\r\n1 120\r\n2 200\r\n.\r\n");
    let client = Client::from_stream(mock).await.unwrap();
    let mut client = client.login("a", "b").await.unwrap();

    let sizes = client.list().await.unwrap();
    assert_eq!(sizes.len(), 2);
    assert_eq!(sizes[0].1, 120);
    assert_eq!(sizes[1].1, 200);
}

#[tokio::test]
async fn retr_returns_unstuffed_lines() {
    let mock = MockStream::new(
        b"+OK ready\r\n+OK\r\n+OK\r\n+OK 120 octets\r\nSubject: hi\r\n\r\n..leading dot\r\nbody\r\n.\r\n",
    );
    let client = Client::from_stream(mock).await.unwrap();
    let mut client = client.login("a", "b").await.unwrap();

    let lines = client
        .retr(MessageNumber::new(1).unwrap())
        .await
        .unwrap();
    assert_eq!(
        lines,
        vec![
            b"Subject: hi".to_vec(),
            b"".to_vec(),
            b".leading dot".to_vec(),
            b"body".to_vec(),
        ]
    );
}

#[tokio::test]
async fn retr_unknown_message_is_server_error() {
    let mock = MockStream::new(b"+OK ready\r\n+OK\r\n+OK\r\n-ERR no such message\r\n");
    let client = Client::from_stream(mock).await.unwrap();
    let mut client = client.login("a", "b").await.unwrap();

    let result = client.retr(MessageNumber::new(99).unwrap()).await;
    assert!(matches!(result, Err(Error::Server(_))));
}

#[tokio::test]
async fn quit_consumes_the_client() {
    let mock = MockStream::new(b"+OK ready\r\n+OK\r\n+OK\r\n+OK bye\r\n");
    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("a", "b").await.unwrap();

    client.quit().await.unwrap();
}

#[tokio::test]
async fn quit_err_is_propagated() {
    let mock = MockStream::new(b"+OK ready\r\n+OK\r\n+OK\r\n-ERR some deleted messages not removed\r\n");
    let client = Client::from_stream(mock).await.unwrap();
    let client = client.login("a", "b").await.unwrap();

    assert!(client.quit().await.is_err());
}

#[tokio::test]
async fn commands_are_serialized_with_crlf() {
    // Sanity check the sent side of the exchange at the stream level.
    let mut mock = MockStream::new(b"+OK ready\r\n+OK\r\n+OK\r\n");
    // Drive a login manually so we can keep hold of the mock afterwards.
    {
        let client = Client::from_stream(&mut mock).await.unwrap();
        let _ = client.login("alice", "pw").await.unwrap();
    }
    assert_eq!(mock.sent_data(), b"USER alice\r\nPASS pw\r\n");
}
