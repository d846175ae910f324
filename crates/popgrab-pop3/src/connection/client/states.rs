//! Type-state markers for POP3 client connection states.
//!
//! These types are used with the type-state pattern to enforce valid POP3
//! state transitions at compile time.

/// Marker type for the not-authenticated state (RFC 1939 AUTHORIZATION).
///
/// In this state, only the USER/PASS exchange is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Marker type for the authenticated state (RFC 1939 TRANSACTION).
///
/// In this state, mailbox operations (STAT, LIST, UIDL, RETR) are valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

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

    fn _assert_send<T: Send>() {}
    fn _assert_sync<T: Sync>() {}

    #[test]
    fn test_state_markers_are_send_sync() {
        _assert_send::<NotAuthenticated>();
        _assert_sync::<NotAuthenticated>();
        _assert_send::<Authenticated>();
        _assert_sync::<Authenticated>();
    }
}
