//! Delta detection between mailbox listings.
//!
//! Decides which messages to fetch this cycle. The only stable key is the
//! server-assigned unique id: message numbers shift whenever a message
//! leaves the mailbox, so they are never compared across sessions.

use std::collections::HashSet;

use popgrab_pop3::{MailboxListing, MessageNumber};

use crate::state::ListingSnapshot;

/// Computes the messages to fetch, in current-listing order.
///
/// With no previous snapshot (first run), this is the leading
/// `first_run_limit` messages of the listing, or all of them when no limit
/// is configured. Otherwise it is exactly the entries whose unique id does
/// not appear in the snapshot; each entry is judged independently by set
/// membership, so snapshot ordering and renumbering are irrelevant.
#[must_use]
pub fn new_messages(
    current: &MailboxListing,
    previous: Option<&ListingSnapshot>,
    first_run_limit: Option<usize>,
) -> Vec<MessageNumber> {
    let Some(snapshot) = previous else {
        let count = first_run_limit.map_or(current.len(), |limit| current.len().min(limit));
        return current.iter().take(count).map(|e| e.number).collect();
    };

    let seen: HashSet<&str> = snapshot
        .entries
        .iter()
        .map(|record| record.uid.as_str())
        .collect();

    current
        .iter()
        .filter(|entry| !seen.contains(entry.uid.as_str()))
        .map(|entry| entry.number)
        .collect()
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
    use crate::state::{ListingRecord, SNAPSHOT_VERSION};
    use popgrab_pop3::{ListingEntry, UniqueId};
    use proptest::prelude::*;

    fn listing(entries: &[(u32, &str)]) -> MailboxListing {
        MailboxListing::new(
            entries
                .iter()
                .map(|(n, uid)| ListingEntry {
                    number: MessageNumber::new(*n).unwrap(),
                    uid: UniqueId::new(*uid),
                })
                .collect(),
        )
    }

    fn snapshot(uids: &[(u32, &str)]) -> ListingSnapshot {
        ListingSnapshot {
            version: SNAPSHOT_VERSION,
            entries: uids
                .iter()
                .map(|(n, uid)| ListingRecord {
                    seq_hint: *n,
                    uid: (*uid).to_string(),
                })
                .collect(),
        }
    }

    fn numbers(messages: &[MessageNumber]) -> Vec<u32> {
        messages.iter().map(|m| m.get()).collect()
    }

    #[test]
    fn first_run_without_limit_fetches_everything() {
        let current = listing(&[(1, "a"), (2, "b"), (3, "c")]);
        assert_eq!(numbers(&new_messages(&current, None, None)), vec![1, 2, 3]);
    }

    #[test]
    fn first_run_limit_caps_backfill() {
        let current = listing(&[(1, "a"), (2, "b"), (3, "c"), (4, "d")]);
        assert_eq!(numbers(&new_messages(&current, None, Some(2))), vec![1, 2]);
    }

    #[test]
    fn first_run_limit_larger_than_mailbox() {
        let current = listing(&[(1, "a")]);
        assert_eq!(numbers(&new_messages(&current, None, Some(10))), vec![1]);
    }

    #[test]
    fn one_new_message_at_the_end() {
        // Listing [1,2,3] against previous state [1,2] with the same unique
        // ids yields exactly {3}.
        let current = listing(&[(1, "a"), (2, "b"), (3, "c")]);
        let previous = snapshot(&[(1, "a"), (2, "b")]);
        assert_eq!(
            numbers(&new_messages(&current, Some(&previous), None)),
            vec![3]
        );
    }

    #[test]
    fn no_new_messages_yields_empty_set() {
        let current = listing(&[(1, "a"), (2, "b")]);
        let previous = snapshot(&[(1, "a"), (2, "b")]);
        assert!(new_messages(&current, Some(&previous), None).is_empty());
    }

    #[test]
    fn renumbering_after_deletion_does_not_refetch() {
        // "b" and "c" shifted down after "a" was deleted; their unique ids
        // are still known, only "d" is new.
        let current = listing(&[(1, "b"), (2, "c"), (3, "d")]);
        let previous = snapshot(&[(1, "a"), (2, "b"), (3, "c")]);
        assert_eq!(
            numbers(&new_messages(&current, Some(&previous), None)),
            vec![3]
        );
    }

    #[test]
    fn snapshot_order_is_irrelevant() {
        let current = listing(&[(1, "a"), (2, "b"), (3, "c")]);
        let previous = snapshot(&[(3, "c"), (1, "a")]);
        assert_eq!(
            numbers(&new_messages(&current, Some(&previous), None)),
            vec![2]
        );
    }

    #[test]
    fn interleaved_new_messages_keep_listing_order() {
        let current = listing(&[(1, "new1"), (2, "old"), (3, "new2")]);
        let previous = snapshot(&[(1, "old")]);
        assert_eq!(
            numbers(&new_messages(&current, Some(&previous), None)),
            vec![1, 3]
        );
    }

    #[test]
    fn limit_is_ignored_when_previous_state_exists() {
        let current = listing(&[(1, "a"), (2, "b"), (3, "c")]);
        let previous = snapshot(&[]);
        assert_eq!(
            numbers(&new_messages(&current, Some(&previous), Some(1))),
            vec![1, 2, 3]
        );
    }

    proptest! {
        /// The fetch set is exactly the unique ids present in the current
        /// listing but absent from the previous one, independent of
        /// numbering.
        #[test]
        fn fetch_set_is_uid_set_difference(
            current_uids in proptest::collection::vec("[a-z]{1,8}", 0..20),
            previous_uids in proptest::collection::hash_set("[a-z]{1,8}", 0..20),
        ) {
            let current = MailboxListing::new(
                current_uids
                    .iter()
                    .enumerate()
                    .map(|(i, uid)| ListingEntry {
                        number: MessageNumber::new(u32::try_from(i).unwrap() + 1).unwrap(),
                        uid: UniqueId::new(uid.clone()),
                    })
                    .collect(),
            );
            let previous = ListingSnapshot {
                version: SNAPSHOT_VERSION,
                entries: previous_uids
                    .iter()
                    .enumerate()
                    .map(|(i, uid)| ListingRecord {
                        seq_hint: u32::try_from(i).unwrap() + 1,
                        uid: uid.clone(),
                    })
                    .collect(),
            };

            let fetched = new_messages(&current, Some(&previous), None);

            let expected: Vec<u32> = current_uids
                .iter()
                .enumerate()
                .filter(|(_, uid)| !previous_uids.contains(*uid))
                .map(|(i, _)| u32::try_from(i).unwrap() + 1)
                .collect();

            prop_assert_eq!(numbers(&fetched), expected);
        }
    }
}
