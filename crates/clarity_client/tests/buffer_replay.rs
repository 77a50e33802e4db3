//! Property: whatever is submitted before the channel opens reaches the
//! channel exactly once, in submission order, and every turn stays tracked.

mod common;

use clarity_client::{ConnectionState, Role};
use common::{open, session, RecordingConnector};
use proptest::prelude::*;

proptest! {
    #[test]
    fn submissions_before_open_replay_in_order(
        entries in prop::collection::vec("[a-z ]{0,12}", 0..16),
    ) {
        let connector = RecordingConnector::default();
        let mut session = session(&connector);
        if entries.is_empty() {
            session.connect().unwrap();
        }

        for entry in &entries {
            prop_assert!(session.submit(entry).accepted());
        }
        prop_assert!(connector.sent().is_empty());
        prop_assert_eq!(session.connection().buffered(), entries.len());

        open(&mut session, &connector, 0);

        prop_assert_eq!(session.connection().state(), ConnectionState::Open);
        prop_assert_eq!(connector.sent_entries(), entries.clone());
        prop_assert_eq!(session.connection().buffered(), 0);
        prop_assert_eq!(session.pending().len(), entries.len());
        prop_assert_eq!(session.log().len(), entries.len() * 2);

        // Log pairs each user turn with its placeholder, in order.
        let placeholders: Vec<_> = session
            .log()
            .entries()
            .chunks(2)
            .map(|pair| {
                assert_eq!(pair[0].role, Role::User);
                assert_eq!(pair[1].role, Role::Assistant);
                pair[1].id
            })
            .collect();
        prop_assert_eq!(session.pending().iter().collect::<Vec<_>>(), placeholders);
    }
}
