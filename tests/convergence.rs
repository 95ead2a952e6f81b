//! Property tests for convergence under adversarial interleavings.
//!
//! The three streams are only ordered internally; the engine may see any
//! merge of them. For a fixed per-stream history, every interleaving must
//! converge to the same visible model, and every intermediate snapshot must
//! satisfy the referential invariants.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use roomstate::{
    Cursor, CursorEvent, MembershipEvent, Message, MessageEvent, MessageId, RoomChange,
    RoomEngine, RoomEvent, RoomId, RoomSnapshot, UserId,
};

fn lobby() -> RoomId {
    RoomId::new("lobby")
}

/// Deterministic content per id so redeliveries are always identical and
/// never trip the duplicate-content check.
fn message(id: u64) -> Message {
    Message::new(id, "sender", format!("message {id}"))
}

fn arb_user() -> impl Strategy<Value = UserId> {
    prop::sample::select(vec!["alice", "bob", "carol", "derek", "ed"]).prop_map(UserId::new)
}

fn arb_message_id() -> impl Strategy<Value = u64> {
    1u64..=8
}

fn arb_membership_event() -> impl Strategy<Value = MembershipEvent> {
    prop_oneof![
        prop::collection::btree_set(arb_user(), 0..4).prop_map(|users| {
            MembershipEvent::InitialState {
                room: lobby(),
                users,
            }
        }),
        arb_user().prop_map(|user| MembershipEvent::MemberAdded {
            room: lobby(),
            user,
        }),
        arb_user().prop_map(|user| MembershipEvent::MemberRemoved {
            room: lobby(),
            user,
        }),
    ]
}

fn arb_message_event() -> impl Strategy<Value = MessageEvent> {
    prop_oneof![
        prop::collection::btree_set(arb_message_id(), 0..6).prop_map(|ids| {
            MessageEvent::InitialState {
                messages: ids.into_iter().map(message).collect(),
            }
        }),
        arb_message_id().prop_map(|id| MessageEvent::New { message: message(id) }),
    ]
}

fn arb_cursor_event() -> impl Strategy<Value = CursorEvent> {
    prop_oneof![
        prop::collection::btree_map(arb_user(), arb_message_id(), 0..4).prop_map(|cursors| {
            CursorEvent::InitialState {
                cursors: cursors
                    .into_iter()
                    .map(|(user, id)| Cursor {
                        room: lobby(),
                        user,
                        message: MessageId(id),
                    })
                    .collect(),
            }
        }),
        (arb_user(), arb_message_id()).prop_map(|(user, id)| CursorEvent::Update {
            cursor: Cursor {
                room: lobby(),
                user,
                message: MessageId(id),
            },
        }),
    ]
}

type StreamsAndOrder = (
    Vec<MembershipEvent>,
    Vec<MessageEvent>,
    Vec<CursorEvent>,
    Vec<usize>,
);

/// Three per-stream histories plus a shuffled merge order that respects
/// each stream's internal order.
fn arb_streams_and_order() -> impl Strategy<Value = StreamsAndOrder> {
    (
        prop::collection::vec(arb_membership_event(), 0..5),
        prop::collection::vec(arb_message_event(), 0..5),
        prop::collection::vec(arb_cursor_event(), 0..5),
    )
        .prop_flat_map(|(memberships, messages, cursors)| {
            let mut tags = Vec::new();
            tags.extend(std::iter::repeat(0).take(memberships.len()));
            tags.extend(std::iter::repeat(1).take(messages.len()));
            tags.extend(std::iter::repeat(2).take(cursors.len()));
            (
                Just(memberships),
                Just(messages),
                Just(cursors),
                Just(tags).prop_shuffle(),
            )
        })
}

fn assert_invariants(snapshot: &RoomSnapshot) -> Result<(), TestCaseError> {
    for (user, id) in &snapshot.cursors {
        prop_assert!(
            snapshot.members.contains(user),
            "visible cursor for non-member {user}"
        );
        prop_assert!(
            snapshot.messages.iter().any(|m| m.id == *id),
            "visible cursor for unknown message {id}"
        );
    }
    Ok(())
}

fn category(change: &RoomChange) -> u8 {
    match change {
        RoomChange::MemberAppeared { .. } | RoomChange::MemberDisappeared { .. } => 0,
        RoomChange::MessageAppeared { .. } => 1,
        RoomChange::CursorAppeared { .. }
        | RoomChange::CursorChanged { .. }
        | RoomChange::CursorDisappeared { .. } => 2,
    }
}

proptest! {
    #[test]
    fn test_interleavings_converge((memberships, messages, cursors, order) in arb_streams_and_order()) {
        // Reference run: one stream after another.
        let mut reference = RoomEngine::new(lobby());
        for event in memberships.iter().cloned() {
            reference.apply(RoomEvent::Memberships(event)).unwrap();
        }
        for event in messages.iter().cloned() {
            reference.apply(RoomEvent::Messages(event)).unwrap();
        }
        for event in cursors.iter().cloned() {
            reference.apply(RoomEvent::Cursors(event)).unwrap();
        }

        // Interleaved run per the shuffled merge order.
        let mut engine = RoomEngine::new(lobby());
        let mut memberships = memberships.into_iter();
        let mut messages = messages.into_iter();
        let mut cursors = cursors.into_iter();

        for tag in order {
            let event = match tag {
                0 => RoomEvent::Memberships(memberships.next().unwrap()),
                1 => RoomEvent::Messages(messages.next().unwrap()),
                _ => RoomEvent::Cursors(cursors.next().unwrap()),
            };
            let batch = engine.apply(event).unwrap();

            // Batches are ordered memberships, messages, cursors.
            let categories: Vec<u8> = batch.changes.iter().map(category).collect();
            prop_assert!(categories.windows(2).all(|w| w[0] <= w[1]));

            // Every intermediate snapshot is self-consistent.
            assert_invariants(&engine.snapshot())?;
        }

        prop_assert_eq!(engine.snapshot(), reference.snapshot());
    }

    #[test]
    fn test_resnapshotting_current_state_is_silent((memberships, messages, cursors, order) in arb_streams_and_order()) {
        let mut engine = RoomEngine::new(lobby());
        let mut memberships = memberships.into_iter();
        let mut messages = messages.into_iter();
        let mut cursors = cursors.into_iter();
        for tag in order {
            let event = match tag {
                0 => RoomEvent::Memberships(memberships.next().unwrap()),
                1 => RoomEvent::Messages(messages.next().unwrap()),
                _ => RoomEvent::Cursors(cursors.next().unwrap()),
            };
            engine.apply(event).unwrap();
        }

        // A backend resync that restates exactly what the engine already
        // knows must not notify anyone.
        let snapshot = engine.snapshot();
        let batch = engine
            .apply(RoomEvent::Memberships(MembershipEvent::InitialState {
                room: lobby(),
                users: snapshot.members.clone(),
            }))
            .unwrap();
        prop_assert!(batch.is_empty());

        let batch = engine
            .apply(RoomEvent::Messages(MessageEvent::InitialState {
                messages: snapshot.messages.clone(),
            }))
            .unwrap();
        prop_assert!(batch.is_empty());

        prop_assert_eq!(engine.snapshot(), snapshot);
    }
}
