use crate::bridge::{
    BridgeChannel, BridgePort, EarlyQueue, InboundMessage, OutboundMessage, PortId,
    UNCORRELATED_ID,
};
use crate::error::bridge::BridgeError;
use crate::tests::support::{CallbackLog, RecordingPort};

use std::sync::Arc;
use std::thread;

use serde_json::json;

fn result_for(id: u64) -> serde_json::Value {
    json!({ "kind": "result", "id": id, "ok": true })
}

// ============================================================================
// Early queue
// ============================================================================

/// **VALUE**: Verifies the early queue evicts the oldest entry when full.
///
/// **WHY THIS MATTERS**: Bootstrap traffic can be bursty before the page loads. The
/// newest commands (e.g. the final `deviceready`) matter more than stale ones.
///
/// **BUG THIS CATCHES**: Would catch a reject-newest implementation or an unbounded queue.
#[test]
fn given_full_early_queue_when_pushing_then_oldest_is_evicted() {
    // GIVEN: A queue of capacity 2 holding "a" and "b"
    let mut queue = EarlyQueue::new(2);
    assert_eq!(queue.push("a".to_string()), None);
    assert_eq!(queue.push("b".to_string()), None);

    // WHEN: Pushing a third entry
    let evicted = queue.push("c".to_string());

    // THEN: "a" was evicted and order is preserved
    assert_eq!(evicted.as_deref(), Some("a"));
    assert_eq!(queue.drain(), vec!["b".to_string(), "c".to_string()]);
    assert!(queue.is_empty());
}

#[test]
fn given_zero_capacity_when_creating_queue_then_clamped_to_one() {
    let mut queue = EarlyQueue::new(0);
    queue.push("a".to_string());
    queue.push("b".to_string());

    assert_eq!(queue.capacity(), 1);
    assert_eq!(queue.drain(), vec!["b".to_string()]);
}

// ============================================================================
// Message schema
// ============================================================================

/// **VALUE**: Pins the outbound wire shape the content script depends on.
///
/// **BUG THIS CATCHES**: Would catch a serde rename that changes `kind` or its casing.
#[test]
fn given_execute_message_when_encoded_then_matches_wire_schema() {
    let message = OutboundMessage::execute(7, "console.log(1)");

    let value = message.to_json().unwrap();

    assert_eq!(
        value,
        json!({ "kind": "execute", "id": 7, "code": "console.log(1)" })
    );
}

#[test]
fn given_inbound_values_when_parsed_then_known_kinds_decode_and_unknown_are_skipped() {
    assert_eq!(
        InboundMessage::parse(&json!({ "kind": "ready" })).unwrap(),
        Some(InboundMessage::Ready)
    );
    assert_eq!(
        InboundMessage::parse(&json!({ "kind": "result", "id": 3, "ok": false, "error": "boom" }))
            .unwrap(),
        Some(InboundMessage::Result {
            id: 3,
            ok: Some(false),
            error: Some("boom".to_string()),
        })
    );
    assert_eq!(
        InboundMessage::parse(&json!({ "kind": "log", "text": "hi" })).unwrap(),
        None
    );
}

#[test]
fn given_value_without_kind_when_parsed_then_decode_error() {
    let result = InboundMessage::parse(&json!({ "id": 1 }));

    assert!(matches!(result, Err(BridgeError::Decode { .. })));
}

#[test]
fn given_result_without_id_when_parsed_then_decode_error() {
    let result = InboundMessage::parse(&json!({ "kind": "result" }));

    assert!(matches!(result, Err(BridgeError::Decode { .. })));
}

// ============================================================================
// Channel: send before attach
// ============================================================================

/// **VALUE**: Sending before any port exists must not block and must answer immediately.
///
/// **WHY THIS MATTERS**: The host issues bootstrap commands while the page is still
/// loading; a caller waiting for a result here would deadlock startup.
///
/// **BUG THIS CATCHES**: Would catch a send that parks the callback in the correlation
/// map (breaking the disjointness of queue and map) or never calls it.
#[test]
fn given_no_port_when_sending_then_queued_and_callback_fires_empty() {
    // GIVEN: A channel with no port
    let channel = BridgeChannel::default();
    let log = CallbackLog::new();

    // WHEN: Sending a command
    channel.send("boot()", log.callback(1));

    // THEN: Callback fired with no value, command is queued, nothing is pending
    assert_eq!(log.values(), vec![None]);
    assert_eq!(channel.queued_len(), 1);
    assert_eq!(channel.pending_count(), 0);
}

/// **VALUE**: 300 early commands flush as exactly the last 256, in order, with id 0.
///
/// **WHY THIS MATTERS**: This is the documented overflow policy of the early queue.
///
/// **BUG THIS CATCHES**: Would catch reject-newest eviction, reordering on flush, or
/// flushed commands being given correlated ids.
#[test]
fn given_300_early_commands_when_port_attaches_then_last_256_flush_in_order() {
    // GIVEN: 300 commands sent before any port attaches
    let channel = BridgeChannel::default();
    for index in 0..300 {
        channel.send(format!("cmd-{index}"), |_| {});
    }

    // WHEN: A port attaches
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());

    // THEN: Exactly commands 44..300 were delivered, in order, uncorrelated
    let expected: Vec<String> = (44..300).map(|index| format!("cmd-{index}")).collect();
    assert_eq!(port.sent_codes(), expected);
    assert!(port.sent_ids().iter().all(|id| *id == UNCORRELATED_ID));
    assert_eq!(channel.queued_len(), 0);
    assert_eq!(channel.pending_count(), 0);
}

#[test]
fn given_configured_capacity_when_overflowing_then_capacity_is_respected() {
    let channel = BridgeChannel::new(3);
    for index in 0..5 {
        channel.send(format!("cmd-{index}"), |_| {});
    }

    assert_eq!(channel.queued_len(), 3);

    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());

    assert_eq!(port.sent_codes(), vec!["cmd-2", "cmd-3", "cmd-4"]);
}

/// **VALUE**: A `ready` after the attach flush does not deliver anything twice.
///
/// **WHY THIS MATTERS**: The page reports ready shortly after attach; both trigger a
/// flush, and no command may reach the page twice.
///
/// **BUG THIS CATCHES**: Would catch a flush that copies instead of draining the queue.
#[test]
fn given_queue_flushed_on_attach_when_ready_received_then_nothing_redelivered() {
    // GIVEN: A command queued before attach, flushed when the port attaches
    let channel = BridgeChannel::default();
    channel.send("early()", |_| {});
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());

    // WHEN: A correlated command is sent and the page reports ready
    channel.send("after()", |_| {});
    channel.on_message(&port.id(), &json!({ "kind": "ready" }));

    // THEN: Each command reached the page exactly once
    assert_eq!(port.sent_codes(), vec!["early()", "after()"]);
    assert_eq!(port.sent_ids(), vec![UNCORRELATED_ID, 1]);
}

#[test]
fn given_failing_port_when_flushing_then_commands_are_dropped_not_requeued() {
    let channel = BridgeChannel::default();
    channel.send("early()", |_| {});
    let port = RecordingPort::new();
    port.set_failing(true);

    channel.on_channel_attached(port.clone());

    assert!(port.sent().is_empty());
    assert_eq!(channel.queued_len(), 0);
}

#[test]
fn given_attached_port_when_ready_arrives_with_empty_queue_then_nothing_sent() {
    let channel = BridgeChannel::default();
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());

    channel.on_message(&port.id(), &json!({ "kind": "ready" }));

    assert!(port.sent().is_empty());
    assert_eq!(channel.flush_early_queue(), 0);
}

// ============================================================================
// Channel: correlation
// ============================================================================

/// **VALUE**: Concurrent sends get distinct ids and results reach only their own callback.
///
/// **WHY THIS MATTERS**: The correlation map is shared between sender threads and the
/// thread delivering page messages.
///
/// **BUG THIS CATCHES**: Would catch a non-atomic id counter or a result lookup that
/// fires the wrong (or every) callback.
#[test]
fn given_concurrent_sends_when_first_result_arrives_then_only_first_callback_fires() {
    // GIVEN: An attached port
    let channel = Arc::new(BridgeChannel::default());
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());
    let log = CallbackLog::new();

    // WHEN: Two threads send at the same time
    let handles: Vec<_> = (0..2)
        .map(|tag| {
            let channel = Arc::clone(&channel);
            let callback = log.callback(tag);
            thread::spawn(move || channel.send(format!("cmd-{tag}"), callback))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // THEN: The two ids are distinct
    let ids = port.sent_ids();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(channel.pending_count(), 2);

    // WHEN: The result for the first transmitted command arrives
    let first_tag = if port.sent_codes()[0] == "cmd-0" { 0 } else { 1 };
    channel.on_message(&port.id(), &result_for(ids[0]));

    // THEN: Only that command's callback fired, with no value
    assert_eq!(log.tags(), vec![first_tag]);
    assert_eq!(log.values(), vec![None]);
    assert_eq!(channel.pending_count(), 1);
}

#[test]
fn given_attached_port_when_sending_then_ids_start_at_one_and_increase() {
    let channel = BridgeChannel::default();
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());

    for _ in 0..3 {
        channel.send("x", |_| {});
    }

    assert_eq!(port.sent_ids(), vec![1, 2, 3]);
}

/// **VALUE**: A result with an id that was never sent is ignored.
///
/// **BUG THIS CATCHES**: Would catch a panic on unknown ids or a lookup that removes
/// some other pending entry.
#[test]
fn given_pending_command_when_result_for_unknown_id_arrives_then_ignored() {
    // GIVEN: One pending command
    let channel = BridgeChannel::default();
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());
    let log = CallbackLog::new();
    channel.send("x", log.callback(1));

    // WHEN: A result for id 999 arrives
    channel.on_message(&port.id(), &result_for(999));

    // THEN: Nothing fired and the pending command is untouched
    assert!(log.tags().is_empty());
    assert_eq!(channel.pending_count(), 1);

    // AND: The real result still completes it
    channel.on_message(&port.id(), &result_for(1));
    assert_eq!(log.tags(), vec![1]);
}

#[test]
fn given_completed_command_when_duplicate_result_arrives_then_callback_not_repeated() {
    let channel = BridgeChannel::default();
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());
    let log = CallbackLog::new();
    channel.send("x", log.callback(1));

    channel.on_message(&port.id(), &result_for(1));
    channel.on_message(&port.id(), &result_for(1));

    assert_eq!(log.tags(), vec![1]);
}

#[test]
fn given_failed_result_when_delivered_then_callback_still_receives_none() {
    let channel = BridgeChannel::default();
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());
    let log = CallbackLog::new();
    channel.send("throw 1", log.callback(1));

    channel.on_message(
        &port.id(),
        &json!({ "kind": "result", "id": 1, "ok": false, "error": "Error: 1" }),
    );

    assert_eq!(log.values(), vec![None]);
}

/// **VALUE**: A failed transmission removes its own correlation entry.
///
/// **WHY THIS MATTERS**: Otherwise every failed send leaks a callback forever.
///
/// **BUG THIS CATCHES**: Would catch the entry being left behind or the callback never firing.
#[test]
fn given_failing_port_when_sending_then_entry_removed_and_callback_fires_empty() {
    // GIVEN: An attached port that fails every post
    let channel = BridgeChannel::default();
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());
    port.set_failing(true);
    let log = CallbackLog::new();

    // WHEN: Sending
    channel.send("x", log.callback(1));

    // THEN: Callback fired with None and nothing is pending
    assert_eq!(log.values(), vec![None]);
    assert_eq!(channel.pending_count(), 0);
    assert_eq!(channel.queued_len(), 0);
}

// ============================================================================
// Channel: detach and reconnect
// ============================================================================

/// **VALUE**: Pins the current "no sweep on detach" behavior.
///
/// **WHY THIS MATTERS**: Callers get at most one result, possibly none. A command whose
/// port detaches before its result arrives never hears back.
///
/// **BUG THIS CATCHES**: Would catch a change that silently starts failing pending
/// callbacks on detach, or that lets a stale port's late result through.
#[test]
fn given_detach_before_fourth_result_when_result_arrives_late_then_callback_never_fires() {
    // GIVEN: Three commands sent and acknowledged in order
    let channel = BridgeChannel::default();
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());
    let log = CallbackLog::new();
    for tag in 1..=3 {
        channel.send(format!("cmd-{tag}"), log.callback(tag));
    }
    for id in 1..=3 {
        channel.on_message(&port.id(), &result_for(id));
    }
    assert_eq!(log.tags(), vec![1, 2, 3]);

    // WHEN: A fourth command is sent and the port detaches before its result
    channel.send("cmd-4", log.callback(4));
    assert!(channel.on_channel_detached(&port.id()));
    channel.on_message(&port.id(), &result_for(4));

    // THEN: The fourth callback is never invoked and its entry is left in place
    assert_eq!(log.tags(), vec![1, 2, 3]);
    assert_eq!(channel.pending_count(), 1);
    assert!(!channel.is_attached());
}

/// **VALUE**: A detach from a superseded port does not clear the new one.
///
/// **BUG THIS CATCHES**: Would catch an unconditional `current = None` on detach, which
/// breaks the bridge after every history-clearing reload.
#[test]
fn given_reconnected_port_when_stale_detach_arrives_then_current_port_kept() {
    // GIVEN: Port A replaced by port B
    let channel = BridgeChannel::default();
    let first = RecordingPort::new();
    let second = RecordingPort::new();
    channel.on_channel_attached(first.clone());
    channel.on_channel_attached(second.clone());

    // WHEN: Port A's detach arrives late
    let cleared = channel.on_channel_detached(&first.id());

    // THEN: Port B is still current
    assert!(!cleared);
    assert_eq!(channel.current_port_id(), Some(second.id()));
}

#[test]
fn given_reconnected_port_when_stale_port_posts_result_then_discarded() {
    let channel = BridgeChannel::default();
    let first = RecordingPort::new();
    channel.on_channel_attached(first.clone());
    let log = CallbackLog::new();
    channel.send("x", log.callback(1));

    let second = RecordingPort::new();
    channel.on_channel_attached(second.clone());
    channel.on_message(&first.id(), &result_for(1));

    assert!(log.tags().is_empty());
    assert_eq!(channel.pending_count(), 1);
}

/// **VALUE**: Sequence ids keep increasing across reconnects.
///
/// **BUG THIS CATCHES**: Would catch a counter reset that lets a new command share an
/// id with a still-pending one from the previous port.
#[test]
fn given_pending_command_when_port_reconnects_then_new_ids_do_not_collide() {
    let channel = BridgeChannel::default();
    let first = RecordingPort::new();
    channel.on_channel_attached(first.clone());
    channel.send("a", |_| {});
    channel.on_channel_detached(&first.id());

    let second = RecordingPort::new();
    channel.on_channel_attached(second.clone());
    channel.send("b", |_| {});

    assert_eq!(first.sent_ids(), vec![1]);
    assert_eq!(second.sent_ids(), vec![2]);
}

#[test]
fn given_unknown_or_malformed_messages_when_received_then_state_unchanged() {
    let channel = BridgeChannel::default();
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());
    channel.send("x", |_| {});

    channel.on_message(&port.id(), &json!({ "kind": "telemetry" }));
    channel.on_message(&port.id(), &json!("not an object"));
    channel.on_message(&PortId::new(), &result_for(1));

    assert_eq!(channel.pending_count(), 1);
}

#[test]
fn given_state_when_torn_down_then_everything_cleared_without_callbacks() {
    // GIVEN: One pending command and one queued command
    let channel = BridgeChannel::default();
    let log = CallbackLog::new();
    channel.send("queued", log.callback(0));
    let port = RecordingPort::new();
    channel.on_channel_attached(port.clone());
    channel.send("pending", log.callback(1));
    channel.on_channel_detached(&port.id());
    channel.send("queued-again", log.callback(2));

    // WHEN: Tearing down
    channel.teardown();

    // THEN: Queue, map and port are gone; the pending callback never fired
    assert_eq!(channel.queued_len(), 0);
    assert_eq!(channel.pending_count(), 0);
    assert!(channel.current_port_id().is_none());
    assert_eq!(log.tags(), vec![0, 2]);
}

#[test]
fn given_port_trait_object_when_attached_then_identity_is_reported() {
    let port = RecordingPort::new();
    let expected = port.id();
    let port: Arc<dyn BridgePort> = port;
    let channel = BridgeChannel::default();

    channel.on_channel_attached(port);

    assert_eq!(channel.current_port_id(), Some(expected));
}
