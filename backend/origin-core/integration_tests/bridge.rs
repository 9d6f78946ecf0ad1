use origin_core::bridge::{BridgeChannel, BridgePort, OutboundMessage, PortId};
use origin_core::error::bridge::BridgeError;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};

/// Port that forwards messages to a simulated page over a channel.
struct PagePort {
    id: PortId,
    to_page: mpsc::UnboundedSender<Value>,
}

impl BridgePort for PagePort {
    fn id(&self) -> PortId {
        self.id
    }

    fn post_message(&self, message: &OutboundMessage) -> Result<(), BridgeError> {
        let value = message.to_json()?;
        self.to_page.send(value).map_err(|e| BridgeError::Send {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// Runs the page side: acknowledges every correlated command with a result.
fn spawn_page(
    channel: Arc<BridgeChannel>,
    port_id: PortId,
    mut from_native: mpsc::UnboundedReceiver<Value>,
) -> tokio::task::JoinHandle<Vec<Value>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        channel.on_message(&port_id, &json!({ "kind": "ready" }));
        while let Some(message) = from_native.recv().await {
            let id = message["id"].as_u64().unwrap_or_default();
            if id != 0 {
                channel.on_message(&port_id, &json!({ "kind": "result", "id": id, "ok": true }));
            }
            seen.push(message);
        }
        seen
    })
}

/// **VALUE**: Verifies the whole bridge against a page running on another task.
///
/// **WHY THIS MATTERS**: In the host, commands are sent from one thread while results
/// arrive on the engine's message thread. This drives both sides concurrently.
///
/// **BUG THIS CATCHES**: Would catch:
/// - Early commands lost between queueing and the port attaching
/// - Results not reaching their callbacks across threads
/// - A flushed command being correlated (id other than 0)
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn given_simulated_page_when_commands_flow_then_every_correlated_callback_fires() {
    // GIVEN: Two bootstrap commands sent before the page exists
    let channel = Arc::new(BridgeChannel::default());
    channel.send("bootstrap(1)", |_| {});
    channel.send("bootstrap(2)", |_| {});

    // WHEN: The page attaches and five commands are sent
    let (to_page, from_native) = mpsc::unbounded_channel();
    let port = Arc::new(PagePort {
        id: PortId::new(),
        to_page,
    });
    let port_id = port.id();
    channel.on_channel_attached(port);
    let page = spawn_page(Arc::clone(&channel), port_id, from_native);

    let mut receivers = Vec::new();
    for index in 0..5 {
        let (done_tx, done_rx) = oneshot::channel();
        channel.send(format!("work({index})"), move |value| {
            let _ = done_tx.send(value);
        });
        receivers.push(done_rx);
    }

    // THEN: Every callback fires with no value
    for receiver in receivers {
        let value = tokio::time::timeout(Duration::from_secs(5), receiver)
            .await
            .expect("Callback timed out")
            .expect("Callback dropped");
        assert_eq!(value, None);
    }
    assert_eq!(channel.pending_count(), 0);

    // AND: The page saw the bootstrap commands first, uncorrelated, then ids 1..=5
    channel.teardown();
    drop(channel);
    let seen = page.await.expect("Page task panicked");
    let codes: Vec<&str> = seen.iter().filter_map(|m| m["code"].as_str()).collect();
    assert_eq!(&codes[..2], &["bootstrap(1)", "bootstrap(2)"]);
    let ids: Vec<u64> = seen.iter().filter_map(|m| m["id"].as_u64()).collect();
    assert_eq!(ids, vec![0, 0, 1, 2, 3, 4, 5]);
    assert!(seen.iter().all(|m| m["kind"] == "execute"));
}
