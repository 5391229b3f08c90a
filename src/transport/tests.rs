use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

use super::message::{ClientMessage, PushMessage};
use super::websocket::{
    LinkCommand, LinkEvent, LinkHandle, LinkState, dispatch_incoming, run_realtime_link,
};
use crate::config::RealtimeSettings;
use crate::registry::{MonitorId, NotificationRegistry, TopicTransport};

#[test]
fn control_messages_use_tagged_json() {
    let msg = ClientMessage::Subscribe {
        topic: "topic/a".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({ "type": "subscribe", "topic": "topic/a" })
    );

    let parsed: ClientMessage =
        serde_json::from_value(json!({ "type": "unsubscribe", "topic": "topic/a" })).unwrap();
    assert!(matches!(parsed, ClientMessage::Unsubscribe { .. }));
}

#[test]
fn push_messages_decode() {
    let push: PushMessage = serde_json::from_value(json!({
        "topic": "topic/challenge/42",
        "payload": "{}",
        "timestamp": 1_725_000_000,
    }))
    .unwrap();
    assert_eq!(push.topic, "topic/challenge/42");
    assert_eq!(push.timestamp, 1_725_000_000);
}

#[test]
fn handle_reports_state_and_forwards_commands() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let state = Arc::new(Mutex::new(LinkState::Disconnected));
    let handle = LinkHandle::new(tx, state.clone());

    assert!(!handle.is_connected());
    *state.lock().unwrap() = LinkState::Connected;
    assert!(handle.is_connected());

    handle.subscribe("topic/a");
    handle.unsubscribe("topic/a");
    handle.shutdown();

    assert_eq!(
        rx.try_recv().unwrap(),
        LinkCommand::Subscribe {
            topic: "topic/a".to_string()
        }
    );
    assert_eq!(
        rx.try_recv().unwrap(),
        LinkCommand::Unsubscribe {
            topic: "topic/a".to_string()
        }
    );
    assert_eq!(rx.try_recv().unwrap(), LinkCommand::Shutdown);
}

struct NullLink;

impl TopicTransport for NullLink {
    fn is_connected(&self) -> bool {
        true
    }
    fn subscribe(&self, _topic: &str) {}
    fn unsubscribe(&self, _topic: &str) {}
}

fn registry_with_challenge_monitor(
    received: Arc<Mutex<Vec<serde_json::Value>>>,
) -> Arc<Mutex<NotificationRegistry>> {
    let registry = Arc::new(Mutex::new(NotificationRegistry::new(Box::new(NullLink))));
    {
        let mut reg = registry.lock().unwrap();
        let id = MonitorId::Challenges("42".to_string());
        reg.start(
            id.clone(),
            Box::new(move |payload| received.lock().unwrap().push(payload.clone())),
        );
        reg.complete_topic_fetch(&id, "topic/challenge/42".to_string());
    }
    registry
}

#[test]
fn incoming_frames_reach_registered_handlers() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let registry = registry_with_challenge_monitor(received.clone());

    let frame = json!({
        "topic": "topic/challenge/42",
        "payload": json!({ "new_challenge": { "challenge_id": "c1", "type": "finished" } })
            .to_string(),
        "timestamp": 1_725_000_000,
    })
    .to_string();
    dispatch_incoming(&frame, &registry);

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["new_challenge"]["challenge_id"], "c1");
}

#[test]
fn undecodable_frames_are_dropped() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let registry = registry_with_challenge_monitor(received.clone());

    dispatch_incoming("not json at all", &registry);
    dispatch_incoming(
        &json!({ "topic": "topic/challenge/42", "payload": "not json", "timestamp": 0 })
            .to_string(),
        &registry,
    );

    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn link_subscribes_and_delivers_over_loopback() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // One-shot broker: expect a subscribe for the challenge topic, push one
    // webhook payload, then drain until the client closes.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let (mut tx, mut rx) = ws.split();

        loop {
            let msg = rx.next().await.unwrap().unwrap();
            if msg.is_text() {
                let parsed: serde_json::Value =
                    serde_json::from_str(msg.to_text().unwrap()).unwrap();
                assert_eq!(parsed["type"], "subscribe");
                assert_eq!(parsed["topic"], "topic/challenge/42");
                break;
            }
        }

        let push = json!({
            "topic": "topic/challenge/42",
            "payload": json!({ "new_challenge": { "challenge_id": "c1", "type": "finished" } })
                .to_string(),
            "timestamp": 1_725_000_000,
        });
        tx.send(WsMessage::Text(push.to_string().into()))
            .await
            .unwrap();

        while let Some(Ok(_)) = rx.next().await {}
    });

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let state = Arc::new(Mutex::new(LinkState::Disconnected));
    let handle = LinkHandle::new(command_tx, state.clone());
    let registry = Arc::new(Mutex::new(NotificationRegistry::new(Box::new(
        handle.clone(),
    ))));

    let (payload_tx, mut payload_rx) = mpsc::unbounded_channel();
    {
        let mut reg = registry.lock().unwrap();
        let id = MonitorId::Challenges("42".to_string());
        let (_, needs_fetch) = reg.start(
            id.clone(),
            Box::new(move |payload| {
                let _ = payload_tx.send(payload.clone());
            }),
        );
        assert!(needs_fetch);
        // the lookup resolves before the link is up; replay subscribes it
        reg.complete_topic_fetch(&id, "topic/challenge/42".to_string());
    }

    let settings = RealtimeSettings {
        endpoint: None,
        keepalive_interval_ms: 50,
        reconnect_delay_ms: 500,
    };
    let link_task = tokio::spawn(run_realtime_link(
        format!("ws://{addr}"),
        settings,
        registry.clone(),
        state,
        command_rx,
        event_tx,
    ));

    let event = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
        .await
        .expect("no Connected event")
        .unwrap();
    let LinkEvent::Connected { pending_topics } = event;
    assert!(pending_topics.is_empty());

    let payload = tokio::time::timeout(Duration::from_secs(5), payload_rx.recv())
        .await
        .expect("no payload delivered")
        .unwrap();
    assert_eq!(payload["new_challenge"]["challenge_id"], "c1");

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(5), link_task)
        .await
        .expect("link task did not stop")
        .unwrap();
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server task did not stop")
        .unwrap();
}

#[tokio::test]
async fn shutdown_while_disconnected_stops_the_link() {
    // grab a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, _event_rx) = mpsc::unbounded_channel();
    let state = Arc::new(Mutex::new(LinkState::Disconnected));
    let handle = LinkHandle::new(command_tx, state.clone());
    let registry = Arc::new(Mutex::new(NotificationRegistry::new(Box::new(
        handle.clone(),
    ))));

    let settings = RealtimeSettings {
        endpoint: None,
        keepalive_interval_ms: 250,
        reconnect_delay_ms: 10_000,
    };
    let link_task = tokio::spawn(run_realtime_link(
        format!("ws://{addr}"),
        settings,
        registry,
        state,
        command_rx,
        event_tx,
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.shutdown();

    tokio::time::timeout(Duration::from_secs(2), link_task)
        .await
        .expect("link task did not honor shutdown while disconnected")
        .unwrap();
}
