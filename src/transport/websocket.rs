//! WebSocket realtime link
//!
//! This file implements the client side of the pub/sub connection.
//! Responsibilities:
//! - Establish (and re-establish) the WebSocket connection to the broker
//! - Translate registry requests into `subscribe`/`unsubscribe` protocol
//!   messages via a command channel
//! - Decode incoming push messages and hand them to the registry
//! - Send a keepalive ping on a fixed interval while connected
//!
//! The task owning the socket is the only place the connection is touched;
//! everything else talks to it through [`LinkHandle`]. Registry state is only
//! mutated under its mutex, never from socket callbacks directly.

use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::config::RealtimeSettings;
use crate::registry::{MonitorId, NotificationRegistry, TopicTransport};
use crate::transport::message::{ClientMessage, PushMessage};

/// Lifecycle of the shared broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// Requests accepted by the link task. Sends are fire-and-forget.
#[derive(Debug, PartialEq, Eq)]
pub enum LinkCommand {
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    Shutdown,
}

/// Notifications emitted by the link task towards the service object.
#[derive(Debug)]
pub enum LinkEvent {
    /// The connection is up and known topics were replayed. `pending_topics`
    /// lists the monitors that still need a topic lookup.
    Connected { pending_topics: Vec<MonitorId> },
}

/// Cheap, cloneable handle to the link task.
#[derive(Clone)]
pub struct LinkHandle {
    commands: UnboundedSender<LinkCommand>,
    state: Arc<Mutex<LinkState>>,
}

impl LinkHandle {
    pub fn new(commands: UnboundedSender<LinkCommand>, state: Arc<Mutex<LinkState>>) -> Self {
        Self { commands, state }
    }

    pub fn state(&self) -> LinkState {
        *self.state.lock().unwrap()
    }

    /// Ask the link task to close the connection and exit.
    pub fn shutdown(&self) {
        let _ = self.commands.send(LinkCommand::Shutdown);
    }
}

impl TopicTransport for LinkHandle {
    fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    fn subscribe(&self, topic: &str) {
        let _ = self.commands.send(LinkCommand::Subscribe {
            topic: topic.to_string(),
        });
    }

    fn unsubscribe(&self, topic: &str) {
        let _ = self.commands.send(LinkCommand::Unsubscribe {
            topic: topic.to_string(),
        });
    }
}

type WsSink =
    futures_util::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

fn set_state(state: &Arc<Mutex<LinkState>>, next: LinkState) {
    *state.lock().unwrap() = next;
}

async fn send_control(sink: &mut WsSink, msg: &ClientMessage) -> Result<(), tungstenite::Error> {
    let text = match serde_json::to_string(msg) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "failed to encode control message");
            return Ok(());
        }
    };
    sink.send(WsMessage::Text(text.into())).await
}

/// Decode one broker frame and deliver it through the registry.
pub(crate) fn dispatch_incoming(text: &str, registry: &Arc<Mutex<NotificationRegistry>>) {
    let push: PushMessage = match serde_json::from_str(text) {
        Ok(push) => push,
        Err(e) => {
            warn!(error = %e, "dropping undecodable realtime frame");
            return;
        }
    };
    let payload: serde_json::Value = match serde_json::from_str(&push.payload) {
        Ok(value) => value,
        Err(e) => {
            warn!(topic = %push.topic, error = %e, "dropping message with malformed payload");
            return;
        }
    };
    let delivered = registry.lock().unwrap().dispatch(&push.topic, &payload);
    debug!(topic = %push.topic, delivered, "realtime message dispatched");
}

/// Wait out the reconnect delay, still honoring shutdown. Returns true when
/// the link should exit instead of retrying.
async fn wait_for_retry(commands: &mut UnboundedReceiver<LinkCommand>, delay: Duration) -> bool {
    let wait = tokio::time::sleep(delay);
    tokio::pin!(wait);
    loop {
        tokio::select! {
            _ = &mut wait => return false,
            cmd = commands.recv() => match cmd {
                Some(LinkCommand::Shutdown) | None => return true,
                // Stale subscribe/unsubscribe requests can be dropped here:
                // the registry replays everything once the link is back up.
                Some(_) => {}
            },
        }
    }
}

/// Drive the broker connection until shutdown.
///
/// State machine: `Disconnected -> Connecting -> Connected -> Disconnected`
/// on network loss, then back to `Connecting` after the reconnect delay. On
/// every (re)establishment the registry replays its subscriptions and a
/// [`LinkEvent::Connected`] is emitted carrying the monitors that still need
/// a topic lookup.
pub async fn run_realtime_link(
    endpoint: String,
    settings: RealtimeSettings,
    registry: Arc<Mutex<NotificationRegistry>>,
    state: Arc<Mutex<LinkState>>,
    mut commands: UnboundedReceiver<LinkCommand>,
    events: UnboundedSender<LinkEvent>,
) {
    let keepalive_every = Duration::from_millis(settings.keepalive_interval_ms);
    let reconnect_delay = Duration::from_millis(settings.reconnect_delay_ms);

    loop {
        set_state(&state, LinkState::Connecting);
        let ws = match connect_async(endpoint.as_str()).await {
            Ok((ws, _)) => ws,
            Err(e) => {
                warn!(%endpoint, error = %e, "realtime link connect failed");
                set_state(&state, LinkState::Disconnected);
                if wait_for_retry(&mut commands, reconnect_delay).await {
                    return;
                }
                continue;
            }
        };

        info!(%endpoint, "realtime link established");
        set_state(&state, LinkState::Connected);

        let pending_topics = registry.lock().unwrap().on_link_connected();
        let _ = events.send(LinkEvent::Connected { pending_topics });

        let (mut sink, mut stream) = ws.split();
        let mut keepalive = tokio::time::interval(keepalive_every);
        // the first tick of an interval completes immediately
        keepalive.tick().await;

        let mut shutdown = false;
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(LinkCommand::Subscribe { topic }) => {
                        debug!(%topic, "subscribing");
                        if send_control(&mut sink, &ClientMessage::Subscribe { topic }).await.is_err() {
                            break;
                        }
                    }
                    Some(LinkCommand::Unsubscribe { topic }) => {
                        debug!(%topic, "unsubscribing");
                        if send_control(&mut sink, &ClientMessage::Unsubscribe { topic }).await.is_err() {
                            break;
                        }
                    }
                    Some(LinkCommand::Shutdown) | None => {
                        shutdown = true;
                        let _ = sink.close().await;
                        break;
                    }
                },
                incoming = stream.next() => match incoming {
                    Some(Ok(msg)) if msg.is_text() => {
                        if let Ok(text) = msg.to_text() {
                            dispatch_incoming(text, &registry);
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("realtime link closed by peer");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "realtime link read error");
                        break;
                    }
                },
                _ = keepalive.tick() => {
                    if sink.send(WsMessage::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }

        set_state(&state, LinkState::Disconnected);
        registry.lock().unwrap().on_link_disconnected();

        if shutdown {
            info!("realtime link shut down");
            return;
        }
        if wait_for_retry(&mut commands, reconnect_delay).await {
            return;
        }
    }
}
