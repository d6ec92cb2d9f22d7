use std::{sync::Arc, time::Duration};

use futures_util::StreamExt;
use reqwest::Url;
use tokio::{
    net::TcpStream,
    sync::{mpsc::UnboundedSender, watch, Mutex},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::structs::event::{LiveEvent, LiveEventKind, WsEvent};

use super::{
    config::ClientConfig,
    error::{ClientError, ClientResult},
    event_registry::{EventRegistry, Subscription},
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

static LIVE_CHANNEL: Mutex<Option<Arc<LiveChannel>>> = Mutex::const_new(None);

/// Returns the session's live channel, connecting it when there is none
/// or the previous one was shut down or lost for good.
///
/// Concurrent callers share one connection attempt. A failed attempt
/// leaves nothing behind, so the next call tries again.
pub async fn ensure_connected(config: &ClientConfig) -> ClientResult<Arc<LiveChannel>> {
    let mut current = LIVE_CHANNEL.lock().await;
    if let Some(channel) = current.as_ref() {
        if channel.is_connected() {
            return Ok(channel.clone());
        }
        info!("Live channel closed, opening a new one");
    }

    let channel = LiveChannel::connect(config).await?;
    *current = Some(channel.clone());
    Ok(channel)
}

/// One push connection shared by every post view of a session.
///
/// Views only get [`Subscription`]s out of it; closing the connection is
/// left to whoever owns the session.
pub struct LiveChannel {
    registry: EventRegistry,
    shutdown: watch::Sender<bool>,
}

impl LiveChannel {
    /// Dials the push endpoint and waits for the server to confirm the
    /// subscription before returning.
    pub async fn connect(config: &ClientConfig) -> ClientResult<Arc<Self>> {
        let ws_url = config.ws_url()?;
        let socket = open_socket(&ws_url, config.connect_timeout).await?;
        info!("Live channel connected to {ws_url}");

        let registry = EventRegistry::default();
        let (shutdown, shutdown_rx) = watch::channel(false);

        tokio::spawn(run_transport(
            socket,
            Transport {
                url: ws_url,
                reconnect_delay: config.reconnect_delay,
                connect_timeout: config.connect_timeout,
                registry: registry.clone(),
                shutdown: shutdown_rx,
            },
        ));

        Ok(Arc::new(Self { registry, shutdown }))
    }

    /// A channel without transport. Events only come from [`Self::dispatch`]
    /// and [`Self::is_connected`] is always false.
    pub fn offline() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            registry: EventRegistry::default(),
            shutdown,
        }
    }

    pub fn subscribe(
        &self,
        event_type: LiveEventKind,
        handler: UnboundedSender<LiveEvent>,
    ) -> Subscription {
        self.registry.subscribe(event_type, handler)
    }

    /// Delivers an event to the local handlers as if the server pushed it
    pub fn dispatch(&self, event: LiveEvent) -> usize {
        self.registry.dispatch(event)
    }

    pub fn handler_count(&self, event_type: LiveEventKind) -> usize {
        self.registry.handler_count(event_type)
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Whether the transport task still runs: not shut down, and either
    /// connected or waiting to reconnect
    pub fn is_connected(&self) -> bool {
        !self.is_shut_down() && !self.shutdown.is_closed()
    }

    /// Closes the connection for good, at logout or exit.
    /// Subscriptions stay valid but nothing arrives anymore.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

struct Transport {
    url: Url,
    reconnect_delay: Option<Duration>,
    connect_timeout: Duration,
    registry: EventRegistry,
    shutdown: watch::Receiver<bool>,
}

/// Resolves once a shutdown was requested or the channel was dropped
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

async fn run_transport(mut socket: Socket, transport: Transport) {
    let Transport {
        url,
        reconnect_delay,
        connect_timeout,
        registry,
        mut shutdown,
    } = transport;

    loop {
        let closed = tokio::select! {
            _ = shutdown_requested(&mut shutdown) => true,
            _ = read_events(&mut socket, &registry) => false,
        };
        if closed {
            if let Err(e) = socket.close(None).await {
                debug!("Error closing live channel : {e}");
            }
            info!("Live channel to {url} closed");
            return;
        }

        warn!("Live channel to {url} lost");
        let Some(delay) = reconnect_delay else {
            return;
        };

        socket = loop {
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => return,
                _ = tokio::time::sleep(delay) => {}
            }
            match open_socket(&url, connect_timeout).await {
                Ok(socket) => {
                    info!("Live channel reconnected to {url}");
                    break socket;
                }
                Err(e) => warn!("Reconnecting to {url} failed : {e}"),
            }
        };
    }
}

async fn open_socket(url: &Url, timeout: Duration) -> ClientResult<Socket> {
    tokio::time::timeout(timeout, handshake(url))
        .await
        .map_err(|_| ClientError::HandshakeTimeout(timeout))?
}

/// Connects and waits for the `ready` frame sent once the server
/// registered the connection
async fn handshake(url: &Url) -> ClientResult<Socket> {
    let (mut socket, _) = connect_async(url.as_str()).await?;
    while let Some(frame) = socket.next().await {
        let Message::Text(text) = frame? else {
            continue;
        };
        match serde_json::from_str::<WsEvent>(&text) {
            Ok(WsEvent::Ready(kinds)) => {
                debug!("Server registered us for {kinds:?}");
                return Ok(socket);
            }
            _ => debug!("Ignoring frame received before ready : {text}"),
        }
    }
    Err(ClientError::HandshakeClosed)
}

/// Reads frames until the socket closes or fails
async fn read_events(socket: &mut Socket, registry: &EventRegistry) {
    while let Some(frame) = socket.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!("Error reading live channel : {e}");
                break;
            }
        };

        match serde_json::from_str::<WsEvent>(&text) {
            Ok(WsEvent::Error(e)) => warn!("Live channel error : {e}"),
            Ok(event) => {
                if let Some(event) = event.into_live_event() {
                    registry.dispatch(event);
                }
            }
            Err(e) => debug!("Ignoring undecodable frame `{text}` : {e}"),
        }
    }
}
