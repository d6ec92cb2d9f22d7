use std::{
    collections::{hash_map::Entry, HashMap, HashSet},
    sync::Arc,
};

use axum::extract::ws::Message;
use tokio::sync::{mpsc::UnboundedSender, RwLock};
use tracing::{debug, info, warn};

use crate::structs::event::{
    ClientEvent, LiveEvent, LiveEventKind, WsEvent, SUBSCRIBE_ACTION, UNSUBSCRIBE_ACTION,
};

/// A websocket connection, with the events it is subscribed to and
/// the channel feeding its writer task
pub struct UserConnection {
    subscribed_events: HashSet<LiveEventKind>,
    sender: UnboundedSender<Message>,
}

impl UserConnection {
    /// Create a new UserConnection struct, with no subscribed events
    pub fn new(sender: UnboundedSender<Message>) -> Self {
        Self {
            subscribed_events: HashSet::default(),
            sender,
        }
    }

    pub fn subscribed_events(&self) -> &HashSet<LiveEventKind> {
        &self.subscribed_events
    }

    pub fn send_text_event(&self, event: String) -> bool {
        self.sender.send(Message::Text(event)).is_ok()
    }

    pub fn send_event(&self, event: &WsEvent) -> bool {
        match serde_json::to_string(event) {
            Ok(event) => self.send_text_event(event),
            Err(e) => {
                warn!("Error serializing websocket event : {e}");
                false
            }
        }
    }
}

pub type Subscriber = Arc<RwLock<UserConnection>>;

pub type Events = Arc<RwLock<HashMap<LiveEventKind, Vec<Subscriber>>>>;

/// Stores all the connections subscribed to every event kind
#[derive(Default, Clone)]
pub struct EventTracker {
    events: Events,
}

impl EventTracker {
    pub async fn subscribe(&self, event_type: LiveEventKind, subscriber: Subscriber) {
        let mut connection = subscriber.write().await;
        if !connection.subscribed_events.insert(event_type) {
            warn!("Connection already subscribed to event {event_type:?}");
            return;
        }
        drop(connection);

        match self.events.write().await.entry(event_type) {
            Entry::Occupied(mut entry) => entry.get_mut().push(subscriber),
            Entry::Vacant(entry) => {
                entry.insert(vec![subscriber]);
            }
        }
    }

    pub async fn unsubscribe(&self, event_type: LiveEventKind, subscriber: Subscriber) {
        if !subscriber
            .write()
            .await
            .subscribed_events
            .remove(&event_type)
        {
            warn!("Event {event_type:?} was not in the list of events.");
        }

        if let Entry::Occupied(mut entry) = self.events.write().await.entry(event_type) {
            let subscribers = entry.get_mut();
            let len = subscribers.len();
            subscribers.retain(|s| !Arc::ptr_eq(s, &subscriber));
            let difference = len - subscribers.len();
            if difference > 1 {
                warn!("Unsubscribed {difference} connections instead of 1");
            }
            if subscribers.is_empty() {
                entry.remove_entry();
            }
            return;
        }
        warn!("Connection not subscribed to event {event_type:?}.");
    }

    /// Sends an already serialized event to every subscriber of `event_type`
    pub async fn notify(&self, event_type: LiveEventKind, content: String) -> usize {
        let events = self.events.read().await;
        let Some(connections) = events.get(&event_type) else {
            return 0;
        };

        let mut delivered = 0;
        for connection in connections {
            if connection.read().await.send_text_event(content.clone()) {
                delivered += 1;
            } else {
                debug!("Dropping {event_type:?} for a closed connection");
            }
        }
        delivered
    }

    /// Broadcasts a like or comment update to every subscribed connection
    pub async fn notify_event(&self, event: LiveEvent) -> usize {
        let event_type = event.kind();
        let post_id = event.post_id();
        match serde_json::to_string(&WsEvent::from(event)) {
            Ok(content) => {
                let delivered = self.notify(event_type, content).await;
                info!("{event_type:?} for post {post_id} sent to {delivered} connection(s)");
                delivered
            }
            Err(e) => {
                warn!("Error serializing {event_type:?} for post {post_id} : {e}");
                0
            }
        }
    }

    pub async fn subscriber_count(&self, event_type: LiveEventKind) -> usize {
        self.events
            .read()
            .await
            .get(&event_type)
            .map_or(0, |subscribers| subscribers.len())
    }

    pub async fn handle_client_event(
        &self,
        client_event_text: &str,
        sender: Subscriber,
    ) -> Result<(), String> {
        let client_event: ClientEvent = match serde_json::from_str(client_event_text) {
            Ok(e) => e,
            Err(e) => {
                warn!("Error deserializing WS event : {e}");
                return Err("Invalid event JSON.".to_string());
            }
        };

        let content = client_event.content;
        let Some(inner_event_name) = content.get("event") else {
            return Err("The `event` field is missing inside `content`.".to_string());
        };

        let Some(event_name) = inner_event_name.as_str() else {
            return Err("The `event` field inside `content` must be a string.".to_string());
        };

        let Some(event) = LiveEventKind::from_name(event_name) else {
            return Err(format!("The event `{event_name}` doesn't exist."));
        };

        match client_event.action.as_str() {
            SUBSCRIBE_ACTION => self.subscribe(event, sender).await,
            UNSUBSCRIBE_ACTION => self.unsubscribe(event, sender).await,
            action => return Err(format!("The action `{action}` doesn't exist.")),
        }

        Ok(())
    }

    pub async fn disconnect(&self, connection: Subscriber) {
        let subscribed_events = connection.read().await.subscribed_events.clone();

        for event in subscribed_events {
            self.unsubscribe(event, connection.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::{
        event::LikeUpdated,
        post::{PostId, UserId},
    };
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn connection() -> (Subscriber, UnboundedReceiver<Message>) {
        let (sender, receiver) = unbounded_channel();
        (Arc::new(RwLock::new(UserConnection::new(sender))), receiver)
    }

    fn like_event() -> LiveEvent {
        LiveEvent::LikeUpdated(LikeUpdated {
            post_id: PostId(1),
            likes: vec![UserId(3)],
        })
    }

    #[tokio::test]
    async fn notify_reaches_only_subscribers_of_the_kind() {
        let tracker = EventTracker::default();
        let (likes_only, mut likes_rx) = connection();
        let (comments_only, mut comments_rx) = connection();

        tracker
            .subscribe(LiveEventKind::LikeUpdated, likes_only)
            .await;
        tracker
            .subscribe(LiveEventKind::CommentAdded, comments_only)
            .await;

        assert_eq!(tracker.notify_event(like_event()).await, 1);

        let Some(Message::Text(text)) = likes_rx.recv().await else {
            panic!("expected a text frame");
        };
        let event: WsEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(event.into_live_event(), Some(like_event()));
        assert!(comments_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn double_subscribe_registers_once() {
        let tracker = EventTracker::default();
        let (conn, _rx) = connection();

        tracker
            .subscribe(LiveEventKind::LikeUpdated, conn.clone())
            .await;
        tracker.subscribe(LiveEventKind::LikeUpdated, conn).await;

        assert_eq!(tracker.subscriber_count(LiveEventKind::LikeUpdated).await, 1);
    }

    #[tokio::test]
    async fn disconnect_removes_every_subscription() {
        let tracker = EventTracker::default();
        let (conn, _rx) = connection();
        let (other, _other_rx) = connection();

        for kind in LiveEventKind::ALL {
            tracker.subscribe(kind, conn.clone()).await;
        }
        tracker
            .subscribe(LiveEventKind::LikeUpdated, other)
            .await;

        tracker.disconnect(conn.clone()).await;

        assert!(conn.read().await.subscribed_events().is_empty());
        assert_eq!(tracker.subscriber_count(LiveEventKind::LikeUpdated).await, 1);
        assert_eq!(tracker.subscriber_count(LiveEventKind::CommentAdded).await, 0);
    }

    #[tokio::test]
    async fn client_events_are_validated() {
        let tracker = EventTracker::default();
        let (conn, _rx) = connection();

        assert!(tracker.handle_client_event("nope", conn.clone()).await.is_err());
        assert!(tracker
            .handle_client_event(
                r#"{"action":"subscribe_to_event","content":{"event":"typing"}}"#,
                conn.clone()
            )
            .await
            .is_err());
        assert!(tracker
            .handle_client_event(
                r#"{"action":"shout","content":{"event":"likeUpdated"}}"#,
                conn.clone()
            )
            .await
            .is_err());

        tracker
            .handle_client_event(
                r#"{"action":"subscribe_to_event","content":{"event":"commentAdded"}}"#,
                conn.clone(),
            )
            .await
            .unwrap();
        assert_eq!(tracker.subscriber_count(LiveEventKind::CommentAdded).await, 1);

        tracker
            .handle_client_event(
                r#"{"action":"unsubscribe_to_event","content":{"event":"commentAdded"}}"#,
                conn,
            )
            .await
            .unwrap();
        assert_eq!(tracker.subscriber_count(LiveEventKind::CommentAdded).await, 0);
    }
}
