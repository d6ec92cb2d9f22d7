use serde::{Deserialize, Serialize};

use super::post::{Comment, PostId, UserId};

pub const LIKE_UPDATED_EVENT_NAME: &str = "likeUpdated";
pub const COMMENT_ADDED_EVENT_NAME: &str = "commentAdded";
pub const READY_EVENT_NAME: &str = "ready";
pub const ERROR_EVENT_NAME: &str = "error";

pub const SUBSCRIBE_ACTION: &str = "subscribe_to_event";
pub const UNSUBSCRIBE_ACTION: &str = "unsubscribe_to_event";

/// The kinds of push events a connection can be subscribed to
#[derive(Eq, PartialEq, Hash, Clone, Copy, Debug, Serialize, Deserialize)]
pub enum LiveEventKind {
    #[serde(rename = "likeUpdated")]
    LikeUpdated,
    #[serde(rename = "commentAdded")]
    CommentAdded,
}

impl LiveEventKind {
    pub const ALL: [LiveEventKind; 2] = [LiveEventKind::LikeUpdated, LiveEventKind::CommentAdded];

    pub fn name(&self) -> &'static str {
        match self {
            LiveEventKind::LikeUpdated => LIKE_UPDATED_EVENT_NAME,
            LiveEventKind::CommentAdded => COMMENT_ADDED_EVENT_NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            LIKE_UPDATED_EVENT_NAME => Some(LiveEventKind::LikeUpdated),
            COMMENT_ADDED_EVENT_NAME => Some(LiveEventKind::CommentAdded),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LikeUpdated {
    pub post_id: PostId,
    pub likes: Vec<UserId>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentAdded {
    pub post_id: PostId,
    #[serde(alias = "comm")]
    pub comments: Vec<Comment>,
}

/// A push event carrying the full replacement collection of one post.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveEvent {
    LikeUpdated(LikeUpdated),
    CommentAdded(CommentAdded),
}

impl LiveEvent {
    pub fn kind(&self) -> LiveEventKind {
        match self {
            LiveEvent::LikeUpdated(_) => LiveEventKind::LikeUpdated,
            LiveEvent::CommentAdded(_) => LiveEventKind::CommentAdded,
        }
    }

    pub fn post_id(&self) -> PostId {
        match self {
            LiveEvent::LikeUpdated(event) => event.post_id,
            LiveEvent::CommentAdded(event) => event.post_id,
        }
    }
}

/// Every frame the server pushes on `/ws`, as `{"event": .., "content": ..}`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "event", content = "content")]
pub enum WsEvent {
    #[serde(rename = "likeUpdated")]
    LikeUpdated(LikeUpdated),
    #[serde(rename = "commentAdded")]
    CommentAdded(CommentAdded),
    /// Sent once the connection is registered for the listed kinds
    #[serde(rename = "ready")]
    Ready(Vec<LiveEventKind>),
    #[serde(rename = "error")]
    Error(String),
}

impl WsEvent {
    pub fn new_error(text: &str) -> Self {
        WsEvent::Error(text.to_string())
    }

    pub fn into_live_event(self) -> Option<LiveEvent> {
        match self {
            WsEvent::LikeUpdated(event) => Some(LiveEvent::LikeUpdated(event)),
            WsEvent::CommentAdded(event) => Some(LiveEvent::CommentAdded(event)),
            WsEvent::Ready(_) | WsEvent::Error(_) => None,
        }
    }
}

impl From<LiveEvent> for WsEvent {
    fn from(event: LiveEvent) -> Self {
        match event {
            LiveEvent::LikeUpdated(event) => WsEvent::LikeUpdated(event),
            LiveEvent::CommentAdded(event) => WsEvent::CommentAdded(event),
        }
    }
}

/// Frame sent by a client to opt in or out of an event kind
#[derive(Serialize, Deserialize, Debug)]
pub struct ClientEvent {
    pub action: String,
    pub content: serde_json::Value,
}
