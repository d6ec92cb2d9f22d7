//! Post cards with live likes and comments.
//!
//! The server half ([`router`]) keeps posts in memory and broadcasts every
//! like and comment on `/ws`. The [`client`] half keeps one websocket per
//! session and reconciles each displayed post with what the server says.
pub mod client;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod structs;
pub mod utils;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Extension, Router,
};

use crate::{
    middleware::logger_middleware::logger_middleware,
    routes::{
        comment_post_route::comment_post_route,
        get_posts::{get_post_route, get_posts_route},
        like_post_route::like_post_route,
        ws_route::ws_route,
    },
    utils::{real_time_event_management::EventTracker, store::PostStore},
};

pub struct AppState {
    pub store: PostStore,
}

pub fn router(app_state: AppState, event_tracker: EventTracker) -> Router {
    Router::new()
        .route("/api/post", get(get_posts_route))
        .route("/api/post/:id", get(get_post_route))
        .route("/api/post/like/:id", get(like_post_route))
        .route("/api/post/comment/:id", post(comment_post_route))
        .route("/ws", get(ws_route))
        .layer(axum_middleware::from_fn(logger_middleware))
        .layer(Extension(event_tracker))
        .with_state(Arc::new(app_state))
}
