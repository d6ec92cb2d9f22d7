use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::{info, warn};

use crate::{
    extractors::auth_extractor::AuthUser,
    structs::{
        event::{LikeUpdated, LiveEvent},
        post::{LikeResponse, PostId},
    },
    utils::{app_error::AppError, real_time_event_management::EventTracker},
    AppState,
};

/// Toggles the like of the connected user and broadcasts the new likes
pub async fn like_post_route(
    State(app_state): State<Arc<AppState>>,
    AuthUser(auth_user): AuthUser,
    Extension(event_tracker): Extension<EventTracker>,
    Path(post_id): Path<i64>,
) -> Result<Json<LikeResponse>, AppError> {
    let Some(auth_user) = auth_user else {
        warn!("User not connected");
        return Err(AppError::you_have_to_be_connected_to_perform_this_action_error());
    };
    let post_id = PostId(post_id);

    let Some(likes) = app_state.store.toggle_like(post_id, auth_user).await else {
        warn!("User {auth_user} tried to like unknown post {post_id}");
        return Err(AppError::post_not_found_error());
    };
    info!("User {auth_user} toggled like on post {post_id}");

    event_tracker
        .notify_event(LiveEvent::LikeUpdated(LikeUpdated {
            post_id,
            likes: likes.clone(),
        }))
        .await;

    Ok(Json(LikeResponse { like: likes }))
}
