use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::{info, warn};

use crate::{
    extractors::auth_extractor::AuthUser,
    structs::{
        event::{CommentAdded, LiveEvent},
        post::{CommentResponse, NewComment, PostId},
    },
    utils::{
        app_error::AppError, post::check_new_comment_data,
        real_time_event_management::EventTracker,
    },
    AppState,
};

pub async fn comment_post_route(
    State(app_state): State<Arc<AppState>>,
    AuthUser(auth_user): AuthUser,
    Extension(event_tracker): Extension<EventTracker>,
    Path(post_id): Path<i64>,
    Json(comment): Json<NewComment>,
) -> Result<Json<CommentResponse>, AppError> {
    let Some(auth_user) = auth_user else {
        warn!("User not connected");
        return Err(AppError::you_have_to_be_connected_to_perform_this_action_error());
    };
    let post_id = PostId(post_id);

    let content = check_new_comment_data(auth_user, &comment.content)?;

    let Some(author) = app_state.store.user(auth_user).await else {
        warn!("Unknown user {auth_user} tried to comment post {post_id}");
        return Err(AppError::not_found_error(Some("User not found.")));
    };

    let Some(comments) = app_state
        .store
        .add_comment(post_id, author.comment_author(), content.to_string())
        .await
    else {
        warn!("User {auth_user} tried to comment unknown post {post_id}");
        return Err(AppError::post_not_found_error());
    };
    info!("User {auth_user} commented post {post_id}");

    event_tracker
        .notify_event(LiveEvent::CommentAdded(CommentAdded {
            post_id,
            comments: comments.clone(),
        }))
        .await;

    Ok(Json(CommentResponse { comment: comments }))
}
