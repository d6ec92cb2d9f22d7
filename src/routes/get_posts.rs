use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    structs::post::{Post, PostId},
    utils::app_error::AppError,
    AppState,
};

pub async fn get_posts_route(State(app_state): State<Arc<AppState>>) -> Json<Vec<Post>> {
    Json(app_state.store.posts().await)
}

pub async fn get_post_route(
    State(app_state): State<Arc<AppState>>,
    Path(post_id): Path<i64>,
) -> Result<Json<Post>, AppError> {
    app_state
        .store
        .post(PostId(post_id))
        .await
        .map(Json)
        .ok_or_else(AppError::post_not_found_error)
}
