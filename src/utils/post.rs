use tracing::warn;

use crate::structs::post::UserId;

use super::app_error::AppError;

pub const MAX_COMMENT_LENGTH: usize = 2000;

/// Trims a new comment and checks its length. Returns the text to store.
pub fn check_new_comment_data(auth_user_id: UserId, content: &str) -> Result<&str, AppError> {
    let content = content.trim();

    if content.is_empty() {
        warn!("User {auth_user_id} tried to post an empty comment");
        return Err(AppError::forbidden_error(Some("A comment cannot be empty.")));
    }

    let length = content.chars().count();
    if length > MAX_COMMENT_LENGTH {
        warn!(
            "User {} tried to post a comment with a wrong length : {}/{}",
            auth_user_id, length, MAX_COMMENT_LENGTH
        );
        return Err(AppError::forbidden_error(Some(
            "A comment must contain at most 2 000 characters.",
        )));
    }

    Ok(content)
}
