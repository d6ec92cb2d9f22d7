use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use tracing::warn;

use crate::{structs::post::UserId, utils::app_error::AppError};

pub const SESSION_COOKIE: &str = "session";

/// The acting user, read from the `session` cookie.
///
/// Sessions are issued by the authentication service; this extractor
/// only reads the user id it carries.
pub struct AuthUser(pub Option<UserId>);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = match CookieJar::from_request_parts(parts, state).await {
            Ok(cookies) => cookies,
            Err(infallible) => match infallible {},
        };
        let Some(session) = cookies.get(SESSION_COOKIE) else {
            return Ok(AuthUser(None));
        };

        match session.value().parse::<i64>() {
            Ok(id) => Ok(AuthUser(Some(UserId(id)))),
            Err(e) => {
                warn!("Invalid session cookie `{}` : {e}", session.value());
                Ok(AuthUser(None))
            }
        }
    }
}
