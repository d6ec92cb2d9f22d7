use axum::response::{IntoResponse, Response};
use hyper::StatusCode;

#[derive(Debug)]
pub struct AppError {
    status_code: StatusCode,
    text: Option<String>,
}

impl AppError {
    pub fn new(status_code: StatusCode, text: Option<&str>) -> Self {
        Self {
            status_code,
            text: text.map(|text| text.to_string()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn forbidden_error(text: Option<&str>) -> Self {
        Self::new(StatusCode::FORBIDDEN, text)
    }

    pub fn not_found_error(text: Option<&str>) -> Self {
        Self::new(StatusCode::NOT_FOUND, text)
    }

    pub fn you_have_to_be_connected_to_perform_this_action_error() -> Self {
        Self::forbidden_error(Some(
            "You have to be connected to perform this action.",
        ))
    }

    pub fn post_not_found_error() -> Self {
        Self::not_found_error(Some("Post not found."))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.text {
            Some(text) => (self.status_code, text).into_response(),
            None => self.status_code.into_response(),
        }
    }
}
