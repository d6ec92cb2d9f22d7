use std::time::Duration;

use thiserror::Error;

use crate::utils::config::ConfigError;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Websocket error : {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Request error : {0}")]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The server never sent its `ready` frame
    #[error("Server did not confirm the subscription within {0:?}")]
    HandshakeTimeout(Duration),
    #[error("Connection closed before the server confirmed the subscription")]
    HandshakeClosed,
}
