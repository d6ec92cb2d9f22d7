use std::time::Duration;

use reqwest::Url;

use crate::utils::config::ConfigError;

pub const SERVER_URL_ENV: &str = "LIVEFEED_SERVER_URL";
pub const RECONNECT_DELAY_ENV: &str = "LIVEFEED_RECONNECT_DELAY_MS";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(2000);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the post service, e.g. `http://127.0.0.1:8000`
    pub server_url: Url,
    /// Wait between two reconnection attempts. `None` never reconnects.
    pub reconnect_delay: Option<Duration>,
    /// Upper bound for the websocket handshake, `ready` frame included
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(server_url: &str) -> Result<Self, ConfigError> {
        let server_url = Url::parse(server_url)
            .map_err(|e| ConfigError::invalid_value(SERVER_URL_ENV, server_url, e))?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(ConfigError::invalid_value(
                SERVER_URL_ENV,
                server_url.as_str(),
                "scheme must be http or https",
            ));
        }

        Ok(Self {
            server_url,
            reconnect_delay: Some(DEFAULT_RECONNECT_DELAY),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let server_url =
            std::env::var(SERVER_URL_ENV).unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Self::new(&server_url)?.with_env_settings()
    }

    /// Applies the environment settings other than the server URL
    pub fn with_env_settings(mut self) -> Result<Self, ConfigError> {
        if let Ok(delay) = std::env::var(RECONNECT_DELAY_ENV) {
            let millis = delay
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid_value(RECONNECT_DELAY_ENV, &delay, e))?;
            self.reconnect_delay = (millis > 0).then(|| Duration::from_millis(millis));
        }
        Ok(self)
    }

    pub fn with_reconnect_delay(mut self, reconnect_delay: Option<Duration>) -> Self {
        self.reconnect_delay = reconnect_delay;
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// The push endpoint: same host and base path, `ws`/`wss` scheme,
    /// `ws` appended to the path
    pub fn ws_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.server_url.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|_| {
            ConfigError::invalid_value(SERVER_URL_ENV, self.server_url.as_str(), "no ws scheme")
        })?;
        let path = format!("{}/ws", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.set_query(None);
        Ok(url)
    }

    /// `path` appended to the server URL, keeping any base path
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
