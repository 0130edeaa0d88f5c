use reqwest::Client;

use crate::config::AppConfig;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for API calls and image downloads.
pub fn build_http_client(config: &AppConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.request_timeout())
        .build()
}
