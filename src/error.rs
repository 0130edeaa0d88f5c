use thiserror::Error;

/// Errors surfaced by the forum client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid API URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The window could not be created. Carried as text: `eframe::Error`
    /// is not `Send`.
    #[error("UI error: {0}")]
    Ui(String),

    /// No token/username in the session store.
    #[error("not signed in; run `forum_chat session set` first")]
    MissingCredentials,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync + 'static>() {}

    #[test]
    fn errors_can_cross_task_boundaries() {
        assert_send_sync::<ClientError>();
    }

    #[test]
    fn messages_name_the_failure() {
        let err = ClientError::Ui("no display".to_string());
        assert_eq!(err.to_string(), "UI error: no display");
        assert!(
            ClientError::MissingCredentials
                .to_string()
                .contains("session set")
        );
    }
}
