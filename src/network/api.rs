use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};

use crate::common::{ImageUpload, OutgoingMessage, UploadedImage, WireMessage};
use crate::config::AppConfig;
use crate::error::{ClientError, Result};
use crate::storage::AuthContext;

use super::transport::build_http_client;

/// The slice of the forum REST API the messaging client talks to.
#[async_trait]
pub trait MessagesApi: Send + Sync + 'static {
    /// `GET /messages/with/{counterpart}`: the full thread, server-ordered.
    async fn list_conversation(
        &self,
        auth: &AuthContext,
        counterpart: &str,
    ) -> Result<Vec<WireMessage>>;

    /// `POST /messages/`
    async fn send_message(&self, auth: &AuthContext, message: &OutgoingMessage) -> Result<()>;

    /// `POST /messages/upload-image` (multipart field `file`).
    async fn upload_image(&self, auth: &AuthContext, upload: ImageUpload) -> Result<UploadedImage>;

    /// Download the bytes of a hosted image.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}

/// `MessagesApi` over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct RestApi {
    http: Client,
    base_url: Url,
}

impl RestApi {
    pub fn new(http: Client, base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|err| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = build_http_client(config)?;
        Self::new(http, &config.api_base_url)
    }

    /// Append path segments to the base URL; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn conversation_url(&self, counterpart: &str) -> Result<Url> {
        self.endpoint(&["messages", "with", counterpart])
    }

    pub fn send_url(&self) -> Result<Url> {
        // The backend routes `/messages/` with the trailing slash.
        self.endpoint(&["messages", ""])
    }

    pub fn upload_url(&self) -> Result<Url> {
        self.endpoint(&["messages", "upload-image"])
    }
}

#[async_trait]
impl MessagesApi for RestApi {
    async fn list_conversation(
        &self,
        auth: &AuthContext,
        counterpart: &str,
    ) -> Result<Vec<WireMessage>> {
        let url = self.conversation_url(counterpart)?;
        log::debug!("GET {url}");

        let messages = self
            .http
            .get(url)
            .bearer_auth(auth.token())
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<WireMessage>>()
            .await?;
        Ok(messages)
    }

    async fn send_message(&self, auth: &AuthContext, message: &OutgoingMessage) -> Result<()> {
        let url = self.send_url()?;
        log::debug!("POST {url} to {}", message.receiver_username);

        self.http
            .post(url)
            .bearer_auth(auth.token())
            .json(message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn upload_image(&self, auth: &AuthContext, upload: ImageUpload) -> Result<UploadedImage> {
        let url = self.upload_url()?;
        log::debug!(
            "POST {url} ({}, {} bytes)",
            upload.file_name,
            upload.bytes.len()
        );

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.mime)?;
        let form = Form::new().part("file", part);

        let uploaded = self
            .http
            .post(url)
            .bearer_auth(auth.token())
            .multipart(form)
            .send()
            .await?
            .error_for_status()?
            .json::<UploadedImage>()
            .await?;
        Ok(uploaded)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let url = Url::parse(url).map_err(|err| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> RestApi {
        RestApi::new(Client::new(), base).unwrap()
    }

    #[test]
    fn builds_endpoint_urls_under_the_base_path() {
        let api = api("https://forum.example/api/v1");
        assert_eq!(
            api.conversation_url("bob").unwrap().as_str(),
            "https://forum.example/api/v1/messages/with/bob"
        );
        assert_eq!(
            api.send_url().unwrap().as_str(),
            "https://forum.example/api/v1/messages/"
        );
        assert_eq!(
            api.upload_url().unwrap().as_str(),
            "https://forum.example/api/v1/messages/upload-image"
        );
    }

    #[test]
    fn trailing_slash_on_base_is_tolerated() {
        let api = api("https://forum.example/api/v1/");
        assert_eq!(
            api.conversation_url("bob").unwrap().as_str(),
            "https://forum.example/api/v1/messages/with/bob"
        );
    }

    #[test]
    fn counterpart_is_percent_encoded() {
        let api = api("https://forum.example/api/v1");
        assert_eq!(
            api.conversation_url("bob smith/2").unwrap().as_str(),
            "https://forum.example/api/v1/messages/with/bob%20smith%2F2"
        );
    }

    #[test]
    fn rejects_invalid_base_urls() {
        assert!(matches!(
            RestApi::new(Client::new(), "not a url"),
            Err(ClientError::InvalidUrl { .. })
        ));
        assert!(matches!(
            RestApi::new(Client::new(), "mailto:someone@example.com"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }
}
