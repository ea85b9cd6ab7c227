use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use cnp_core::{Error, PostPayload, PublishError, PublishReceipt, Publisher, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

const UNKNOWN_POST_ID: &str = "unknown";

pub const DEFAULT_API_BASE: &str = "https://api.x.com";

#[derive(Clone)]
pub struct XConfig {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_base: String,
}

impl XConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            client_id: None,
            client_secret: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl fmt::Debug for XConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XConfig")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Serialize)]
struct TweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia>,
}

#[derive(Serialize)]
struct TweetMedia {
    media_ids: Vec<String>,
}

#[derive(Deserialize)]
struct IdEnvelope {
    data: IdData,
}

#[derive(Deserialize)]
struct IdData {
    id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
}

struct Tokens {
    access: String,
    refresh: Option<String>,
}

/// Failure of a single request round. `Unauthorized` is kept apart so the
/// caller can refresh the token instead of giving up.
#[derive(Debug)]
enum AttemptError {
    Unauthorized(PublishError),
    Failed(PublishError),
}

impl From<PublishError> for AttemptError {
    fn from(e: PublishError) -> Self {
        AttemptError::Failed(e)
    }
}

impl From<AttemptError> for PublishError {
    fn from(e: AttemptError) -> Self {
        match e {
            AttemptError::Unauthorized(e) | AttemptError::Failed(e) => e,
        }
    }
}

/// Publishes to X through the v2 API with an OAuth2 user token. An expired
/// token is refreshed once per call when a refresh token is configured.
pub struct XPublisher {
    client: Client,
    api_base: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    tokens: RwLock<Tokens>,
}

impl XPublisher {
    pub fn new(config: XConfig) -> Result<Self> {
        if config.access_token.trim().is_empty() {
            return Err(Error::Config("missing X access token".to_string()));
        }
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        info!("🐦 X client initialized");
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client_id: config.client_id,
            client_secret: config.client_secret,
            tokens: RwLock::new(Tokens {
                access: config.access_token,
                refresh: config.refresh_token,
            }),
        })
    }

    async fn access_token(&self) -> String {
        self.tokens.read().await.access.clone()
    }

    async fn refresh(&self) -> std::result::Result<(), PublishError> {
        let mut tokens = self.tokens.write().await;
        let (Some(refresh), Some(client_id)) = (tokens.refresh.clone(), self.client_id.clone()) else {
            return Err(PublishError::Forbidden("access token rejected and no refresh token configured".into()));
        };

        let mut request = self
            .client
            .post(format!("{}/2/oauth2/token", self.api_base))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh.as_str()),
                ("client_id", client_id.as_str()),
            ]);
        if let Some(secret) = &self.client_secret {
            request = request.basic_auth(&client_id, Some(secret));
        }

        let response = request.send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| PublishError::Transient(format!("bad token response: {}", e)))?;

        tokens.access = token.access_token;
        if token.refresh_token.is_some() {
            tokens.refresh = token.refresh_token;
        }
        info!("🐦 Refreshed X access token");
        Ok(())
    }

    async fn upload_media(&self, bytes: Vec<u8>, file_name: String) -> std::result::Result<String, AttemptError> {
        let form = Form::new()
            .part("media", Part::bytes(bytes).file_name(file_name))
            .text("media_category", "tweet_image");

        let response = self
            .client
            .post(format!("{}/2/media/upload", self.api_base))
            .bearer_auth(self.access_token().await)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let envelope = check_status(response)
            .await?
            .json::<IdEnvelope>()
            .await
            .map_err(|e| PublishError::Transient(format!("bad media response: {}", e)))?;
        Ok(envelope.data.id)
    }

    async fn attempt(&self, payload: &PostPayload) -> std::result::Result<PublishReceipt, AttemptError> {
        let mut media_ids = Vec::new();
        if let Some(path) = payload.image_path() {
            match tokio::fs::read(path).await {
                Ok(bytes) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "image".to_string());
                    media_ids.push(self.upload_media(bytes, name).await?);
                }
                Err(e) => warn!("Cannot read image {}, posting without it: {}", path.display(), e),
            }
        }

        let request = TweetRequest {
            text: payload.text(),
            media: (!media_ids.is_empty()).then_some(TweetMedia { media_ids }),
        };
        let response = self
            .client
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(self.access_token().await)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        // The post exists once the status is 2xx; a body we cannot read must
        // not turn into a retry.
        let post_id = match response.json::<IdEnvelope>().await {
            Ok(envelope) => envelope.data.id,
            Err(e) => {
                warn!("🐦 Post created but its response was unreadable: {}", e);
                UNKNOWN_POST_ID.to_string()
            }
        };
        Ok(PublishReceipt { post_id })
    }
}

#[async_trait]
impl Publisher for XPublisher {
    fn name(&self) -> &str {
        "X"
    }

    async fn publish(&self, payload: &PostPayload) -> std::result::Result<PublishReceipt, PublishError> {
        let receipt = match self.attempt(payload).await {
            Err(AttemptError::Unauthorized(_)) => {
                self.refresh().await?;
                self.attempt(payload).await?
            }
            other => other?,
        };
        info!("🐦 Posted tweet ID: {}", receipt.post_id);
        Ok(receipt)
    }
}

fn transport_error(e: reqwest::Error) -> PublishError {
    PublishError::Transient(e.to_string())
}

/// Map an HTTP status onto the publish failure classes.
async fn check_status(response: Response) -> std::result::Result<Response, AttemptError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let error = classify(status, &body);
    Err(match status {
        StatusCode::UNAUTHORIZED => AttemptError::Unauthorized(error),
        _ => AttemptError::Failed(error),
    })
}

fn classify(status: StatusCode, body: &str) -> PublishError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => PublishError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PublishError::Forbidden(format!("{} {}", status.as_u16(), body)),
        _ => PublishError::Transient(format!("{} {}", status.as_u16(), body)),
    }
}
