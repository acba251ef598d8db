//! REST client for the blog backend.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use scribe_core::config::ApiConfig;

use crate::auth::TokenProvider;
use crate::draft::{PostPayload, PostStatus};
use crate::file::ImageFile;
use crate::gallery::ImageUploader;
use crate::{PublishError, PublishResult};

const USER_AGENT_VALUE: &str = concat!("scribe/", env!("CARGO_PKG_VERSION"));

/// A post as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub preview_image: Option<String>,
    #[serde(default)]
    pub image_gallery: Vec<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

/// Client for the blog REST API.
#[derive(Debug, Clone)]
pub struct BlogClient<T> {
    client: reqwest::Client,
    base_url: String,
    tokens: T,
}

impl<T: TokenProvider + Sync> BlogClient<T> {
    /// Creates a client for the configured backend.
    pub fn new(api: &ApiConfig, tokens: T) -> PublishResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| PublishError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Uploads one image as multipart field `image`; returns its URL.
    pub async fn upload_image(&self, file: &ImageFile) -> PublishResult<String> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let form = Form::new().part("image", part);

        let token = self.tokens.token().await?;
        tracing::debug!(name = %file.name, "POST /blogs/upload-image");
        let response = self
            .client
            .post(self.url("/blogs/upload-image"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = handle_response(response).await?;
        Ok(body.url)
    }

    /// Creates a post.
    pub async fn create_post(&self, payload: &PostPayload) -> PublishResult<BlogPost> {
        let token = self.tokens.token().await?;
        tracing::info!(title = %payload.title, "creating post");
        let response = self
            .client
            .post(self.url("/blogs"))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Replaces an existing post.
    pub async fn update_post(&self, id: &str, payload: &PostPayload) -> PublishResult<BlogPost> {
        let token = self.tokens.token().await?;
        tracing::info!(id, title = %payload.title, "updating post");
        let response = self
            .client
            .put(self.url(&format!("/blogs/{id}")))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Fetches a post for editing.
    pub async fn get_post(&self, id: &str) -> PublishResult<BlogPost> {
        let token = self.tokens.token().await?;
        tracing::debug!(id, "GET /blogs/:id");
        let response = self
            .client
            .get(self.url(&format!("/blogs/{id}")))
            .bearer_auth(token)
            .send()
            .await?;
        handle_response(response).await
    }
}

impl<T: TokenProvider + Sync> ImageUploader for BlogClient<T> {
    async fn upload(&self, file: &ImageFile) -> PublishResult<String> {
        self.upload_image(file).await
    }
}

/// Checks the status and parses the JSON body.
async fn handle_response<R: DeserializeOwned>(response: reqwest::Response) -> PublishResult<R> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(PublishError::Auth(format!("backend refused credentials ({status})")));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}
