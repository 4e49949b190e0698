// src/api/client.rs
//! HTTP implementation of [`NotionApi`](super::NotionApi).
//!
//! A thin wrapper around reqwest: authentication headers, endpoint paths and
//! turning Notion's error bodies into [`AppError::NotionService`].

use super::types::{
    BlockObject, DatabaseSchema, ErrorBody, PageObject, PaginatedResponse, QueryRequest,
};
use crate::constants::{API_BASE_URL, NOTION_API_PAGE_SIZE, NOTION_VERSION};
use crate::error::{AppError, NotionErrorCode};
use crate::types::{ApiKey, BlockId, DatabaseId, PageId, ValidationError};
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Same as [`new`](Self::new) against a different API root (proxies, recorders).
    pub fn with_base_url(
        api_key: &ApiKey,
        base_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let base_url = base_url.into();
        if let Err(e) = url::Url::parse(&base_url) {
            return Err(ValidationError::InvalidUrl {
                url: base_url,
                reason: e.to_string(),
            }
            .into());
        }
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AppError> {
        send(self.request(Method::GET, endpoint)).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, AppError> {
        send(self.request(Method::POST, endpoint).json(body)).await
    }

    async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, AppError> {
        send(self.request(Method::PATCH, endpoint).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AppError> {
        send(self.request(Method::DELETE, endpoint)).await
    }
}

#[async_trait::async_trait]
impl super::NotionApi for NotionHttpClient {
    async fn retrieve_database(&self, id: &DatabaseId) -> Result<DatabaseSchema, AppError> {
        self.get(&format!("databases/{}", id.to_dashed())).await
    }

    async fn update_database(&self, id: &DatabaseId, body: &Value) -> Result<Value, AppError> {
        self.patch(&format!("databases/{}", id.to_dashed()), body)
            .await
    }

    async fn query_database(
        &self,
        id: &DatabaseId,
        request: &QueryRequest,
    ) -> Result<PaginatedResponse<PageObject>, AppError> {
        let endpoint = format!("databases/{}/query", id.to_dashed());
        log::debug!(
            "Query body: {}",
            serde_json::to_string(request).unwrap_or_else(|_| "<unserializable>".to_string())
        );
        self.post(&endpoint, request).await
    }

    async fn create_page(&self, body: &Value) -> Result<PageObject, AppError> {
        self.post("pages", body).await
    }

    async fn update_page(&self, id: &PageId, body: &Value) -> Result<PageObject, AppError> {
        self.patch(&format!("pages/{}", id.to_dashed()), body).await
    }

    async fn list_block_children(
        &self,
        id: &BlockId,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedResponse<BlockObject>, AppError> {
        let endpoint = format!("blocks/{}/children", id.to_dashed());
        let mut params = vec![("page_size", NOTION_API_PAGE_SIZE.to_string())];
        if let Some(cursor) = start_cursor {
            params.push(("start_cursor", cursor.to_string()));
        }
        send(self.request(Method::GET, &endpoint).query(&params)).await
    }

    async fn append_block_children(&self, id: &BlockId, body: &Value) -> Result<Value, AppError> {
        self.patch(&format!("blocks/{}/children", id.to_dashed()), body)
            .await
    }

    async fn update_block(&self, id: &BlockId, body: &Value) -> Result<Value, AppError> {
        self.patch(&format!("blocks/{}", id.to_dashed()), body)
            .await
    }

    async fn delete_block(&self, id: &BlockId) -> Result<Value, AppError> {
        self.delete(&format!("blocks/{}", id.to_dashed())).await
    }
}

/// Sends a request and decodes the body, mapping non-2xx into [`AppError`].
async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AppError> {
    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;
    decode_response(status, &text)
}

/// Turns a status + body pair into the typed result or a Notion error.
fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, AppError> {
    if status.is_success() {
        return serde_json::from_str(body).map_err(|e| {
            AppError::MalformedResponse(format!("{} (body: {})", e, preview(body)))
        });
    }

    let error = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { code, message }) => AppError::NotionService {
            code: NotionErrorCode::from_api_response(&code),
            message,
            status,
        },
        Err(_) => AppError::NotionService {
            code: NotionErrorCode::from_http_status(status.as_u16()),
            message: preview(body),
            status,
        },
    };
    log::debug!("Notion request failed with {}: {}", status, error);
    Err(error)
}

fn preview(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
