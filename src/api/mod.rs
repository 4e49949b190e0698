// src/api/mod.rs
//! Notion API interaction: the operations the sync helper needs from a workspace.
//!
//! The helper depends on the [`NotionApi`] trait, never on HTTP details,
//! so the whole sync flow can run against an in-memory workspace in tests.

pub mod client;
pub mod pagination;
pub mod types;

use crate::error::AppError;
use crate::types::{BlockId, DatabaseId, PageId};
use serde_json::Value;
use types::{BlockObject, DatabaseSchema, PageObject, PaginatedResponse, QueryRequest};

/// The endpoints of the Notion API the helper calls.
///
/// Request bodies are raw JSON because page properties are free-form; only
/// the responses the helper inspects are typed.
#[async_trait::async_trait]
pub trait NotionApi: Send + Sync {
    async fn retrieve_database(&self, id: &DatabaseId) -> Result<DatabaseSchema, AppError>;
    async fn update_database(&self, id: &DatabaseId, body: &Value) -> Result<Value, AppError>;
    async fn query_database(
        &self,
        id: &DatabaseId,
        request: &QueryRequest,
    ) -> Result<PaginatedResponse<PageObject>, AppError>;

    async fn create_page(&self, body: &Value) -> Result<PageObject, AppError>;
    async fn update_page(&self, id: &PageId, body: &Value) -> Result<PageObject, AppError>;

    async fn list_block_children(
        &self,
        id: &BlockId,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedResponse<BlockObject>, AppError>;
    async fn append_block_children(&self, id: &BlockId, body: &Value) -> Result<Value, AppError>;
    async fn update_block(&self, id: &BlockId, body: &Value) -> Result<Value, AppError>;
    async fn delete_block(&self, id: &BlockId) -> Result<Value, AppError>;
}

pub use client::NotionHttpClient;
pub use pagination::collect_all_pages;
