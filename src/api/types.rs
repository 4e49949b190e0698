// src/api/types.rs
//! Wire types for the slice of the Notion API the helper touches.
//!
//! Only the fields the helper reads are typed; everything else is kept as
//! raw JSON so callers can still reach it.

use crate::types::{BlockId, DatabaseId, PageId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Generic paginated list envelope (`results` + cursor).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

impl<T> PaginatedResponse<T> {
    /// A final page holding `results`.
    pub fn last(results: Vec<T>) -> Self {
        Self {
            results,
            next_cursor: None,
            has_more: false,
        }
    }

    /// A page followed by more results at `cursor`.
    pub fn with_more(results: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            results,
            next_cursor: Some(cursor.into()),
            has_more: true,
        }
    }
}

/// Body of `POST /databases/{id}/query`. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorts: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter; JSON `null` counts as no filter.
    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter).filter(|f| !f.is_null());
        self
    }

    /// Sets the sorts; JSON `null` and empty arrays count as no sorts.
    pub fn sorts(mut self, sorts: Value) -> Self {
        let empty = sorts.is_null() || sorts.as_array().is_some_and(|a| a.is_empty());
        self.sorts = (!empty).then_some(sorts);
        self
    }

    pub fn start_cursor(mut self, cursor: Option<String>) -> Self {
        self.start_cursor = cursor;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }
}

/// A block as returned by `GET /blocks/{id}/children`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockObject {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl BlockObject {
    /// Title of a `child_database` block.
    pub fn child_database_title(&self) -> Option<&str> {
        if self.block_type != "child_database" {
            return None;
        }
        self.content.get("child_database")?.get("title")?.as_str()
    }

    /// Target URL of an `embed` block, when it has one.
    pub fn embed_url(&self) -> Option<&str> {
        if self.block_type != "embed" {
            return None;
        }
        self.content
            .get("embed")?
            .get("url")?
            .as_str()
            .filter(|u| !u.is_empty())
    }
}

/// A database object as returned by `GET /databases/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub id: DatabaseId,
    #[serde(default)]
    pub properties: IndexMap<String, PropertySchema>,
}

/// One column of a database schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSchema {
    pub database_id: DatabaseId,
}

/// A page (database row) as returned by query, create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageObject {
    pub id: PageId,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageObject {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// Error body Notion sends with every non-2xx response.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
