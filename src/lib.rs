// src/lib.rs
//! podcast2notion library. Keeps a Notion podcast workspace in sync.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Helper**: `NotionHelper`, the entry point for the sync pipeline
//! - **Error handling**: `AppError`, `NotionErrorCode`, `ValidationError`
//! - **Configuration**: `HelperConfig`, `DatabaseNames`, `RetryPolicy`
//! - **Domain types**: `PageId`, `DatabaseId`, `BlockId`, `ApiKey`
//! - **API client**: `NotionApi`, `NotionHttpClient`, wire types
//! - **Calendar & properties**: `CalendarPeriod`, property builders, `PropertyValue`
//! - **Records**: `PodcastRecord`, `EpisodeRecord`

pub mod api;
pub mod cache;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod helper;
pub mod logging;
pub mod properties;
pub mod records;
pub mod types;

// --- Helper ---
pub use crate::helper::{discover, Discovery, NotionHelper, WorkspaceDatabases};

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{DatabaseNames, HelperConfig};
pub use crate::error_recovery::{retry_with_policy, RetryPolicy};
pub use crate::logging::init_logging;

// --- Domain Types ---
pub use crate::types::{ApiKey, BlockId, DatabaseId, PageId};

// --- API Client ---
pub use crate::api::types::{
    BlockObject, DatabaseSchema, PageObject, PaginatedResponse, PropertySchema, QueryRequest,
};
pub use crate::api::{collect_all_pages, NotionApi, NotionHttpClient};

// --- Calendar, Properties, Records ---
pub use crate::cache::RelationCache;
pub use crate::calendar::CalendarPeriod;
pub use crate::properties::{PropertyMap, PropertyValue};
pub use crate::records::{EpisodeRecord, PodcastRecord, Record};
