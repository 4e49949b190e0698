// tests/common/mod.rs
//! In-memory Notion workspace for driving the helper without HTTP.
//!
//! Every call is recorded so tests can assert on request bodies and counts.
//! Failures can be queued per operation to exercise the retry path.

#![allow(dead_code)]

use async_trait::async_trait;
use podcast2notion::api::types::{
    BlockObject, DatabaseSchema, PageObject, PaginatedResponse, QueryRequest,
};
use podcast2notion::{
    ApiKey, AppError, BlockId, DatabaseId, DatabaseNames, HelperConfig, NotionApi,
    NotionErrorCode, PageId, RetryPolicy,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A 32-hex-digit ID built from a small number.
pub fn id(n: u32) -> String {
    format!("{:032x}", n)
}

pub fn dashed(n: u32) -> String {
    DatabaseId::parse(&id(n)).unwrap().to_dashed()
}

pub const ROOT: u32 = 1;
pub const PODCAST_DB: u32 = 20;
pub const EPISODE_DB: u32 = 21;
pub const ALL_DB: u32 = 22;
pub const AUTHOR_DB: u32 = 23;
pub const DAY_DB: u32 = 30;
pub const WEEK_DB: u32 = 31;
pub const MONTH_DB: u32 = 32;
pub const YEAR_DB: u32 = 33;
pub const HEATMAP_BLOCK: u32 = 12;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RetrieveDatabase(String),
    UpdateDatabase(String, Value),
    QueryDatabase(String, Value),
    CreatePage(Value),
    UpdatePage(String, Value),
    ListChildren(String, Option<String>),
    AppendChildren(String, Value),
    UpdateBlock(String, Value),
    DeleteBlock(String),
}

#[derive(Default)]
struct State {
    children: HashMap<String, Vec<Value>>,
    schemas: HashMap<String, Value>,
    rows: HashMap<String, Vec<Value>>,
    failures: HashMap<&'static str, u32>,
    calls: Vec<Call>,
    next_id: u32,
}

pub struct FakeNotion {
    state: Mutex<State>,
    page_size: usize,
}

impl FakeNotion {
    /// An empty workspace that returns at most `page_size` items per list call.
    pub fn new(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 0x1000,
                ..State::default()
            }),
            page_size,
        }
    }

    pub fn add_block(&self, parent: u32, block: Value) {
        let mut state = self.state.lock().unwrap();
        state.children.entry(id(parent)).or_default().push(block);
    }

    pub fn set_schema(&self, database: u32, properties: Value) {
        let mut state = self.state.lock().unwrap();
        state.schemas.insert(
            id(database),
            json!({ "object": "database", "id": id(database), "properties": properties }),
        );
    }

    /// Adds a row and returns its undashed ID.
    pub fn add_row(&self, database: u32, properties: Value) -> String {
        let mut state = self.state.lock().unwrap();
        let page_id = next_id(&mut state);
        state
            .rows
            .entry(id(database))
            .or_default()
            .push(json!({ "object": "page", "id": page_id, "properties": properties }));
        page_id
    }

    pub fn rows(&self, database: u32) -> Vec<Value> {
        let state = self.state.lock().unwrap();
        state.rows.get(&id(database)).cloned().unwrap_or_default()
    }

    /// The next `times` calls to `operation` fail with a 503.
    pub fn fail_next(&self, operation: &'static str, times: u32) {
        self.state.lock().unwrap().failures.insert(operation, times);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn creates(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreatePage(body) => Some(body),
                _ => None,
            })
            .collect()
    }

    fn begin(
        &self,
        operation: &'static str,
        call: Call,
    ) -> Result<MutexGuard<'_, State>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if let Some(remaining) = state.failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AppError::NotionService {
                    code: NotionErrorCode::ServiceUnavailable,
                    message: format!("{} unavailable", operation),
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                });
            }
        }
        Ok(state)
    }

    fn page_of<T: DeserializeOwned>(
        &self,
        items: Vec<Value>,
        cursor: Option<&str>,
    ) -> Result<PaginatedResponse<T>, AppError> {
        let total = items.len();
        let start = cursor.and_then(|c| c.parse::<usize>().ok()).unwrap_or(0);
        let end = (start + self.page_size).min(total);
        let results = items
            .into_iter()
            .skip(start)
            .take(end.saturating_sub(start))
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(if end < total {
            PaginatedResponse::with_more(results, end.to_string())
        } else {
            PaginatedResponse::last(results)
        })
    }
}

fn next_id(state: &mut State) -> String {
    state.next_id += 1;
    id(state.next_id)
}

fn not_found(what: &str) -> AppError {
    AppError::NotionService {
        code: NotionErrorCode::ObjectNotFound,
        message: format!("Could not find {}", what),
        status: reqwest::StatusCode::NOT_FOUND,
    }
}

fn title_text(properties: &Value, name: &str) -> Option<String> {
    let items = properties.get(name)?.get("title")?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|t| {
                t.get("plain_text")
                    .or_else(|| t.pointer("/text/content"))
                    .and_then(Value::as_str)
            })
            .collect(),
    )
}

fn undashed(raw: &str) -> String {
    raw.replace('-', "")
}

#[async_trait]
impl NotionApi for FakeNotion {
    async fn retrieve_database(&self, db: &DatabaseId) -> Result<DatabaseSchema, AppError> {
        let state = self.begin(
            "retrieve_database",
            Call::RetrieveDatabase(db.as_str().to_string()),
        )?;
        let schema = state
            .schemas
            .get(db.as_str())
            .cloned()
            .ok_or_else(|| not_found("database"))?;
        Ok(serde_json::from_value(schema)?)
    }

    async fn update_database(&self, db: &DatabaseId, body: &Value) -> Result<Value, AppError> {
        let mut state = self.begin(
            "update_database",
            Call::UpdateDatabase(db.as_str().to_string(), body.clone()),
        )?;
        let schema = state
            .schemas
            .get_mut(db.as_str())
            .ok_or_else(|| not_found("database"))?;
        let added = body
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (name, config) in added {
            let kind = config
                .as_object()
                .and_then(|c| c.keys().next().cloned())
                .unwrap_or_default();
            let mut column = Map::new();
            column.insert("id".to_string(), json!(name));
            column.insert("type".to_string(), json!(kind));
            schema["properties"][name.as_str()] = Value::Object(column);
        }
        Ok(schema.clone())
    }

    async fn query_database(
        &self,
        db: &DatabaseId,
        request: &QueryRequest,
    ) -> Result<PaginatedResponse<PageObject>, AppError> {
        let state = self.begin(
            "query_database",
            Call::QueryDatabase(db.as_str().to_string(), serde_json::to_value(request)?),
        )?;
        let rows = state.rows.get(db.as_str()).cloned().unwrap_or_default();
        drop(state);

        let title_filter = request.filter.as_ref().and_then(|f| {
            let property = f.get("property")?.as_str()?.to_string();
            let wanted = f.pointer("/title/equals")?.as_str()?.to_string();
            Some((property, wanted))
        });
        let rows = match title_filter {
            Some((property, wanted)) => rows
                .into_iter()
                .filter(|row| {
                    title_text(&row["properties"], &property).as_deref() == Some(wanted.as_str())
                })
                .collect(),
            None => rows,
        };
        self.page_of(rows, request.start_cursor.as_deref())
    }

    async fn create_page(&self, body: &Value) -> Result<PageObject, AppError> {
        let mut state = self.begin("create_page", Call::CreatePage(body.clone()))?;
        let page_id = next_id(&mut state);
        let page = json!({
            "object": "page",
            "id": page_id,
            "properties": body.get("properties").cloned().unwrap_or_else(|| json!({})),
        });
        if let Some(parent) = body.pointer("/parent/database_id").and_then(Value::as_str) {
            state
                .rows
                .entry(undashed(parent))
                .or_default()
                .push(page.clone());
        }
        Ok(serde_json::from_value(page)?)
    }

    async fn update_page(&self, page: &PageId, body: &Value) -> Result<PageObject, AppError> {
        let _state = self.begin(
            "update_page",
            Call::UpdatePage(page.as_str().to_string(), body.clone()),
        )?;
        Ok(serde_json::from_value(json!({
            "id": page.as_str(),
            "properties": body.get("properties").cloned().unwrap_or_else(|| json!({})),
        }))?)
    }

    async fn list_block_children(
        &self,
        block: &BlockId,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedResponse<BlockObject>, AppError> {
        let state = self.begin(
            "list_block_children",
            Call::ListChildren(block.as_str().to_string(), start_cursor.map(str::to_string)),
        )?;
        let children = state.children.get(block.as_str()).cloned().unwrap_or_default();
        drop(state);
        self.page_of(children, start_cursor)
    }

    async fn append_block_children(&self, block: &BlockId, body: &Value) -> Result<Value, AppError> {
        let _state = self.begin(
            "append_block_children",
            Call::AppendChildren(block.as_str().to_string(), body.clone()),
        )?;
        Ok(json!({ "object": "list", "results": [] }))
    }

    async fn update_block(&self, block: &BlockId, body: &Value) -> Result<Value, AppError> {
        let _state = self.begin(
            "update_block",
            Call::UpdateBlock(block.as_str().to_string(), body.clone()),
        )?;
        Ok(json!({ "object": "block", "id": block.to_dashed() }))
    }

    async fn delete_block(&self, block: &BlockId) -> Result<Value, AppError> {
        let _state =
            self.begin("delete_block", Call::DeleteBlock(block.as_str().to_string()))?;
        Ok(json!({ "object": "block", "id": block.to_dashed(), "archived": true }))
    }
}

// ---------------------------------------------------------------------------
// Block and schema fixtures
// ---------------------------------------------------------------------------

pub fn paragraph(n: u32) -> Value {
    json!({ "object": "block", "id": id(n), "type": "paragraph", "has_children": false, "paragraph": {} })
}

pub fn container(n: u32, kind: &str) -> Value {
    json!({ "object": "block", "id": id(n), "type": kind, "has_children": true, kind: {} })
}

pub fn child_database(n: u32, title: &str) -> Value {
    json!({
        "object": "block",
        "id": id(n),
        "type": "child_database",
        "has_children": false,
        "child_database": { "title": title }
    })
}

pub fn embed(n: u32, url: &str) -> Value {
    json!({ "object": "block", "id": id(n), "type": "embed", "has_children": false, "embed": { "url": url } })
}

fn relation_column(target: u32) -> Value {
    json!({ "id": format!("rel{}", target), "type": "relation", "relation": { "database_id": id(target) } })
}

/// Episode schema with every calendar relation but no `通义链接` column.
pub fn episode_properties() -> Value {
    json!({
        "标题": { "id": "title", "type": "title", "title": {} },
        "Eid": { "id": "eid", "type": "rich_text", "rich_text": {} },
        "日期": { "id": "date", "type": "date", "date": {} },
        "日": relation_column(DAY_DB),
        "周": relation_column(WEEK_DB),
        "月": relation_column(MONTH_DB),
        "年": relation_column(YEAR_DB),
        "全部": relation_column(ALL_DB),
    })
}

/// Root page layout the podcast template ships with.
///
/// The podcast and episode databases sit two levels down inside columns;
/// the heatmap embed and the remaining databases are top level.
pub fn workspace(names: &DatabaseNames, page_size: usize) -> Arc<FakeNotion> {
    let fake = FakeNotion::new(page_size);

    fake.add_block(ROOT, paragraph(10));
    fake.add_block(ROOT, container(11, "column_list"));
    fake.add_block(ROOT, embed(HEATMAP_BLOCK, "https://heatmap.malinkang.com/?image=abc"));
    fake.add_block(ROOT, child_database(ALL_DB, &names.all));
    fake.add_block(ROOT, child_database(AUTHOR_DB, &names.author));
    fake.add_block(11, container(13, "column"));
    fake.add_block(13, child_database(PODCAST_DB, &names.podcast));
    fake.add_block(13, child_database(EPISODE_DB, &names.episode));

    fake.set_schema(
        PODCAST_DB,
        json!({
            "标题": { "id": "title", "type": "title", "title": {} },
            "通义链接": { "id": "link", "type": "url", "url": {} },
        }),
    );
    fake.set_schema(EPISODE_DB, episode_properties());

    Arc::new(fake)
}

pub fn standard_workspace() -> Arc<FakeNotion> {
    workspace(&DatabaseNames::default(), 100)
}

/// Helper configuration for the fake workspace, retrying without delay.
pub fn config() -> HelperConfig {
    HelperConfig::new(
        ApiKey::new("ntn_integration_test_token").unwrap(),
        PageId::parse(&id(ROOT)).unwrap(),
    )
    .with_retry(RetryPolicy::immediate(3))
}

/// A text property in the shape queries return.
pub fn text_property(value: &str) -> Value {
    json!({ "type": "rich_text", "rich_text": [{ "plain_text": value }] })
}

pub fn title_property(value: &str) -> Value {
    json!({ "type": "title", "title": [{ "plain_text": value }] })
}
