// src/helper.rs
//! The sync helper: workspace discovery, calendar relations, queries.
//!
//! [`NotionHelper::initialize`] walks the root page once to learn where every
//! database lives. After that the helper hands out calendar page IDs
//! (creating pages on first use) and wraps the page/block operations the
//! ingestion pipeline needs, each one retried by the configured policy.

use crate::api::types::{
    BlockObject, DatabaseSchema, PageObject, PaginatedResponse, QueryRequest,
};
use crate::api::{collect_all_pages, NotionApi, NotionHttpClient};
use crate::cache::RelationCache;
use crate::calendar::CalendarPeriod;
use crate::config::{DatabaseNames, HelperConfig};
use crate::constants::{
    ALL_PAGE_TITLE, ALL_PROPERTY, CI_DATABASE_ID_KEY, DATE_PROPERTY, HEATMAP_HOST,
    NOTION_API_PAGE_SIZE, TARGET_ICON_URL, TITLE_PROPERTY, TONGYI_LINK_PROPERTY, YEAR_PROPERTY,
};
use crate::error::AppError;
use crate::error_recovery::{retry_with_policy, RetryPolicy};
use crate::properties::{self, PropertyMap};
use crate::records::{index_by_key, EpisodeRecord, PodcastRecord};
use crate::types::{BlockId, DatabaseId, PageId};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// What a walk of the root page found.
#[derive(Debug, Default, Clone)]
pub struct Discovery {
    /// Inline database title → database ID, in discovery order.
    pub databases: IndexMap<String, DatabaseId>,
    /// The embed block showing the listening heatmap, if the page has one.
    pub heatmap_block: Option<BlockId>,
}

/// Database IDs the helper resolved during initialization.
#[derive(Debug, Clone)]
pub struct WorkspaceDatabases {
    pub podcast: Option<DatabaseId>,
    pub episode: DatabaseId,
    pub author: Option<DatabaseId>,
    pub mindmap: Option<DatabaseId>,
    /// Target of the episode database's `全部` relation.
    pub all: DatabaseId,
    pub day: DatabaseId,
    pub week: DatabaseId,
    pub month: DatabaseId,
    pub year: DatabaseId,
}

impl WorkspaceDatabases {
    /// Database holding the pages for `period`.
    pub fn calendar(&self, period: CalendarPeriod) -> &DatabaseId {
        match period {
            CalendarPeriod::Day => &self.day,
            CalendarPeriod::Week => &self.week,
            CalendarPeriod::Month => &self.month,
            CalendarPeriod::Year => &self.year,
        }
    }
}

/// Wraps a Notion client with the podcast workspace's conventions.
pub struct NotionHelper {
    api: Arc<dyn NotionApi>,
    retry: RetryPolicy,
    root_page: PageId,
    names: DatabaseNames,
    discovery: Discovery,
    episode_schema: DatabaseSchema,
    databases: WorkspaceDatabases,
    cache: RelationCache,
}

impl NotionHelper {
    /// Builds an HTTP client from `config` and initializes against it.
    pub async fn connect(config: HelperConfig) -> Result<Self, AppError> {
        let client = NotionHttpClient::new(&config.api_key)?;
        Self::initialize(Arc::new(client), config).await
    }

    /// Discovers the workspace layout under the root page.
    ///
    /// Fails when the episode database is missing or its schema lacks one of
    /// the calendar relation properties.
    pub async fn initialize(
        api: Arc<dyn NotionApi>,
        config: HelperConfig,
    ) -> Result<Self, AppError> {
        let retry = config.retry;
        let names = config.database_names;
        log::info!("Scanning root page {} for databases", config.root_page);

        let discovery = discover(api.as_ref(), retry, &config.root_page.cast()).await?;
        log::info!(
            "Found {} database(s){}",
            discovery.databases.len(),
            if discovery.heatmap_block.is_some() {
                " and a heatmap block"
            } else {
                ""
            }
        );

        let lookup = |name: &str| discovery.databases.get(name).cloned();
        let episode = lookup(&names.episode)
            .ok_or_else(|| AppError::MissingDatabase(names.episode.clone()))?;

        let episode_schema =
            retry_with_policy(retry, || api.retrieve_database(&episode)).await?;

        let relation_target = |property: &str| relation_database(&episode_schema, property);
        let databases = WorkspaceDatabases {
            podcast: lookup(&names.podcast),
            author: lookup(&names.author),
            mindmap: lookup(&names.mindmap),
            day: relation_target(CalendarPeriod::Day.relation_property())?,
            week: relation_target(CalendarPeriod::Week.relation_property())?,
            month: relation_target(CalendarPeriod::Month.relation_property())?,
            year: relation_target(CalendarPeriod::Year.relation_property())?,
            all: relation_target(ALL_PROPERTY)?,
            episode,
        };

        if let Some(path) = &config.ci_env_file {
            write_ci_env(path, CI_DATABASE_ID_KEY, &databases.day.to_dashed()).await?;
        }

        let helper = Self {
            api,
            retry,
            root_page: config.root_page,
            names,
            discovery,
            episode_schema,
            databases,
            cache: RelationCache::new(),
        };

        if let Some(podcast) = helper.databases.podcast.clone() {
            helper.ensure_url_property(&podcast).await?;
        }
        let episode = helper.databases.episode.clone();
        helper.ensure_url_property(&episode).await?;

        Ok(helper)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn root_page(&self) -> &PageId {
        &self.root_page
    }

    pub fn database_names(&self) -> &DatabaseNames {
        &self.names
    }

    pub fn databases(&self) -> &WorkspaceDatabases {
        &self.databases
    }

    /// ID of any inline database under the root page, by title.
    pub fn database_id(&self, title: &str) -> Option<&DatabaseId> {
        self.discovery.databases.get(title)
    }

    pub fn heatmap_block(&self) -> Option<&BlockId> {
        self.discovery.heatmap_block.as_ref()
    }

    /// Property schema of the episode database as read at startup.
    pub fn episode_schema(&self) -> &DatabaseSchema {
        &self.episode_schema
    }

    pub fn cached_relation_count(&self) -> usize {
        self.cache.len()
    }

    fn podcast_database(&self) -> Result<&DatabaseId, AppError> {
        self.databases
            .podcast
            .as_ref()
            .ok_or_else(|| AppError::MissingDatabase(self.names.podcast.clone()))
    }

    // -----------------------------------------------------------------------
    // Schema maintenance
    // -----------------------------------------------------------------------

    /// Adds the `通义链接` URL column to `database` unless it already has one.
    ///
    /// Returns whether the schema was changed.
    pub async fn ensure_url_property(&self, database: &DatabaseId) -> Result<bool, AppError> {
        let api = self.api.as_ref();
        let schema = retry_with_policy(self.retry, || api.retrieve_database(database)).await?;

        let has_url_column = schema
            .properties
            .get(TONGYI_LINK_PROPERTY)
            .is_some_and(|p| p.property_type == "url");
        if has_url_column {
            return Ok(false);
        }

        log::info!("Adding '{}' to database {}", TONGYI_LINK_PROPERTY, schema.id);
        let body = json!({ "properties": { TONGYI_LINK_PROPERTY: { "url": {} } } });
        retry_with_policy(self.retry, || api.update_database(&schema.id, &body)).await?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Calendar relations
    // -----------------------------------------------------------------------

    /// Returns the page titled `name` in `database`, creating it if needed.
    ///
    /// `properties` and `icon` are only used when the page has to be created.
    /// Results are cached per (database, title) for the helper's lifetime, so
    /// repeated calls issue at most one create.
    pub async fn get_relation_id(
        &mut self,
        name: &str,
        database: &DatabaseId,
        icon: &str,
        mut properties: PropertyMap,
    ) -> Result<PageId, AppError> {
        if let Some(page) = self.cache.get(database, name) {
            return Ok(page.clone());
        }

        let api = self.api.as_ref();
        let request = QueryRequest::new().filter(json!({
            "property": TITLE_PROPERTY,
            "title": { "equals": name }
        }));
        let existing = retry_with_policy(self.retry, || api.query_database(database, &request))
            .await?
            .results
            .into_iter()
            .next();

        let page_id = match existing {
            Some(page) => page.id,
            None => {
                properties.insert(TITLE_PROPERTY.to_string(), properties::title(name));
                let body = json!({
                    "parent": { "database_id": database.to_dashed(), "type": "database_id" },
                    "properties": properties,
                    "icon": properties::external_icon(icon),
                });
                let created = retry_with_policy(self.retry, || api.create_page(&body)).await?;
                log::info!("Created '{}' in database {}", name, database);
                created.id
            }
        };

        self.cache.insert(database.clone(), name, page_id.clone());
        Ok(page_id)
    }

    pub async fn get_year_relation_id(&mut self, date: NaiveDate) -> Result<PageId, AppError> {
        self.calendar_relation_id(CalendarPeriod::Year, date, PropertyMap::new())
            .await
    }

    /// The month page also links to its year page.
    pub async fn get_month_relation_id(&mut self, date: NaiveDate) -> Result<PageId, AppError> {
        let year = self.get_year_relation_id(date).await?;
        let mut extra = PropertyMap::new();
        extra.insert(YEAR_PROPERTY.to_string(), properties::relation(&[year]));
        self.calendar_relation_id(CalendarPeriod::Month, date, extra)
            .await
    }

    pub async fn get_week_relation_id(&mut self, date: NaiveDate) -> Result<PageId, AppError> {
        self.calendar_relation_id(CalendarPeriod::Week, date, PropertyMap::new())
            .await
    }

    /// `extra` lets callers stamp additional properties on a newly created day page.
    pub async fn get_day_relation_id(
        &mut self,
        date: NaiveDate,
        extra: PropertyMap,
    ) -> Result<PageId, AppError> {
        self.calendar_relation_id(CalendarPeriod::Day, date, extra)
            .await
    }

    /// The single page of the "all" database.
    pub async fn get_all_relation_id(&mut self) -> Result<PageId, AppError> {
        let database = self.databases.all.clone();
        self.get_relation_id(ALL_PAGE_TITLE, &database, TARGET_ICON_URL, PropertyMap::new())
            .await
    }

    async fn calendar_relation_id(
        &mut self,
        period: CalendarPeriod,
        date: NaiveDate,
        mut properties: PropertyMap,
    ) -> Result<PageId, AppError> {
        let (start, end) = period.range(date);
        let range = if period == CalendarPeriod::Day {
            properties::date(start, None)
        } else {
            properties::date(start, Some(end))
        };
        properties.insert(DATE_PROPERTY.to_string(), range);

        let database = self.databases.calendar(period).clone();
        let label = period.label(date);
        let icon = period.icon_url(date);
        self.get_relation_id(&label, &database, &icon, properties)
            .await
    }

    /// Fills the 年/月/周/日 relation properties for `date`.
    pub async fn add_date_relations(
        &mut self,
        target: &mut PropertyMap,
        date: NaiveDate,
    ) -> Result<(), AppError> {
        let year = self.get_year_relation_id(date).await?;
        let month = self.get_month_relation_id(date).await?;
        let week = self.get_week_relation_id(date).await?;
        let day = self.get_day_relation_id(date, PropertyMap::new()).await?;

        for (period, id) in [
            (CalendarPeriod::Year, year),
            (CalendarPeriod::Month, month),
            (CalendarPeriod::Week, week),
            (CalendarPeriod::Day, day),
        ] {
            target.insert(
                period.relation_property().to_string(),
                properties::relation(&[id]),
            );
        }
        Ok(())
    }

    /// Fills the `全部` relation property.
    pub async fn add_all_relation(&mut self, target: &mut PropertyMap) -> Result<(), AppError> {
        let all = self.get_all_relation_id().await?;
        target.insert(ALL_PROPERTY.to_string(), properties::relation(&[all]));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// A single query request; the caller handles the cursor.
    pub async fn query(
        &self,
        database: &DatabaseId,
        request: QueryRequest,
    ) -> Result<PaginatedResponse<PageObject>, AppError> {
        let api = self.api.as_ref();
        retry_with_policy(self.retry, || api.query_database(database, &request)).await
    }

    /// Every row of `database`, in the API's default order.
    pub async fn query_all(&self, database: &DatabaseId) -> Result<Vec<PageObject>, AppError> {
        self.query_all_with(database, QueryRequest::new()).await
    }

    /// Every row of `database` matching `filter`, ordered by `sorts`.
    ///
    /// `Value::Null` for either argument leaves it out of the request.
    pub async fn query_all_by_filter(
        &self,
        database: &DatabaseId,
        filter: Value,
        sorts: Value,
    ) -> Result<Vec<PageObject>, AppError> {
        self.query_all_with(database, QueryRequest::new().filter(filter).sorts(sorts))
            .await
    }

    async fn query_all_with(
        &self,
        database: &DatabaseId,
        base: QueryRequest,
    ) -> Result<Vec<PageObject>, AppError> {
        let api = self.api.as_ref();
        let retry = self.retry;
        let base = base.page_size(NOTION_API_PAGE_SIZE);
        let base = &base;

        collect_all_pages(|cursor| async move {
            let request = base.clone().start_cursor(cursor);
            retry_with_policy(retry, || api.query_database(database, &request)).await
        })
        .await
    }

    /// All podcasts keyed by `Pid`.
    pub async fn get_all_podcasts(&self) -> Result<IndexMap<String, PodcastRecord>, AppError> {
        let database = self.podcast_database()?;
        let pages = self.query_all(database).await?;
        Ok(index_by_key(&pages))
    }

    /// All episodes keyed by `Eid`.
    pub async fn get_all_episodes(&self) -> Result<IndexMap<String, EpisodeRecord>, AppError> {
        let pages = self.query_all(&self.databases.episode).await?;
        Ok(index_by_key(&pages))
    }

    // -----------------------------------------------------------------------
    // Pages and blocks
    // -----------------------------------------------------------------------

    /// Creates a page; `icon` doubles as the cover.
    pub async fn create_page(
        &self,
        parent: Value,
        properties: PropertyMap,
        icon: Value,
    ) -> Result<PageObject, AppError> {
        let body = json!({
            "parent": parent,
            "properties": properties,
            "icon": icon,
            "cover": icon,
        });
        let api = self.api.as_ref();
        retry_with_policy(self.retry, || api.create_page(&body)).await
    }

    pub async fn update_page(
        &self,
        page: &PageId,
        properties: PropertyMap,
    ) -> Result<PageObject, AppError> {
        let body = json!({ "properties": properties });
        let api = self.api.as_ref();
        retry_with_policy(self.retry, || api.update_page(page, &body)).await
    }

    /// Every child of `block`, across all result pages.
    pub async fn get_block_children(
        &self,
        block: &BlockId,
    ) -> Result<Vec<BlockObject>, AppError> {
        block_children(self.api.as_ref(), self.retry, block).await
    }

    pub async fn append_blocks(
        &self,
        block: &BlockId,
        children: Vec<Value>,
    ) -> Result<Value, AppError> {
        let body = json!({ "children": children });
        let api = self.api.as_ref();
        retry_with_policy(self.retry, || api.append_block_children(block, &body)).await
    }

    /// Appends `children` right after the sibling `after`.
    pub async fn append_blocks_after(
        &self,
        block: &BlockId,
        children: Vec<Value>,
        after: &BlockId,
    ) -> Result<Value, AppError> {
        let body = json!({ "children": children, "after": after.to_dashed() });
        let api = self.api.as_ref();
        retry_with_policy(self.retry, || api.append_block_children(block, &body)).await
    }

    pub async fn delete_block(&self, block: &BlockId) -> Result<Value, AppError> {
        let api = self.api.as_ref();
        retry_with_policy(self.retry, || api.delete_block(block)).await
    }

    /// Points the heatmap embed at a freshly rendered URL.
    pub async fn update_heatmap(&self, block: &BlockId, url: &str) -> Result<Value, AppError> {
        let body = json!({ "embed": { "url": url } });
        let api = self.api.as_ref();
        retry_with_policy(self.retry, || api.update_block(block, &body)).await
    }

    pub async fn update_image_block_link(
        &self,
        block: &BlockId,
        image_url: &str,
    ) -> Result<Value, AppError> {
        let body = json!({ "image": { "external": { "url": image_url } } });
        let api = self.api.as_ref();
        retry_with_policy(self.retry, || api.update_block(block, &body)).await
    }
}

/// Walks `root` depth-first, recording inline databases and the heatmap embed.
///
/// Blocks are visited in document order. A database title seen twice keeps
/// the later ID; the last heatmap embed wins.
pub async fn discover(
    api: &dyn NotionApi,
    retry: RetryPolicy,
    root: &BlockId,
) -> Result<Discovery, AppError> {
    let mut discovery = Discovery::default();
    let mut pending = vec![block_children(api, retry, root).await?.into_iter()];

    while let Some(level) = pending.last_mut() {
        let Some(child) = level.next() else {
            pending.pop();
            continue;
        };

        if let Some(title) = child.child_database_title() {
            let id: DatabaseId = child.id.cast();
            log::debug!("Database '{}' -> {}", title, id);
            if let Some(previous) = discovery.databases.insert(title.to_string(), id) {
                log::warn!("Database title '{}' appears twice, replacing {}", title, previous);
            }
        } else if child.embed_url().is_some_and(is_heatmap_url) {
            log::debug!("Heatmap embed -> {}", child.id);
            discovery.heatmap_block = Some(child.id.clone());
        }

        if child.has_children {
            let nested = block_children(api, retry, &child.id).await?;
            pending.push(nested.into_iter());
        }
    }

    Ok(discovery)
}

async fn block_children(
    api: &dyn NotionApi,
    retry: RetryPolicy,
    block: &BlockId,
) -> Result<Vec<BlockObject>, AppError> {
    collect_all_pages(|cursor| async move {
        retry_with_policy(retry, || api.list_block_children(block, cursor.as_deref())).await
    })
    .await
}

fn is_heatmap_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| u.scheme() == "https" && u.host_str() == Some(HEATMAP_HOST))
        .unwrap_or(false)
}

/// Target database of a relation property in `schema`.
fn relation_database(schema: &DatabaseSchema, property: &str) -> Result<DatabaseId, AppError> {
    let column = schema
        .properties
        .get(property)
        .ok_or_else(|| AppError::SchemaMismatch {
            property: property.to_string(),
            reason: format!("missing from database {}", schema.id),
        })?;
    column
        .relation
        .as_ref()
        .map(|r| r.database_id.clone())
        .ok_or_else(|| AppError::SchemaMismatch {
            property: property.to_string(),
            reason: format!("expected a relation, found '{}'", column.property_type),
        })
}

/// Appends `key=value` to the CI environment file.
async fn write_ci_env(path: &Path, key: &str, value: &str) -> Result<(), AppError> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{}={}\n", key, value).as_bytes())
        .await?;
    file.flush().await?;
    log::info!("Wrote {} to {}", key, path.display());
    Ok(())
}
