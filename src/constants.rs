// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Property and database names are the ones the podcast workspace template
//! ships with. Renaming a column in Notion means changing it here.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100. We use the maximum to minimize
/// round-trips when exhausting a database.
pub const NOTION_API_PAGE_SIZE: u32 = 100;

/// Notion API version header sent with every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Base URL of the public Notion REST API.
pub const API_BASE_URL: &str = "https://api.notion.com/v1";

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Total attempts (first try included) for every network-calling operation.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Workspace vocabulary
// ---------------------------------------------------------------------------

/// Title property shared by every calendar database.
pub const TITLE_PROPERTY: &str = "标题";

/// Date-range property on calendar pages, also the episode publish date.
pub const DATE_PROPERTY: &str = "日期";

pub const DAY_PROPERTY: &str = "日";
pub const WEEK_PROPERTY: &str = "周";
pub const MONTH_PROPERTY: &str = "月";
pub const YEAR_PROPERTY: &str = "年";
pub const ALL_PROPERTY: &str = "全部";

/// Title of the single page in the "all" database every record links to.
pub const ALL_PAGE_TITLE: &str = "全部";

/// URL property added to the podcast and episode databases on startup.
pub const TONGYI_LINK_PROPERTY: &str = "通义链接";

/// External identifier properties used as record keys.
pub const PODCAST_ID_PROPERTY: &str = "Pid";
pub const EPISODE_ID_PROPERTY: &str = "Eid";

pub const LAST_UPDATED_PROPERTY: &str = "最后更新时间";
pub const LISTEN_DURATION_PROPERTY: &str = "收听时长";
pub const STATUS_PROPERTY: &str = "状态";
pub const LIKED_PROPERTY: &str = "喜欢";
pub const PROGRESS_PROPERTY: &str = "收听进度";
pub const TRANSCRIPTION_STATUS_PROPERTY: &str = "语音转文字状态";

// ---------------------------------------------------------------------------
// Icons and embeds
// ---------------------------------------------------------------------------

/// Icon of the single "all" page.
pub const TARGET_ICON_URL: &str = "https://www.notion.so/icons/target_red.svg";

/// Service rendering per-date calendar icons.
pub const DATE_ICON_BASE_URL: &str = "https://notion-icon.malinkang.com/";

/// Host of the listening heatmap embedded on the root page.
pub const HEATMAP_HOST: &str = "heatmap.malinkang.com";

// ---------------------------------------------------------------------------
// CI integration
// ---------------------------------------------------------------------------

/// Key written to the CI environment file for the day database.
pub const CI_DATABASE_ID_KEY: &str = "DATABASE_ID";
