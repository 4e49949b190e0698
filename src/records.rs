// src/records.rs
//! Projections of podcast and episode rows, keyed by their external IDs.
//!
//! The sync pipeline loads these once per run to decide which rows need an
//! update and which are new.

use crate::api::types::PageObject;
use crate::constants::{
    DATE_PROPERTY, EPISODE_ID_PROPERTY, LAST_UPDATED_PROPERTY, LIKED_PROPERTY,
    LISTEN_DURATION_PROPERTY, PODCAST_ID_PROPERTY, PROGRESS_PROPERTY, STATUS_PROPERTY,
    TONGYI_LINK_PROPERTY, TRANSCRIPTION_STATUS_PROPERTY,
};
use crate::properties::PropertyValue;
use crate::types::PageId;
use indexmap::IndexMap;
use serde::Serialize;

/// A database row type with an external-ID property.
pub trait Record: Sized {
    /// Property holding the external identifier.
    const KEY_PROPERTY: &'static str;

    fn from_page(page: &PageObject) -> Self;
}

/// A row of the podcast database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PodcastRecord {
    pub page_id: PageId,
    pub last_updated: PropertyValue,
    pub listen_duration: PropertyValue,
    pub tongyi_link: PropertyValue,
}

impl Record for PodcastRecord {
    const KEY_PROPERTY: &'static str = PODCAST_ID_PROPERTY;

    fn from_page(page: &PageObject) -> Self {
        let read = |name| PropertyValue::from_json(page.property(name));
        Self {
            page_id: page.id.clone(),
            last_updated: read(LAST_UPDATED_PROPERTY),
            listen_duration: read(LISTEN_DURATION_PROPERTY),
            tongyi_link: read(TONGYI_LINK_PROPERTY),
        }
    }
}

/// A row of the episode database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeRecord {
    pub page_id: PageId,
    pub status: PropertyValue,
    pub liked: PropertyValue,
    pub progress: PropertyValue,
    pub transcription_status: PropertyValue,
    pub tongyi_link: PropertyValue,
    pub date: PropertyValue,
}

impl Record for EpisodeRecord {
    const KEY_PROPERTY: &'static str = EPISODE_ID_PROPERTY;

    fn from_page(page: &PageObject) -> Self {
        let read = |name| PropertyValue::from_json(page.property(name));
        Self {
            page_id: page.id.clone(),
            status: read(STATUS_PROPERTY),
            liked: read(LIKED_PROPERTY),
            progress: read(PROGRESS_PROPERTY),
            transcription_status: read(TRANSCRIPTION_STATUS_PROPERTY),
            tongyi_link: read(TONGYI_LINK_PROPERTY),
            date: read(DATE_PROPERTY),
        }
    }
}

/// Indexes rows by external ID, in query order.
///
/// Rows without a usable ID are skipped. When two rows share an ID the later
/// one wins but keeps the first one's position.
pub fn index_by_key<R: Record>(pages: &[PageObject]) -> IndexMap<String, R> {
    let mut index = IndexMap::with_capacity(pages.len());
    for page in pages {
        match PropertyValue::from_json(page.property(R::KEY_PROPERTY)).as_key() {
            Some(key) => {
                if index.insert(key.clone(), R::from_page(page)).is_some() {
                    log::warn!("Duplicate {} '{}' in database", R::KEY_PROPERTY, key);
                }
            }
            None => log::debug!("Skipping page {} without {}", page.id, R::KEY_PROPERTY),
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn page(id: &str, properties: serde_json::Value) -> PageObject {
        serde_json::from_value(json!({ "id": id, "properties": properties })).unwrap()
    }

    fn text(s: &str) -> serde_json::Value {
        json!({ "type": "rich_text", "rich_text": [{ "plain_text": s }] })
    }

    #[test]
    fn projects_episode_fields() {
        let pages = vec![page(
            "550e8400e29b41d4a716446655440000",
            json!({
                "Eid": text("e-1"),
                "状态": { "type": "status", "status": { "name": "听过" } },
                "喜欢": { "type": "checkbox", "checkbox": true },
                "收听进度": { "type": "number", "number": 0.5 },
                "日期": { "type": "date", "date": { "start": "2024-03-07" } }
            }),
        )];

        let episodes: IndexMap<String, EpisodeRecord> = index_by_key(&pages);
        let episode = &episodes["e-1"];
        assert_eq!(episode.page_id.as_str(), "550e8400e29b41d4a716446655440000");
        assert_eq!(episode.status, PropertyValue::Text("听过".to_string()));
        assert_eq!(episode.liked.as_bool(), Some(true));
        assert_eq!(episode.progress.as_number(), Some(0.5));
        assert_eq!(episode.date.as_date_start(), Some("2024-03-07"));
        assert!(episode.transcription_status.is_empty());
        assert!(episode.tongyi_link.is_empty());
    }

    #[test]
    fn keeps_query_order_and_skips_keyless_rows() {
        let pages = vec![
            page("00000000000000000000000000000002", json!({ "Pid": text("b") })),
            page("00000000000000000000000000000003", json!({})),
            page("00000000000000000000000000000001", json!({ "Pid": text("a") })),
        ];

        let podcasts: IndexMap<String, PodcastRecord> = index_by_key(&pages);
        assert_eq!(podcasts.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn duplicate_key_keeps_latest_row() {
        let pages = vec![
            page("00000000000000000000000000000001", json!({ "Pid": text("a") })),
            page("00000000000000000000000000000002", json!({ "Pid": text("a") })),
        ];

        let podcasts: IndexMap<String, PodcastRecord> = index_by_key(&pages);
        assert_eq!(podcasts.len(), 1);
        assert_eq!(
            podcasts["a"].page_id.as_str(),
            "00000000000000000000000000000002"
        );
    }
}
