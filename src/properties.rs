// src/properties.rs
//! Page property payloads, in both directions.
//!
//! Builders produce the JSON Notion expects when creating or updating pages.
//! [`PropertyValue::from_json`] goes the other way, flattening whatever a
//! query returned into a small typed value.

use crate::types::PageId;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Property name → property payload, as sent in `properties`.
pub type PropertyMap = Map<String, Value>;

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

fn text_items(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

pub fn title(content: &str) -> Value {
    json!({ "title": text_items(content) })
}

pub fn rich_text(content: &str) -> Value {
    json!({ "rich_text": text_items(content) })
}

/// A date property; `end` makes it a range.
pub fn date(start: NaiveDate, end: Option<NaiveDate>) -> Value {
    json!({
        "date": {
            "start": start.format("%Y-%m-%d").to_string(),
            "end": end.map(|e| e.format("%Y-%m-%d").to_string()),
        }
    })
}

pub fn relation(ids: &[PageId]) -> Value {
    let items: Vec<Value> = ids.iter().map(|id| json!({ "id": id.to_dashed() })).collect();
    json!({ "relation": items })
}

pub fn url(link: &str) -> Value {
    json!({ "url": link })
}

pub fn number(value: f64) -> Value {
    json!({ "number": value })
}

pub fn checkbox(checked: bool) -> Value {
    json!({ "checkbox": checked })
}

pub fn select(name: &str) -> Value {
    json!({ "select": { "name": name } })
}

/// External icon object, also valid as a page cover.
pub fn external_icon(icon_url: &str) -> Value {
    json!({ "type": "external", "external": { "url": icon_url } })
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// A property value read back from a page, reduced to what the sync compares.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Empty,
    Text(String),
    Number(f64),
    Checkbox(bool),
    Date { start: String, end: Option<String> },
    /// Multi-select names, people, file URLs, relation IDs.
    List(Vec<String>),
}

impl PropertyValue {
    /// Reads a property object (`{"type": "...", "<type>": ...}`).
    ///
    /// Missing properties and unsupported types come back as `Empty`.
    pub fn from_json(property: Option<&Value>) -> Self {
        let Some(property) = property else {
            return Self::Empty;
        };
        let Some(kind) = property.get("type").and_then(Value::as_str) else {
            return Self::Empty;
        };
        let body = property.get(kind).unwrap_or(&Value::Null);

        match kind {
            "title" | "rich_text" => text_value(body),
            "number" => body.as_f64().map_or(Self::Empty, Self::Number),
            "checkbox" => body.as_bool().map_or(Self::Empty, Self::Checkbox),
            "url" | "email" | "phone_number" | "created_time" | "last_edited_time" => {
                non_empty_text(body.as_str())
            }
            "select" | "status" => non_empty_text(body.get("name").and_then(Value::as_str)),
            "multi_select" => list_of(body, |item| item.get("name")),
            "people" => list_of(body, |item| item.get("name").or_else(|| item.get("id"))),
            "relation" => list_of(body, |item| item.get("id")),
            "files" => list_of(body, |item| {
                item.get("external")
                    .or_else(|| item.get("file"))
                    .and_then(|f| f.get("url"))
            }),
            "date" => date_value(body),
            "formula" => formula_value(body),
            "rollup" => rollup_value(body),
            "unique_id" => unique_id_value(body),
            other => {
                log::debug!("Unsupported property type '{}'", other);
                Self::Empty
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Checkbox(b) => Some(*b),
            _ => None,
        }
    }

    /// Start of a date value.
    pub fn as_date_start(&self) -> Option<&str> {
        match self {
            Self::Date { start, .. } => Some(start),
            _ => None,
        }
    }

    /// String form suitable as a lookup key (`Pid`, `Eid`).
    ///
    /// Whole numbers render without a fractional part.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => Some(format!("{}", *n as i64)),
            Self::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn non_empty_text(text: Option<&str>) -> PropertyValue {
    match text {
        Some(t) if !t.is_empty() => PropertyValue::Text(t.to_string()),
        _ => PropertyValue::Empty,
    }
}

/// Concatenates the plain text of a rich-text array.
fn text_value(items: &Value) -> PropertyValue {
    let text: String = items
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| {
            item.get("plain_text")
                .or_else(|| item.get("text").and_then(|t| t.get("content")))
                .and_then(Value::as_str)
        })
        .collect();
    non_empty_text(Some(&text))
}

fn list_of<'a, F>(items: &'a Value, pick: F) -> PropertyValue
where
    F: Fn(&'a Value) -> Option<&'a Value>,
{
    let values: Vec<String> = items
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|item| pick(item).and_then(Value::as_str).map(str::to_string))
        .collect();
    PropertyValue::List(values)
}

fn date_value(body: &Value) -> PropertyValue {
    match body.get("start").and_then(Value::as_str) {
        Some(start) => PropertyValue::Date {
            start: start.to_string(),
            end: body.get("end").and_then(Value::as_str).map(str::to_string),
        },
        None => PropertyValue::Empty,
    }
}

fn formula_value(body: &Value) -> PropertyValue {
    match body.get("type").and_then(Value::as_str) {
        Some("string") => non_empty_text(body.get("string").and_then(Value::as_str)),
        Some("number") => body
            .get("number")
            .and_then(Value::as_f64)
            .map_or(PropertyValue::Empty, PropertyValue::Number),
        Some("boolean") => body
            .get("boolean")
            .and_then(Value::as_bool)
            .map_or(PropertyValue::Empty, PropertyValue::Checkbox),
        Some("date") => date_value(body.get("date").unwrap_or(&Value::Null)),
        _ => PropertyValue::Empty,
    }
}

fn rollup_value(body: &Value) -> PropertyValue {
    match body.get("type").and_then(Value::as_str) {
        Some("number") => body
            .get("number")
            .and_then(Value::as_f64)
            .map_or(PropertyValue::Empty, PropertyValue::Number),
        Some("date") => date_value(body.get("date").unwrap_or(&Value::Null)),
        Some("array") => {
            let values: Vec<String> = body
                .get("array")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|item| match PropertyValue::from_json(Some(item)) {
                    PropertyValue::Text(t) => Some(t),
                    PropertyValue::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect();
            PropertyValue::List(values)
        }
        _ => PropertyValue::Empty,
    }
}

fn unique_id_value(body: &Value) -> PropertyValue {
    let Some(number) = body.get("number").and_then(Value::as_i64) else {
        return PropertyValue::Empty;
    };
    match body.get("prefix").and_then(Value::as_str) {
        Some(prefix) if !prefix.is_empty() => PropertyValue::Text(format!("{}-{}", prefix, number)),
        _ => PropertyValue::Number(number as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builders_produce_notion_payloads() {
        assert_eq!(
            title("2024"),
            json!({ "title": [{ "type": "text", "text": { "content": "2024" } }] })
        );
        assert_eq!(
            date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None),
            json!({ "date": { "start": "2024-01-01", "end": null } })
        );
        let id = PageId::parse("550e8400e29b41d4a716446655440000").unwrap();
        assert_eq!(
            relation(&[id]),
            json!({ "relation": [{ "id": "550e8400-e29b-41d4-a716-446655440000" }] })
        );
        assert_eq!(select("Listened"), json!({ "select": { "name": "Listened" } }));
        assert_eq!(checkbox(true), json!({ "checkbox": true }));
        assert_eq!(number(1.5), json!({ "number": 1.5 }));
        assert_eq!(url("https://x.y"), json!({ "url": "https://x.y" }));
        assert_eq!(
            rich_text("hi"),
            json!({ "rich_text": [{ "type": "text", "text": { "content": "hi" } }] })
        );
        assert_eq!(
            external_icon("https://i/a.svg"),
            json!({ "type": "external", "external": { "url": "https://i/a.svg" } })
        );
    }

    #[test]
    fn reads_text_properties() {
        let value = json!({
            "type": "rich_text",
            "rich_text": [
                { "plain_text": "abc" },
                { "plain_text": "123" }
            ]
        });
        assert_eq!(
            PropertyValue::from_json(Some(&value)),
            PropertyValue::Text("abc123".to_string())
        );

        let empty = json!({ "type": "title", "title": [] });
        assert!(PropertyValue::from_json(Some(&empty)).is_empty());
        assert!(PropertyValue::from_json(None).is_empty());
    }

    #[test]
    fn reads_scalar_properties() {
        let status = json!({ "type": "status", "status": { "name": "听过" } });
        assert_eq!(PropertyValue::from_json(Some(&status)).as_text(), Some("听过"));

        let liked = json!({ "type": "checkbox", "checkbox": true });
        assert_eq!(PropertyValue::from_json(Some(&liked)).as_bool(), Some(true));

        let progress = json!({ "type": "number", "number": null });
        assert!(PropertyValue::from_json(Some(&progress)).is_empty());

        let link = json!({ "type": "url", "url": null });
        assert!(PropertyValue::from_json(Some(&link)).is_empty());
    }

    #[test]
    fn reads_dates_and_formulas() {
        let published = json!({
            "type": "date",
            "date": { "start": "2024-03-07", "end": null, "time_zone": null }
        });
        assert_eq!(
            PropertyValue::from_json(Some(&published)).as_date_start(),
            Some("2024-03-07")
        );

        let formula = json!({
            "type": "formula",
            "formula": { "type": "number", "number": 42.0 }
        });
        assert_eq!(PropertyValue::from_json(Some(&formula)).as_number(), Some(42.0));
    }

    #[test]
    fn reads_lists() {
        let relation = json!({ "type": "relation", "relation": [{ "id": "a" }, { "id": "b" }] });
        assert_eq!(
            PropertyValue::from_json(Some(&relation)),
            PropertyValue::List(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn keys_render_whole_numbers_without_fraction() {
        assert_eq!(PropertyValue::Number(12.0).as_key(), Some("12".to_string()));
        assert_eq!(PropertyValue::Number(1.25).as_key(), Some("1.25".to_string()));
        assert_eq!(
            PropertyValue::Text("p-1".to_string()).as_key(),
            Some("p-1".to_string())
        );
        assert_eq!(PropertyValue::Empty.as_key(), None);

        let unique = json!({ "type": "unique_id", "unique_id": { "prefix": "EP", "number": 3 } });
        assert_eq!(
            PropertyValue::from_json(Some(&unique)).as_key(),
            Some("EP-3".to_string())
        );
    }
}
