// src/types/ids.rs
use super::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Strong typing for IDs with phantom types
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

/// Marker types for different ID kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatabaseMarker;

/// Type aliases for specific ID types
pub type PageId = Id<PageMarker>;
pub type BlockId = Id<BlockMarker>;
pub type DatabaseId = Id<DatabaseMarker>;

lazy_static::lazy_static! {
    /// A Notion ID anywhere in the input: 32 hex chars, or the dashed 8-4-4-4-12 UUID layout.
    static ref ID_REGEX: Regex = Regex::new(
        r"(?i)([a-f0-9]{32}|[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12})"
    ).expect("Failed to compile Notion ID regex - this is a bug in the code");
}

// Manual impl: a derive would add a `T: Clone` bound.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::from_normalized(self.value.clone())
    }
}

impl<T> Id<T> {
    /// Extracts the first Notion ID found in `input`.
    ///
    /// Accepts bare IDs (dashed or undashed) as well as full page URLs such as
    /// `https://www.notion.so/Podcasts-1b2c...?v=...`. The stored form is the
    /// lowercase 32-character hex string.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = extract_notion_id(input)?;
        Ok(Self::from_normalized(normalized))
    }

    /// Create an ID from an already normalized string (internal use)
    pub(crate) fn from_normalized(value: String) -> Self {
        Self {
            value,
            _phantom: PhantomData,
        }
    }

    /// Get the ID as a string reference
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Get the ID with dashes for API calls
    pub fn to_dashed(&self) -> String {
        if self.value.len() == 32 && !self.value.contains('-') {
            format!(
                "{}-{}-{}-{}-{}",
                &self.value[0..8],
                &self.value[8..12],
                &self.value[12..16],
                &self.value[16..20],
                &self.value[20..32]
            )
        } else {
            self.value.clone()
        }
    }

    /// Reinterprets this ID as another object kind.
    ///
    /// Notion shares one ID space: a `child_database` block has the same ID
    /// as the database it embeds, and every page is also a block.
    pub fn cast<U>(&self) -> Id<U> {
        Id::from_normalized(self.value.clone())
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_dashed().serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

/// Finds the first ID-shaped substring and returns it undashed and lowercased.
fn extract_notion_id(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::EmptyField("notion id"));
    }

    ID_REGEX
        .find(input)
        .map(|m| m.as_str().replace('-', "").to_lowercase())
        .ok_or_else(|| {
            ValidationError::InvalidId(format!(
                "Could not find a Notion ID in '{}', check that the URL is correct",
                input
            ))
        })
}
