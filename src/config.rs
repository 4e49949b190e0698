// src/config.rs
use crate::error::AppError;
use crate::error_recovery::RetryPolicy;
use crate::types::{ApiKey, PageId};
use std::path::PathBuf;

/// Environment variable holding the integration token.
pub const TOKEN_ENV: &str = "NOTION_TOKEN";
/// Environment variable holding the root page URL or ID.
pub const ROOT_PAGE_ENV: &str = "NOTION_PAGE";
/// Environment file GitHub Actions reads between steps.
pub const CI_ENV_FILE_ENV: &str = "GITHUB_ENV";

/// Display names of the databases living under the root page.
///
/// Each one can be overridden through its own environment variable, for
/// workspaces where the template's databases were renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseNames {
    pub podcast: String,
    pub episode: String,
    /// Informational only. The "all" database is always the target of the
    /// episode database's `全部` relation, so overriding this name has no effect.
    pub all: String,
    pub author: String,
    pub mindmap: String,
}

impl Default for DatabaseNames {
    fn default() -> Self {
        Self {
            podcast: "Podcast".to_string(),
            episode: "Episode".to_string(),
            all: "全部".to_string(),
            author: "Author".to_string(),
            mindmap: "思维导图".to_string(),
        }
    }
}

impl DatabaseNames {
    /// Replaces names whose override variable is set to a non-empty value.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots: [(&str, &mut String); 5] = [
            ("PODCAST_DATABASE_NAME", &mut self.podcast),
            ("EPISODE_DATABASE_NAME", &mut self.episode),
            ("ALL_DATABASE_NAME", &mut self.all),
            ("AUTHOR_DATABASE_NAME", &mut self.author),
            ("MINDMAP_DATABASE_NAME", &mut self.mindmap),
        ];
        for (key, slot) in slots {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                log::debug!("{} overridden to '{}'", key, value);
                *slot = value;
            }
        }
        self
    }
}

/// Resolved helper configuration: credentials, root page, naming, retry behavior.
#[derive(Debug, Clone)]
pub struct HelperConfig {
    pub api_key: ApiKey,
    pub root_page: PageId,
    pub database_names: DatabaseNames,
    /// File that receives `KEY=value` lines for later CI steps.
    pub ci_env_file: Option<PathBuf>,
    pub retry: RetryPolicy,
}

impl HelperConfig {
    pub fn new(api_key: ApiKey, root_page: PageId) -> Self {
        Self {
            api_key,
            root_page,
            database_names: DatabaseNames::default(),
            ci_env_file: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Resolves a complete configuration from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV).ok_or_else(|| {
            AppError::MissingConfiguration(format!("{} environment variable not set", TOKEN_ENV))
        })?;
        let page = lookup(ROOT_PAGE_ENV).ok_or_else(|| {
            AppError::MissingConfiguration(format!(
                "{} environment variable not set",
                ROOT_PAGE_ENV
            ))
        })?;

        let api_key = ApiKey::new(token)?;
        let root_page = PageId::parse(&page)?;

        Ok(Self {
            database_names: DatabaseNames::default().with_overrides(&lookup),
            ci_env_file: lookup(CI_ENV_FILE_ENV)
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            ..Self::new(api_key, root_page)
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
