//! Site configuration (donblog.yml)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub tagline: String,
    pub timezone: String,

    // Server
    pub bind: String,
    pub public_dir: String,

    // Content store
    pub store: StoreConfig,

    // Detail page revalidation
    pub revalidate: RevalidateConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "DonBlog".to_string(),
            tagline: "is a great place to read, write, and connect".to_string(),
            timezone: "UTC".to_string(),

            bind: "127.0.0.1:3000".to_string(),
            public_dir: "public".to_string(),

            store: StoreConfig::default(),
            revalidate: RevalidateConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read {}", path.as_ref().display()))?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from a file if it exists, then apply environment overrides
    pub fn from_path_and_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            tracing::debug!("Loading configuration from {:?}", path);
            Self::load(path)?
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        tracing::info!(
            project_id = %config.store.project_id,
            dataset = %config.store.dataset,
            use_cdn = config.store.use_cdn,
            api_version = %config.store.api_version,
            token = config.store.redacted_token(),
            revalidate_secs = config.revalidate.window_secs,
            fallback = ?config.revalidate.fallback,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Apply environment-style overrides through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SANITY_PROJECT_ID") {
            self.store.project_id = v;
        }
        if let Some(v) = lookup("SANITY_DATASET") {
            self.store.dataset = v;
        }
        if let Some(v) = lookup("SANITY_TOKEN") {
            self.store.token = Some(v).filter(|t| !t.is_empty());
        }
        if let Some(v) = lookup("SANITY_USE_CDN") {
            self.store.use_cdn = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true");
        }
        if let Some(v) = lookup("SANITY_API_VERSION") {
            self.store.api_version = v;
        }
        if let Some(v) = lookup("SANITY_API_HOST") {
            self.store.api_host = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = lookup("DONBLOG_BIND") {
            self.bind = v;
        }
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.store.project_id.is_empty() && self.store.api_host.is_none() {
            bail!("store.project_id is required (set it in the config file or SANITY_PROJECT_ID)");
        }
        if self.store.dataset.is_empty() {
            bail!("store.dataset must not be empty");
        }
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            bail!("unknown timezone: {}", self.timezone);
        }
        Ok(())
    }

    /// Timezone used to display publication dates
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

/// Content store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub project_id: String,
    pub dataset: String,
    pub use_cdn: bool,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub api_version: String,
    /// Overrides the computed API host, e.g. for a local mock
    pub api_host: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            dataset: "production".to_string(),
            use_cdn: false,
            token: None,
            api_version: "2021-10-21".to_string(),
            api_host: None,
        }
    }
}

impl StoreConfig {
    pub fn redacted_token(&self) -> &'static str {
        if self.token.is_some() {
            "<set>"
        } else {
            "<unset>"
        }
    }
}

/// What to do with a slug that was not enumerated at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Render synchronously on first request, then cache
    Blocking,
    /// Answer 404 without querying the store
    None,
}

/// Stale-while-revalidate settings for detail pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevalidateConfig {
    pub window_secs: u64,
    pub fallback: FallbackPolicy,
}

impl Default for RevalidateConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            fallback: FallbackPolicy::Blocking,
        }
    }
}

impl RevalidateConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "DonBlog");
        assert_eq!(config.store.dataset, "production");
        assert_eq!(config.store.api_version, "2021-10-21");
        assert_eq!(config.revalidate.window(), Duration::from_secs(60));
        assert_eq!(config.revalidate.fallback, FallbackPolicy::Blocking);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
timezone: Europe/Berlin
store:
  project_id: abc123
  dataset: staging
revalidate:
  window_secs: 5
  fallback: none
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.store.project_id, "abc123");
        assert_eq!(config.store.dataset, "staging");
        assert_eq!(config.store.api_version, "2021-10-21");
        assert_eq!(config.revalidate.window_secs, 5);
        assert_eq!(config.revalidate.fallback, FallbackPolicy::None);
        assert_eq!(config.tz(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("donblog.yml");
        fs::write(&path, "store:\n  project_id: fromfile\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.store.project_id, "fromfile");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SANITY_PROJECT_ID", "envproj"),
            ("SANITY_DATASET", "dev"),
            ("SANITY_TOKEN", "sk-secret"),
            ("SANITY_USE_CDN", "true"),
            ("SANITY_API_HOST", "http://localhost:9999/"),
        ]
        .into_iter()
        .collect();

        let mut config = SiteConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.store.project_id, "envproj");
        assert_eq!(config.store.dataset, "dev");
        assert_eq!(config.store.token.as_deref(), Some("sk-secret"));
        assert!(config.store.use_cdn);
        assert_eq!(
            config.store.api_host.as_deref(),
            Some("http://localhost:9999")
        );
        assert_eq!(config.store.redacted_token(), "<set>");
    }

    #[test]
    fn test_empty_token_is_unset() {
        let mut config = SiteConfig::default();
        config.apply_overrides(|k| (k == "SANITY_TOKEN").then(String::new));
        assert!(config.store.token.is_none());
    }

    #[test]
    fn test_validate_requires_project() {
        let config = SiteConfig::default();
        assert!(config.validate().is_err());

        let mut config = SiteConfig::default();
        config.store.api_host = Some("http://localhost:1234".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_timezone() {
        let mut config = SiteConfig::default();
        config.store.project_id = "p".to_string();
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }
}
