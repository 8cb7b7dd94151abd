use std::env;
use std::fmt;
use std::time::Duration;

use scraper::Selector;
use thiserror::Error;
use url::Url;

use crate::ranges::{self, IdRange};

pub const ID_PLACEHOLDER: &str = "{movie_id}";

const DEFAULT_SERVICE_URL: &str = "https://bsky.social";
const DEFAULT_LANGS: &str = "cs,sk";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { var, reason: reason.into() }
    }
}

/// CSS selectors for the three scraped fields.
#[derive(Clone, Debug)]
pub struct Selectors {
    pub title: Selector,
    pub summary: Selector,
    pub poster: Selector,
}

#[derive(Clone, Debug)]
pub struct ScrapeConfig {
    pub ranges: Vec<IdRange>,
    pub summary_url_pattern: String,
    pub posters_url_pattern: String,
    pub selectors: Selectors,
    pub user_agent: String,
    pub max_attempts: u32,
}

impl ScrapeConfig {
    pub fn summary_url(&self, id: u64) -> String { fill_template(&self.summary_url_pattern, id) }
    pub fn posters_url(&self, id: u64) -> String { fill_template(&self.posters_url_pattern, id) }
}

#[derive(Clone)]
pub struct BlueskyConfig {
    pub handle: Option<String>,
    pub app_password: Option<String>,
    pub service_url: String,
    pub langs: Vec<String>,
}

impl BlueskyConfig {
    /// Credentials are only required once we actually publish.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let handle = self.handle.as_deref().ok_or(ConfigError::Missing("BLUESKY_HANDLE"))?;
        let password = self.app_password.as_deref().ok_or(ConfigError::Missing("BLUESKY_APP_PASSWORD"))?;
        Ok((handle, password))
    }
}

impl fmt::Debug for BlueskyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlueskyConfig")
            .field("handle", &self.handle)
            .field("app_password", &self.app_password.as_ref().map(|_| "<redacted>"))
            .field("service_url", &self.service_url)
            .field("langs", &self.langs)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub scrape: ScrapeConfig,
    pub bluesky: BlueskyConfig,
    pub http_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |k: &'static str| get(k).ok_or(ConfigError::Missing(k));

        let ranges = ranges::parse_ranges(&require("MOVIE_ID_RANGES")?)
            .map_err(|e| ConfigError::invalid("MOVIE_ID_RANGES", e.to_string()))?;

        let summary_url_pattern = require("SUMMARY_PAGE_URL_PATTERN")?;
        check_template("SUMMARY_PAGE_URL_PATTERN", &summary_url_pattern)?;
        let posters_url_pattern = require("POSTERS_PAGE_URL_PATTERN")?;
        check_template("POSTERS_PAGE_URL_PATTERN", &posters_url_pattern)?;

        let selectors = Selectors {
            title: parse_selector("TITLE_ELEMENT_ID", &require("TITLE_ELEMENT_ID")?)?,
            summary: parse_selector("SUMMARY_ELEMENT_ID", &require("SUMMARY_ELEMENT_ID")?)?,
            poster: parse_selector("POSTER_ELEMENT_ID", &require("POSTER_ELEMENT_ID")?)?,
        };

        let user_agent = require("HEADERS_USER_AGENT")?;

        let max_attempts: u32 = require("MAX_TRY_COUNT")?
            .parse()
            .map_err(|_| ConfigError::invalid("MAX_TRY_COUNT", "expected a positive integer"))?;
        if max_attempts == 0 {
            return Err(ConfigError::invalid("MAX_TRY_COUNT", "must be at least 1"));
        }

        let service_url = get("BLUESKY_SERVICE_URL").unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());
        Url::parse(&service_url).map_err(|e| ConfigError::invalid("BLUESKY_SERVICE_URL", e.to_string()))?;

        let langs: Vec<String> = get("POST_LANGS")
            .unwrap_or_else(|| DEFAULT_LANGS.to_string())
            .split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        let timeout_secs = match get("HTTP_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().map_err(|_| ConfigError::invalid("HTTP_TIMEOUT_SECS", "expected seconds"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(AppConfig {
            scrape: ScrapeConfig {
                ranges,
                summary_url_pattern,
                posters_url_pattern,
                selectors,
                user_agent,
                max_attempts,
            },
            bluesky: BlueskyConfig {
                handle: get("BLUESKY_HANDLE"),
                app_password: get("BLUESKY_APP_PASSWORD"),
                service_url: service_url.trim_end_matches('/').to_string(),
                langs,
            },
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

pub fn fill_template(pattern: &str, id: u64) -> String {
    pattern.replace(ID_PLACEHOLDER, &id.to_string())
}

fn check_template(var: &'static str, pattern: &str) -> Result<(), ConfigError> {
    if !pattern.contains(ID_PLACEHOLDER) {
        return Err(ConfigError::invalid(var, format!("missing {ID_PLACEHOLDER} placeholder")));
    }
    Url::parse(&fill_template(pattern, 0)).map_err(|e| ConfigError::invalid(var, e.to_string()))?;
    Ok(())
}

fn parse_selector(var: &'static str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::invalid(var, format!("invalid selector {css:?}: {e:?}")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("MOVIE_ID_RANGES", "1-5,10-15".to_string()),
            ("SUMMARY_PAGE_URL_PATTERN", "https://catalog.example/film/{movie_id}/".to_string()),
            ("POSTERS_PAGE_URL_PATTERN", "https://catalog.example/film/{movie_id}/posters/".to_string()),
            ("TITLE_ELEMENT_ID", "h1.title".to_string()),
            ("SUMMARY_ELEMENT_ID", "div.plot p".to_string()),
            ("POSTER_ELEMENT_ID", "img.poster".to_string()),
            ("HEADERS_USER_AGENT", "movie-bot-test/1.0".to_string()),
            ("MAX_TRY_COUNT", "3".to_string()),
        ])
    }

    pub(crate) fn config_from(vars: &HashMap<&'static str, String>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn loads_with_defaults() {
        let cfg = config_from(&base_vars()).unwrap();
        assert_eq!(cfg.scrape.ranges.len(), 2);
        assert_eq!(cfg.scrape.max_attempts, 3);
        assert_eq!(cfg.bluesky.service_url, "https://bsky.social");
        assert_eq!(cfg.bluesky.langs, vec!["cs", "sk"]);
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.scrape.summary_url(12), "https://catalog.example/film/12/");
        assert_eq!(cfg.scrape.posters_url(12), "https://catalog.example/film/12/posters/");
    }

    #[test]
    fn missing_required_var_is_named() {
        let mut vars = base_vars();
        vars.remove("HEADERS_USER_AGENT");
        let err = config_from(&vars).unwrap_err();
        assert_eq!(err.to_string(), "HEADERS_USER_AGENT is not set");
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("MAX_TRY_COUNT", "   ".into());
        assert!(matches!(config_from(&vars), Err(ConfigError::Missing("MAX_TRY_COUNT"))));
    }

    #[test]
    fn rejects_invalid_values() {
        for (var, value) in [
            ("MAX_TRY_COUNT", "0"),
            ("MAX_TRY_COUNT", "many"),
            ("MOVIE_ID_RANGES", "5-1"),
            ("SUMMARY_PAGE_URL_PATTERN", "https://catalog.example/film/"),
            ("TITLE_ELEMENT_ID", "h1[["),
            ("HTTP_TIMEOUT_SECS", "soon"),
        ] {
            let mut vars = base_vars();
            vars.insert(var, value.into());
            match config_from(&vars) {
                Err(ConfigError::Invalid { var: got, .. }) => assert_eq!(got, var),
                other => panic!("{var}={value}: expected invalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn credentials_required_only_on_demand() {
        let cfg = config_from(&base_vars()).unwrap();
        assert!(matches!(cfg.bluesky.credentials(), Err(ConfigError::Missing("BLUESKY_HANDLE"))));

        let mut vars = base_vars();
        vars.insert("BLUESKY_HANDLE", "bot.example".into());
        vars.insert("BLUESKY_APP_PASSWORD", "secret".into());
        let cfg = config_from(&vars).unwrap();
        assert_eq!(cfg.bluesky.credentials().unwrap(), ("bot.example", "secret"));
        assert!(!format!("{:?}", cfg.bluesky).contains("secret"));
    }

    #[test]
    fn custom_langs_and_service() {
        let mut vars = base_vars();
        vars.insert("POST_LANGS", "en, de ,".into());
        vars.insert("BLUESKY_SERVICE_URL", "http://127.0.0.1:9000/".into());
        let cfg = config_from(&vars).unwrap();
        assert_eq!(cfg.bluesky.langs, vec!["en", "de"]);
        assert_eq!(cfg.bluesky.service_url, "http://127.0.0.1:9000");
    }
}
