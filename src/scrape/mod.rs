use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use scraper::Html;
use serde::Serialize;
use thiserror::Error;

use crate::config::ScrapeConfig;
use crate::ranges;
use crate::telemetry::{self};
use crate::telemetry::ops::run::Phase as RunPhase;

pub mod extract;
pub mod fetch;
pub mod retry;

use extract::{fix_poster_url, select_attr, select_text};
use retry::{AttemptFailure, RetryOutcome};

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Http { url: String, #[source] source: reqwest::Error },
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("no id could be drawn from the configured ranges")]
    NoId,
}

impl ScrapeError {
    pub(crate) fn http(url: &str, source: reqwest::Error) -> Self {
        ScrapeError::Http { url: url.to_string(), source }
    }
}

/// Fields found for one id. Later fields are only looked up once the earlier ones are present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrapeResult {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub source_url: Option<String>,
    pub poster_url: Option<String>,
}

impl ScrapeResult {
    pub fn success(&self) -> bool {
        self.title.is_some() && self.summary.is_some() && self.poster_url.is_some()
    }

    pub fn into_listing(self, id: u64) -> Option<Listing> {
        match self {
            ScrapeResult { title: Some(title), summary: Some(summary), source_url: Some(source_url), poster_url: Some(poster_url) } => {
                Some(Listing {
                    id,
                    title: title.trim().to_string(),
                    summary: summary.trim().to_string(),
                    source_url,
                    poster_url: fix_poster_url(&poster_url),
                })
            }
            _ => None,
        }
    }
}

/// A complete, cleaned scrape ready for publishing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub id: u64,
    pub title: String,
    pub summary: String,
    pub source_url: String,
    pub poster_url: String,
}

pub struct Scraper<'a> {
    client: Client,
    cfg: &'a ScrapeConfig,
}

impl<'a> Scraper<'a> {
    pub fn new(cfg: &'a ScrapeConfig, timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(timeout)
            .build()
            .map_err(ScrapeError::Client)?;
        Ok(Self { client, cfg })
    }

    pub async fn scrape(&self, id: u64) -> Result<ScrapeResult, ScrapeError> {
        let log = telemetry::run();
        let sel = &self.cfg.selectors;

        let summary_url = self.cfg.summary_url(id);
        let html = {
            let _s = log.span_kv(&RunPhase::FetchSummary, [("url", summary_url.clone())]).entered();
            fetch::fetch_page(&self.client, &summary_url).await?
        };
        let (title, summary) = {
            let doc = Html::parse_document(&html);
            (select_text(&doc, &sel.title), select_text(&doc, &sel.summary))
        };

        let Some(title) = title else {
            log.debug(format!("id={id}: title not found"));
            return Ok(ScrapeResult::default());
        };
        let Some(summary) = summary else {
            log.debug(format!("id={id}: summary not found"));
            return Ok(ScrapeResult { title: Some(title), source_url: Some(summary_url), ..Default::default() });
        };

        let posters_url = self.cfg.posters_url(id);
        let html = {
            let _s = log.span_kv(&RunPhase::FetchPoster, [("url", posters_url.clone())]).entered();
            fetch::fetch_page(&self.client, &posters_url).await?
        };
        let poster_url = {
            let doc = Html::parse_document(&html);
            select_attr(&doc, &sel.poster, "src")
        };
        let found = ScrapeResult {
            title: Some(title),
            summary: Some(summary),
            source_url: Some(summary_url),
            poster_url,
        };
        if !found.success() {
            log.debug(format!("id={id}: poster not found"));
        }
        Ok(found)
    }

    /// Scrapes freshly drawn random ids until one yields a complete listing.
    pub async fn scrape_with_retry(&self) -> RetryOutcome<Listing> {
        let ranges = &self.cfg.ranges;
        self.scrape_with_retry_using(|| {
            let mut rng = rand::rng();
            ranges::pick_random(ranges, &mut rng)
        })
        .await
    }

    pub async fn scrape_with_retry_using<F>(&self, mut next_id: F) -> RetryOutcome<Listing>
    where
        F: FnMut() -> Option<u64>,
    {
        let log = telemetry::run();
        let max = self.cfg.max_attempts;
        retry::retry(
            max,
            |attempt| {
                let id = { let _s = log.span(&RunPhase::Pick).entered(); next_id() };
                log.info_kv("🎲 attempt", [("attempt", attempt.to_string()), ("id", format!("{id:?}"))]);
                async move {
                    let id = id.ok_or(ScrapeError::NoId)?;
                    let found = self.scrape(id).await?;
                    Ok::<_, ScrapeError>(found.into_listing(id))
                }
            },
            |attempt, why| match why {
                AttemptFailure::Incomplete => log.attempt_failed(attempt, max, "incomplete listing"),
                AttemptFailure::Error(e) => log.attempt_failed(attempt, max, &e.to_string()),
            },
        )
        .await
    }

    pub async fn download_image(&self, url: &str) -> Result<(Bytes, String), ScrapeError> {
        let log = telemetry::run();
        let _s = log.span_kv(&RunPhase::DownloadImage, [("url", url.to_string())]).entered();
        fetch::fetch_image(&self.client, url).await
    }
}
