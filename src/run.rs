use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::bluesky::{self, post, RecordRef};
use crate::config::AppConfig;
use crate::scrape::retry::RetryOutcome;
use crate::scrape::{Listing, Scraper};
use crate::telemetry::{self};

#[derive(Args)]
pub struct RunCmd {
    /// Publish the post; without it the composed post is only printed
    #[arg(long, default_value_t = false)]
    pub apply: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Exhausted { attempts: u32 },
    Planned { attempts: u32, listing: Listing, text: String },
    Posted { attempts: u32, listing: Listing, record: RecordRef },
}

pub async fn run(cfg: &AppConfig, args: RunCmd) -> Result<()> {
    let log = telemetry::run();
    let _g = log.root_span_kv([
        ("apply", args.apply.to_string()),
        ("max_attempts", cfg.scrape.max_attempts.to_string()),
    ]).entered();

    let outcome = execute(cfg, args.apply).await?;

    if telemetry::config::json_mode() {
        match &outcome {
            RunOutcome::Planned { .. } => log.plan(&outcome)?,
            _ => log.result(&outcome)?,
        }
        return Ok(());
    }

    match &outcome {
        RunOutcome::Exhausted { .. } => {}
        RunOutcome::Planned { listing, text, .. } => {
            log.info(format!("📝 Post plan: id={} source={}", listing.id, listing.source_url));
            log.info(format!("  poster: {}", listing.poster_url));
            log.info(format!("  text: {text}"));
            log.info("   Use --apply to publish.");
        }
        RunOutcome::Posted { record, .. } => log.posted(&record.uri, &record.cid),
    }
    Ok(())
}

/// One invocation: scrape with retries, then either compose a preview or publish.
pub async fn execute(cfg: &AppConfig, apply: bool) -> Result<RunOutcome> {
    let log = telemetry::run();
    let scraper = Scraper::new(&cfg.scrape, cfg.http_timeout)?;

    let (listing, attempts) = match scraper.scrape_with_retry().await {
        RetryOutcome::Success { value, attempts } => (value, attempts),
        RetryOutcome::Exhausted { attempts } => {
            log.exhausted(attempts);
            return Ok(RunOutcome::Exhausted { attempts });
        }
    };
    log.info_kv("🎬 listing", [("id", listing.id.to_string()), ("title", listing.title.clone())]);

    if !apply {
        let text = post::compose_text(&listing.title, &listing.summary, post::MAX_POST_LENGTH).text;
        return Ok(RunOutcome::Planned { attempts, listing, text });
    }

    let (image, mime) = scraper
        .download_image(&listing.poster_url)
        .await
        .with_context(|| format!("downloading poster for id={}", listing.id))?;

    let record = bluesky::publish(&cfg.bluesky, cfg.http_timeout, &listing, image, &mime)
        .await
        .with_context(|| format!("publishing id={}", listing.id))?;

    Ok(RunOutcome::Posted { attempts, listing, record })
}
