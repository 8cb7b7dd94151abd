use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;

use crate::config::BlueskyConfig;
use crate::scrape::Listing;
use crate::telemetry::{self};
use crate::telemetry::ops::run::Phase as RunPhase;

pub mod client;
pub mod post;

pub use client::{BlueskyClient, BlueskyError, RecordRef};

/// Logs in, uploads the poster and creates the post. The first failing call aborts the rest.
pub async fn publish(
    cfg: &BlueskyConfig,
    timeout: Duration,
    listing: &Listing,
    image: Bytes,
    mime: &str,
) -> Result<RecordRef, BlueskyError> {
    let log = telemetry::run();
    let (handle, password) = cfg.credentials()?;
    let client = BlueskyClient::new(&cfg.service_url, timeout)?;

    let session = {
        let _s = log.span_kv(&RunPhase::Session, [("handle", handle.to_string())]).entered();
        log.info(format!("🔑 logging in as {handle}"));
        client.create_session(handle, password).await?
    };

    let blob = {
        let _s = log.span_kv(&RunPhase::UploadBlob, [("bytes", image.len().to_string()), ("mime", mime.to_string())]).entered();
        client.upload_blob(&session, image, mime).await?
    };

    let record = {
        let _s = log.span(&RunPhase::Compose).entered();
        post::build_post(listing, blob, &cfg.langs, Utc::now())
    };

    let _s = log.span(&RunPhase::CreateRecord).entered();
    client.create_record(&session, &record).await
}
