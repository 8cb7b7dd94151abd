use bytes::Bytes;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use super::ScrapeError;

pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

pub async fn fetch_page(client: &Client, url: &str) -> Result<String, ScrapeError> {
    let resp = client.get(url).send().await.map_err(|e| ScrapeError::http(url, e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScrapeError::Status { url: url.to_string(), status });
    }
    resp.text().await.map_err(|e| ScrapeError::http(url, e))
}

/// Downloads the image body along with its mime type.
pub async fn fetch_image(client: &Client, url: &str) -> Result<(Bytes, String), ScrapeError> {
    let resp = client.get(url).send().await.map_err(|e| ScrapeError::http(url, e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ScrapeError::Status { url: url.to_string(), status });
    }
    let mime = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| v.starts_with("image/"))
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
    let body = resp.bytes().await.map_err(|e| ScrapeError::http(url, e))?;
    Ok((body, mime))
}
