use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::post::{PostRecord, POST_COLLECTION};
use crate::config::ConfigError;

/// Upper bound for `app.bsky.embed.images` blobs.
pub const MAX_IMAGE_BYTES: usize = 1_000_000;

const CREATE_SESSION: &str = "com.atproto.server.createSession";
const UPLOAD_BLOB: &str = "com.atproto.repo.uploadBlob";
const CREATE_RECORD: &str = "com.atproto.repo.createRecord";

#[derive(Debug, Error)]
pub enum BlueskyError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{endpoint} request failed: {source}")]
    Http { endpoint: &'static str, #[source] source: reqwest::Error },
    #[error("{endpoint} returned {status}: {message}")]
    Api { endpoint: &'static str, status: StatusCode, message: String },
    #[error("image file size too large. {max} bytes maximum, got: {size}", max = MAX_IMAGE_BYTES)]
    ImageTooLarge { size: usize },
    #[error("{endpoint} response could not be decoded: {source}")]
    Decode { endpoint: &'static str, #[source] source: reqwest::Error },
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_jwt: String,
    pub did: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("access_jwt", &"<redacted>").field("did", &self.did).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub uri: String,
    pub cid: String,
}

#[derive(Deserialize)]
struct BlobEnvelope {
    blob: Value,
}

#[derive(Deserialize)]
struct XrpcErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct BlueskyClient {
    http: HttpClient,
    base_url: String,
}

impl BlueskyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BlueskyError> {
        let http = HttpClient::builder().timeout(timeout).build().map_err(BlueskyError::Client)?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn endpoint(&self, nsid: &str) -> String {
        format!("{}/xrpc/{}", self.base_url, nsid)
    }

    pub async fn create_session(&self, identifier: &str, password: &str) -> Result<Session, BlueskyError> {
        let resp = self
            .http
            .post(self.endpoint(CREATE_SESSION))
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()
            .await
            .map_err(|source| BlueskyError::Http { endpoint: CREATE_SESSION, source })?;
        let resp = check_status(CREATE_SESSION, resp).await?;
        resp.json::<Session>().await.map_err(|source| BlueskyError::Decode { endpoint: CREATE_SESSION, source })
    }

    /// Uploads raw image bytes and returns the blob reference untouched.
    pub async fn upload_blob(&self, session: &Session, image: Bytes, mime: &str) -> Result<Value, BlueskyError> {
        if image.len() > MAX_IMAGE_BYTES {
            return Err(BlueskyError::ImageTooLarge { size: image.len() });
        }
        let resp = self
            .http
            .post(self.endpoint(UPLOAD_BLOB))
            .bearer_auth(&session.access_jwt)
            .header(CONTENT_TYPE, mime)
            .body(image)
            .send()
            .await
            .map_err(|source| BlueskyError::Http { endpoint: UPLOAD_BLOB, source })?;
        let resp = check_status(UPLOAD_BLOB, resp).await?;
        let env: BlobEnvelope = resp.json().await.map_err(|source| BlueskyError::Decode { endpoint: UPLOAD_BLOB, source })?;
        Ok(env.blob)
    }

    pub async fn create_record(&self, session: &Session, record: &PostRecord) -> Result<RecordRef, BlueskyError> {
        let resp = self
            .http
            .post(self.endpoint(CREATE_RECORD))
            .bearer_auth(&session.access_jwt)
            .json(&json!({ "repo": session.did, "collection": POST_COLLECTION, "record": record }))
            .send()
            .await
            .map_err(|source| BlueskyError::Http { endpoint: CREATE_RECORD, source })?;
        let resp = check_status(CREATE_RECORD, resp).await?;
        resp.json::<RecordRef>().await.map_err(|source| BlueskyError::Decode { endpoint: CREATE_RECORD, source })
    }
}

async fn check_status(endpoint: &'static str, resp: Response) -> Result<Response, BlueskyError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<XrpcErrorBody>(&body) {
        Ok(XrpcErrorBody { error: Some(e), message: Some(m) }) => format!("{e}: {m}"),
        Ok(XrpcErrorBody { error: Some(e), message: None }) => e,
        Ok(XrpcErrorBody { error: None, message: Some(m) }) => m,
        _ => body,
    };
    Err(BlueskyError::Api { endpoint, status, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session() -> Session {
        Session { access_jwt: "jwt-123".into(), did: "did:plc:bot".into() }
    }

    #[tokio::test]
    async fn create_session_posts_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .and(body_json(json!({ "identifier": "bot.example", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessJwt": "jwt-123", "refreshJwt": "r", "did": "did:plc:bot", "handle": "bot.example"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BlueskyClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let s = client.create_session("bot.example", "pw").await.unwrap();
        assert_eq!(s.access_jwt, "jwt-123");
        assert_eq!(s.did, "did:plc:bot");
        assert!(!format!("{s:?}").contains("jwt-123"));
    }

    #[tokio::test]
    async fn auth_failure_surfaces_xrpc_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.server.createSession"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "AuthenticationRequired", "message": "Invalid identifier or password"
            })))
            .mount(&server)
            .await;

        let client = BlueskyClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.create_session("bot.example", "nope").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "com.atproto.server.createSession returned 401 Unauthorized: AuthenticationRequired: Invalid identifier or password"
        );
    }

    #[tokio::test]
    async fn upload_blob_sends_bytes_with_bearer() {
        let server = MockServer::start().await;
        let blob = json!({ "$type": "blob", "ref": { "$link": "bafk" }, "mimeType": "image/png", "size": 4 });
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.uploadBlob"))
            .and(header("authorization", "Bearer jwt-123"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "blob": blob })))
            .expect(1)
            .mount(&server)
            .await;

        let client = BlueskyClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let got = client.upload_blob(&session(), Bytes::from_static(b"\x89PNG"), "image/png").await.unwrap();
        assert_eq!(got, blob);
    }

    #[tokio::test]
    async fn oversized_image_never_uploads() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.uploadBlob"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = BlueskyClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let big = Bytes::from(vec![0u8; MAX_IMAGE_BYTES + 1]);
        let err = client.upload_blob(&session(), big, "image/jpeg").await.unwrap_err();
        assert!(matches!(err, BlueskyError::ImageTooLarge { size } if size == MAX_IMAGE_BYTES + 1));
    }

    #[tokio::test]
    async fn record_failure_keeps_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xrpc/com.atproto.repo.createRecord"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = BlueskyClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let listing = crate::scrape::Listing {
            id: 1,
            title: "A".into(),
            summary: "B".into(),
            source_url: "https://catalog.example/film/1/".into(),
            poster_url: "https://img.example/1.jpg".into(),
        };
        let record = super::super::post::build_post(&listing, json!({}), &[], chrono::Utc::now());
        let err = client.create_record(&session(), &record).await.unwrap_err();
        match err {
            BlueskyError::Api { status, message, .. } => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
