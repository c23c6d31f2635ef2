//! Where image bytes come from.
//!
//! Catalog image references are URIs: remote `http(s)` resources, `file://`
//! URIs or bare paths on the local disk, and inline `data:` URIs. [ImageSource]
//! abstracts fetching them so exports can be driven by other sources in tests.

use async_trait::async_trait;
use base64::Engine;
use std::path::PathBuf;
use thiserror::Error;

/// Why a resource could not be fetched. Always recovered into "no image" by the
/// normalizer; exposed so custom sources can report meaningful reasons.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}")]
    Status { status: u16 },

    #[error("failed to read {path}: {source}")]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed data URI")]
    DataUri,

    #[error("not a local file URI: {0}")]
    FileUri(String),

    #[error("unsupported URI scheme: {0}")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

/// The raw body of a fetched resource
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    /// The declared media type, e.g. a `Content-Type` header
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Fetched, FetchError>;
}

/// Resolves `http(s)`, `file://`, `data:` URIs and plain filesystem paths
#[derive(Debug, Clone, Default)]
pub struct DefaultSource {
    client: reqwest::Client,
}

impl DefaultSource {
    pub fn new() -> DefaultSource {
        DefaultSource::default()
    }

    pub fn with_client(client: reqwest::Client) -> DefaultSource {
        DefaultSource { client }
    }

    async fn fetch_http(&self, uri: &str) -> Result<Fetched, FetchError> {
        let response = self.client.get(uri).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(Fetched {
            bytes,
            content_type,
        })
    }

    async fn fetch_file(&self, path: PathBuf) -> Result<Fetched, FetchError> {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| FetchError::File { path, source })?;
        Ok(Fetched {
            bytes,
            content_type: None,
        })
    }
}

#[async_trait]
impl ImageSource for DefaultSource {
    async fn fetch(&self, uri: &str) -> Result<Fetched, FetchError> {
        let uri = uri.trim();
        if uri.starts_with("http://") || uri.starts_with("https://") {
            self.fetch_http(uri).await
        } else if uri.starts_with("data:") {
            parse_data_uri(uri).ok_or(FetchError::DataUri)
        } else if uri.starts_with("file:") {
            self.fetch_file(file_uri_path(uri)?).await
        } else if uri.contains("://") {
            Err(FetchError::Unsupported(uri.to_string()))
        } else {
            self.fetch_file(PathBuf::from(uri)).await
        }
    }
}

/// The local path a `file:` URI points at, percent-decoded
pub fn file_uri_path(uri: &str) -> Result<PathBuf, FetchError> {
    reqwest::Url::parse(uri)
        .ok()
        .filter(|url| url.scheme() == "file")
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| FetchError::FileUri(uri.to_string()))
}

/// Split a `data:` URI into its media type and decoded payload
pub fn parse_data_uri(uri: &str) -> Option<Fetched> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let content_type = header
        .split(';')
        .next()
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let bytes = if header.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .ok()?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };
    Some(Fetched {
        bytes,
        content_type,
    })
}
