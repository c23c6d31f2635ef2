//! Where finished documents go: a cache directory, then optionally a share target.

use crate::ExportError;
use async_trait::async_trait;
use base64::Engine;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persists rendered documents, keyed by catalog id
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Store `bytes` as the document of `catalog_id`, replacing any earlier
    /// export of the same catalog, and return where it was written
    async fn persist(&self, bytes: &[u8], catalog_id: &str) -> Result<PathBuf, ExportError>;
}

/// Make a catalog id safe to use as part of a file name. Ids are normally UUIDs,
/// which pass through unchanged.
pub fn sanitize_file_stem(id: &str) -> String {
    let stem: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "catalog".to_string()
    } else {
        stem
    }
}

/// Writes `{prefix}{catalog id}.pdf` files into one directory
#[derive(Debug, Clone)]
pub struct CacheDirSink {
    dir: PathBuf,
    prefix: String,
}

impl CacheDirSink {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(dir: P, prefix: S) -> CacheDirSink {
        CacheDirSink {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The path an export of `catalog_id` is written to
    pub fn path_for(&self, catalog_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}.pdf", self.prefix, sanitize_file_stem(catalog_id)))
    }
}

/// Encode a document for a write call that takes text
pub fn encode_for_transport(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Write base64 `encoded` content to `path`, through a temporary sibling file so
/// readers never see a partial document
pub async fn write_encoded(path: &Path, encoded: &str) -> std::io::Result<()> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, path).await
}

#[async_trait]
impl DocumentSink for CacheDirSink {
    async fn persist(&self, bytes: &[u8], catalog_id: &str) -> Result<PathBuf, ExportError> {
        let path = self.path_for(catalog_id);
        let encoded = encode_for_transport(bytes);
        write_encoded(&path, &encoded)
            .await
            .map_err(|source| ExportError::Write {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), bytes = bytes.len(), "wrote catalog document");
        Ok(path)
    }
}

/// Something that can hand a file to the user, like a platform share sheet
#[async_trait]
pub trait ShareTarget: Send + Sync {
    async fn is_available(&self) -> bool;
    async fn share(&self, path: &Path, title: &str) -> std::io::Result<()>;
}

/// Sharing is not available
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShare;

#[async_trait]
impl ShareTarget for NoShare {
    async fn is_available(&self) -> bool {
        false
    }

    async fn share(&self, _path: &Path, _title: &str) -> std::io::Result<()> {
        Ok(())
    }
}

/// Environment variable through which [CommandShare] passes the dialog title
pub const SHARE_TITLE_ENV: &str = "CATALOG_PDF_SHARE_TITLE";

/// Shares by running a program with the file path as its last argument,
/// e.g. `xdg-open` or `open`
#[derive(Debug, Clone)]
pub struct CommandShare {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandShare {
    pub fn new<P: Into<PathBuf>>(program: P) -> CommandShare {
        CommandShare {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> CommandShare {
        self.args.push(arg.into());
        self
    }

    fn resolve(&self) -> Option<PathBuf> {
        if self.program.components().count() > 1 {
            return self.program.is_file().then(|| self.program.clone());
        }
        let paths = std::env::var_os("PATH")?;
        std::env::split_paths(&paths)
            .map(|dir| dir.join(&self.program))
            .find(|candidate| candidate.is_file())
    }
}

#[async_trait]
impl ShareTarget for CommandShare {
    async fn is_available(&self) -> bool {
        self.resolve().is_some()
    }

    async fn share(&self, path: &Path, title: &str) -> std::io::Result<()> {
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .env(SHARE_TITLE_ENV, title)
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!(
                "{} exited with {status}",
                self.program.display()
            )))
        }
    }
}

/// Share `path` if `target` is available. Returns whether it was shared; an
/// unavailable target is skipped silently.
pub async fn share(target: &dyn ShareTarget, path: &Path, title: &str) -> Result<bool, ExportError> {
    if !target.is_available().await {
        debug!(path = %path.display(), "no share target available, skipping");
        return Ok(false);
    }
    target
        .share(path, title)
        .await
        .map_err(|source| ExportError::Share {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(true)
}
