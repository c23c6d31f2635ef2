//! Catalog persistence.
//!
//! Catalogs are stored as rows: scalar columns for id, name, logo and
//! timestamps, and JSON text columns for the palette and the product list.

use crate::model::{Catalog, Palette, Product};
use crate::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// How a catalog is laid out in storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRow {
    pub id: String,
    pub name: String,
    pub logo_uri: Option<String>,
    /// JSON array of hex colours
    pub colors: String,
    /// JSON array of products
    pub products: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CatalogRow {
    pub fn from_catalog(catalog: &Catalog) -> Result<CatalogRow, StoreError> {
        Ok(CatalogRow {
            id: catalog.id.clone(),
            name: catalog.name.clone(),
            logo_uri: catalog.logo_uri.clone(),
            colors: serde_json::to_string(&catalog.colors)?,
            products: serde_json::to_string(&catalog.products)?,
            created_at: catalog.created_at.clone(),
            updated_at: catalog.updated_at.clone(),
        })
    }

    pub fn into_catalog(self) -> Result<Catalog, StoreError> {
        let colors: Palette = serde_json::from_str(&self.colors)?;
        let products: Vec<Product> = serde_json::from_str(&self.products)?;
        Ok(Catalog {
            id: self.id,
            name: self.name,
            logo_uri: self.logo_uri,
            colors,
            products,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    fn updated_key(&self) -> (Option<DateTime<FixedOffset>>, &str, &str) {
        (
            DateTime::parse_from_rfc3339(&self.updated_at).ok(),
            self.updated_at.as_str(),
            self.id.as_str(),
        )
    }
}

/// Most recently updated first. Unparseable timestamps sort after parseable ones.
fn newest_first(rows: &mut [CatalogRow]) {
    rows.sort_by(|a, b| b.updated_key().cmp(&a.updated_key()));
}

fn rows_into_catalogs(mut rows: Vec<CatalogRow>) -> Result<Vec<Catalog>, StoreError> {
    newest_first(&mut rows);
    rows.into_iter().map(CatalogRow::into_catalog).collect()
}

/// Where catalogs live between sessions
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Every stored catalog, most recently updated first
    async fn load(&self) -> Result<Vec<Catalog>, StoreError>;

    /// Insert or replace the catalog with the same id
    async fn save(&self, catalog: &Catalog) -> Result<(), StoreError>;

    /// Remove a catalog; removing an unknown id is not an error
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// Keeps rows in memory, for tests and short-lived tools
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<String, CatalogRow>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn load(&self) -> Result<Vec<Catalog>, StoreError> {
        let rows = self.rows.lock().await.values().cloned().collect();
        rows_into_catalogs(rows)
    }

    async fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        catalog.validate()?;
        let row = CatalogRow::from_catalog(catalog)?;
        self.rows.lock().await.insert(row.id.clone(), row);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.rows.lock().await.remove(id);
        Ok(())
    }
}

/// Stores all rows in a single JSON file, rewritten in full on every change
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> JsonFileStore {
        JsonFileStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_rows(&self) -> Result<Vec<CatalogRow>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_rows(&self, rows: &[CatalogRow]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(rows)?;
        let mut partial = self.path.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);
        tokio::fs::write(&partial, json).await?;
        tokio::fs::rename(&partial, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<Catalog>, StoreError> {
        let _guard = self.lock.lock().await;
        rows_into_catalogs(self.read_rows().await?)
    }

    async fn save(&self, catalog: &Catalog) -> Result<(), StoreError> {
        catalog.validate()?;
        let row = CatalogRow::from_catalog(catalog)?;

        let _guard = self.lock.lock().await;
        let mut rows = self.read_rows().await?;
        match rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
        self.write_rows(&rows).await?;
        debug!(path = %self.path.display(), catalog = %catalog.id, "saved catalog");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_rows().await?;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() != before {
            self.write_rows(&rows).await?;
            debug!(path = %self.path.display(), catalog = id, "deleted catalog");
        }
        Ok(())
    }
}
