//! Export configuration, loadable from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock catalog look: A4 pages, Helvetica, brand-blue titles, Portuguese labels.

use crate::pagesize::PaperFormat;
use crate::units::Pt;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [ExportConfig::cache_dir]
pub const ENV_CACHE_DIR: &str = "CATALOG_PDF_CACHE_DIR";

/// Environment variable overriding [ExportConfig::fetch_timeout_secs]
pub const ENV_FETCH_TIMEOUT: &str = "CATALOG_PDF_FETCH_TIMEOUT";

/// Fixed geometry of the catalog layout. Vertical positions inside the header
/// are distances from the top edge of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub margin_left: Pt,
    /// Blocks never extend below this distance from the bottom edge
    pub margin_bottom: Pt,
    /// Where the first block starts when the header has no logo
    pub header_content_top: Pt,
    pub title_baseline: Pt,
    pub title_size: Pt,
    pub caption_baseline: Pt,
    pub caption_size: Pt,
    pub logo_top: Pt,
    /// Horizontal gap between an image and the text beside it
    pub image_text_gap: Pt,
    /// Vertical gap kept between the bottom of the logo and the first block
    pub logo_clearance: Pt,
    pub name_size: Pt,
    pub price_offset: Pt,
    pub price_size: Pt,
    pub description_offset: Pt,
    pub description_size: Pt,
    /// How far a product image rises above its block's title baseline
    pub image_lead: Pt,
    /// Extra height an image block needs beyond the image itself
    pub image_padding: Pt,
    pub min_image_block: Pt,
    pub text_block: Pt,
    pub max_image_width: Pt,
    pub max_image_height: Pt,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        LayoutMetrics {
            margin_left: Pt(40.0),
            margin_bottom: Pt(80.0),
            header_content_top: Pt(140.0),
            title_baseline: Pt(60.0),
            title_size: Pt(28.0),
            caption_baseline: Pt(100.0),
            caption_size: Pt(14.0),
            logo_top: Pt(40.0),
            image_text_gap: Pt(24.0),
            logo_clearance: Pt(20.0),
            name_size: Pt(16.0),
            price_offset: Pt(18.0),
            price_size: Pt(12.0),
            description_offset: Pt(36.0),
            description_size: Pt(10.0),
            image_lead: Pt(18.0),
            image_padding: Pt(40.0),
            min_image_block: Pt(90.0),
            text_block: Pt(70.0),
            max_image_width: Pt(80.0),
            max_image_height: Pt(80.0),
        }
    }
}

impl LayoutMetrics {
    /// The bounding box every embedded image is scaled down into
    pub fn image_box(&self) -> (Pt, Pt) {
        (self.max_image_width, self.max_image_height)
    }
}

/// Text templates. `{name}`-style placeholders are substituted when drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    /// Header caption; `{count}` is the number of products
    pub caption: String,
    /// Product price line; `{price}` is the effective price
    pub price: String,
    /// Product title; `{index}` is the 1-based position, `{name}` the product name
    pub title: String,
    /// Share dialog title; `{name}` is the catalog name
    pub share_title: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            caption: "Total de produtos: {count}".to_string(),
            price: "Preço: R$ {price}".to_string(),
            title: "{index}. {name}".to_string(),
            share_title: "Exportar catálogo {name}".to_string(),
        }
    }
}

impl Labels {
    pub fn caption(&self, count: usize) -> String {
        self.caption.replace("{count}", &count.to_string())
    }

    pub fn price(&self, price: &str) -> String {
        self.price.replace("{price}", price)
    }

    pub fn title(&self, index: usize, name: &str) -> String {
        self.title
            .replace("{index}", &index.to_string())
            .replace("{name}", name)
    }

    pub fn share_title(&self, name: &str) -> String {
        self.share_title.replace("{name}", name)
    }
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("catalog-pdf")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub page_size: PaperFormat,
    pub metrics: LayoutMetrics,
    pub labels: Labels,
    /// Per-image fetch limit; `0` disables it
    pub fetch_timeout_secs: u64,
    /// Draw titles in the catalog's primary colour rather than brand blue
    pub use_palette_accent: bool,
    /// Clip descriptions that run past the right margin, ending them with `…`
    pub clip_descriptions: bool,
    /// Deflate page content streams
    pub compress: bool,
    /// TrueType font to embed instead of the built-in Helvetica
    pub font_path: Option<PathBuf>,
    /// Where exported documents are written
    pub cache_dir: PathBuf,
    /// Exported files are named `{file_prefix}{catalog id}.pdf`
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            page_size: PaperFormat::default(),
            metrics: LayoutMetrics::default(),
            labels: Labels::default(),
            fetch_timeout_secs: 15,
            use_palette_accent: false,
            clip_descriptions: true,
            compress: true,
            font_path: None,
            cache_dir: default_cache_dir(),
            file_prefix: "catapp-".to_string(),
        }
    }
}

impl ExportConfig {
    /// Read a config file, then apply environment overrides
    pub fn load(path: &Path) -> Result<ExportConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<ExportConfig, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(secs) = std::env::var(ENV_FETCH_TIMEOUT)
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.fetch_timeout_secs = secs;
        }
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }
}
