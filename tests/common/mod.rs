//! Shared fixtures: an in-memory image source and generated images.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog_pdf::source::{FetchError, Fetched, ImageSource};
use catalog_pdf::{Catalog, Palette, Product};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

pub fn encoded(width: u32, height: u32, format: ImageOutputFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, 90, 255])
    }));
    let image = match format {
        // JPEG has no alpha channel
        ImageOutputFormat::Jpeg(_) => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageOutputFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encoded(width, height, ImageOutputFormat::Jpeg(85))
}

#[derive(Clone)]
enum Response {
    Body {
        bytes: Vec<u8>,
        content_type: Option<String>,
        delay: Duration,
    },
    Status(u16),
}

/// Serves canned responses by URI; unknown URIs answer 404
#[derive(Default)]
pub struct FakeSource {
    responses: HashMap<String, Response>,
    fetches: AtomicUsize,
    completed: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> FakeSource {
        FakeSource::default()
    }

    pub fn with_body(mut self, uri: &str, bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        self.responses.insert(
            uri.to_string(),
            Response::Body {
                bytes,
                content_type: content_type.map(str::to_string),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn with_slow_body(mut self, uri: &str, bytes: Vec<u8>, delay: Duration) -> Self {
        self.responses.insert(
            uri.to_string(),
            Response::Body {
                bytes,
                content_type: Some("image/png".to_string()),
                delay,
            },
        );
        self
    }

    pub fn with_status(mut self, uri: &str, status: u16) -> Self {
        self.responses
            .insert(uri.to_string(), Response::Status(status));
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Fetches that ran to the end, delay included
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSource for FakeSource {
    async fn fetch(&self, uri: &str) -> Result<Fetched, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(uri).cloned() {
            Some(Response::Body {
                bytes,
                content_type,
                delay,
            }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                self.completed.fetch_add(1, Ordering::SeqCst);
                Ok(Fetched {
                    bytes,
                    content_type,
                })
            }
            Some(Response::Status(status)) => Err(FetchError::Status { status }),
            None => Err(FetchError::Status { status: 404 }),
        }
    }
}

/// A catalog with a fixed id and timestamps, so exports are reproducible
pub fn catalog(name: &str, products: Vec<Product>) -> Catalog {
    let mut catalog = Catalog::new(name, Palette::default());
    catalog.id = "5c7a1b2e-0d4f-4a8b-9c3e-1f2a3b4c5d6e".to_string();
    catalog.created_at = "2024-03-01T12:00:00.000Z".to_string();
    catalog.updated_at = "2024-03-02T08:30:00.000Z".to_string();
    catalog.products = products;
    catalog
}

/// Products with fixed ids and lorem ipsum descriptions
pub fn products(count: usize) -> Vec<Product> {
    (0..count)
        .map(|n| {
            let mut product = Product::new(format!("Produto {}", n + 1), 10.0 + n as f64)
                .with_description(lipsum::lipsum_words(12 + n % 40));
            product.id = format!("p{n}");
            product
        })
        .collect()
}

/// Count whole-token occurrences of `/Type /Page` in rendered PDF bytes
pub fn rendered_pages(bytes: &[u8]) -> usize {
    let count = |token: &[u8]| bytes.windows(token.len()).filter(|w| *w == token).count();
    count(b"/Type /Page") - count(b"/Type /Pages")
}
