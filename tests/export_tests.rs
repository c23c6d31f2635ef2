//! End-to-end catalog export tests

mod common;

use async_trait::async_trait;
use base64::Engine;
use catalog_pdf::sink::{NoShare, ShareTarget};
use catalog_pdf::{ExportConfig, Exporter, Page, Product};
use common::{catalog, jpeg, png, products, rendered_pages, runtime, FakeSource};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn exporter(source: FakeSource) -> Exporter {
    Exporter::with_source(ExportConfig::default(), Arc::new(source))
}

fn page_texts(page: &Page) -> Vec<String> {
    page.spans().map(|s| s.text.clone()).collect()
}

#[test]
fn test_zero_products_export_one_header_only_page() {
    runtime().block_on(async {
        let exporter = exporter(FakeSource::new());
        let empty = catalog("Vazio", Vec::new());

        let composed = exporter.compose(&empty).await.unwrap();
        assert_eq!(composed.document.page_count(), 1);
        assert!(composed.report.placements.is_empty());

        let pages: Vec<&Page> = composed.document.pages_in_order().collect();
        assert_eq!(page_texts(pages[0]), vec!["Vazio", "Total de produtos: 0"]);

        let bytes = composed.document.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(rendered_pages(&bytes), 1);
    });
}

#[test]
fn test_long_catalogs_repeat_the_header_on_every_page() {
    runtime().block_on(async {
        let exporter = exporter(FakeSource::new());
        let long = catalog("Coleção de Inverno", products(30));

        let composed = exporter.compose(&long).await.unwrap();
        let pages: Vec<&Page> = composed.document.pages_in_order().collect();
        assert!(pages.len() > 1);
        assert_eq!(pages.len(), composed.report.page_count());

        for page in &pages {
            let texts = page_texts(page);
            assert_eq!(texts[0], "Coleção de Inverno");
            assert_eq!(texts[1], "Total de produtos: 30");
        }

        // product blocks continue in order across pages
        let titles: Vec<String> = pages
            .iter()
            .flat_map(|p| page_texts(p))
            .filter(|t| t.starts_with(|c: char| c.is_ascii_digit()))
            .collect();
        let expected: Vec<String> = (1..=30).map(|n| format!("{n}. Produto {n}")).collect();
        assert_eq!(titles, expected);

        let page_count = pages.len();
        let bytes = composed.document.finish().unwrap();
        assert_eq!(rendered_pages(&bytes), page_count);
    });
}

#[test]
fn test_blocks_stay_within_one_page() {
    runtime().block_on(async {
        let mut source = FakeSource::new();
        let mut items = products(25);
        for (n, product) in items.iter_mut().enumerate() {
            if n % 2 == 0 {
                let uri = format!("https://img.test/{n}.png");
                source = source.with_body(&uri, png(40 + n as u32 * 10, 60), Some("image/png"));
                product.image_uri = Some(uri);
            }
        }
        let exporter = exporter(source);
        let config = ExportConfig::default();
        let page_height = config.page_size.size().1;
        let limit = page_height - config.metrics.margin_bottom;

        let composed = exporter.compose(&catalog("Loja", items)).await.unwrap();
        let report = &composed.report;
        assert_eq!(report.placements.len(), 25);
        assert!(report.page_count() > 1);
        for placement in &report.placements {
            let header_bottom = report.page_content_tops[placement.page];
            assert!(placement.bottom <= limit, "{placement:?}");
            assert!(
                placement.top >= header_bottom - config.metrics.image_lead,
                "{placement:?}"
            );
        }
    });
}

#[test]
fn test_unreachable_images_leave_the_block_without_an_image() {
    runtime().block_on(async {
        let source = FakeSource::new()
            .with_status("https://img.test/gone.png", 500)
            .with_body("https://img.test/ok.jpg", jpeg(120, 90), Some("image/jpeg"))
            .with_body("https://img.test/garbage.png", b"<html>".to_vec(), None);
        let exporter = exporter(source);

        let broken = Product::new("Quebrado", 20.0)
            .with_description("ainda aparece")
            .with_image_uri("https://img.test/gone.png");
        let garbage = Product::new("Lixo", 21.0).with_image_uri("https://img.test/garbage.png");
        let fine = Product::new("Bom", 30.0).with_image_uri("https://img.test/ok.jpg");
        let missing = Product::new("Sem imagem", 40.0).with_image_uri("https://img.test/404.png");

        let composed = exporter
            .compose(&catalog("Loja", vec![broken, garbage, fine, missing]))
            .await
            .unwrap();

        assert_eq!(composed.document.images.len(), 1);
        let page = composed.document.pages_in_order().next().unwrap();
        assert_eq!(page.images().count(), 1);

        let texts = page_texts(page);
        for expected in [
            "1. Quebrado",
            "Preço: R$ 20",
            "ainda aparece",
            "2. Lixo",
            "3. Bom",
            "4. Sem imagem",
        ] {
            assert!(texts.iter().any(|t| t == expected), "missing {expected}");
        }

        // text-only blocks stay at the minimal height, the image block is taller
        let heights: Vec<f32> = composed
            .report
            .placements
            .iter()
            .map(|p| (p.bottom - p.top).0)
            .collect();
        assert_eq!(heights[0], 70.0);
        assert_eq!(heights[1], 70.0);
        assert!(heights[2] > 90.0);
        assert_eq!(heights[3], 70.0);

        assert!(composed.document.finish().is_ok());
    });
}

#[test]
fn test_promotional_price_is_rendered_when_present() {
    runtime().block_on(async {
        let exporter = exporter(FakeSource::new());
        let on_sale = Product::new("Camiseta", 100.0).with_promotional_price(80.0);
        let regular = Product::new("Boné", 50.0);

        let composed = exporter
            .compose(&catalog("Loja", vec![on_sale, regular]))
            .await
            .unwrap();
        let texts = page_texts(composed.document.pages_in_order().next().unwrap());
        assert!(texts.contains(&"Preço: R$ 80".to_string()));
        assert!(texts.contains(&"Preço: R$ 50".to_string()));
        assert!(!texts.contains(&"Preço: R$ 100".to_string()));
    });
}

#[test]
fn test_image_fetches_run_concurrently() {
    runtime().block_on(async {
        const N: usize = 10;
        let delay = Duration::from_millis(300);

        let mut source = FakeSource::new();
        let mut items = products(N);
        for (n, product) in items.iter_mut().enumerate() {
            let uri = format!("https://slow.test/{n}.png");
            source = source.with_slow_body(&uri, png(32, 32), delay);
            product.image_uri = Some(uri);
        }
        let exporter = exporter(source);

        let started = Instant::now();
        let composed = exporter.compose(&catalog("Loja", items)).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(composed.document.images.len(), N);
        assert!(
            elapsed < delay * N as u32,
            "took {elapsed:?}, sequential would be {:?}",
            delay * N as u32
        );
    });
}

#[test]
fn test_hung_fetches_time_out_to_no_image() {
    runtime().block_on(async {
        let source = FakeSource::new()
            .with_slow_body("https://slow.test/hung.png", png(8, 8), Duration::from_secs(30))
            .with_body("https://img.test/ok.png", png(8, 8), Some("image/png"));
        let config = ExportConfig {
            fetch_timeout_secs: 1,
            ..ExportConfig::default()
        };
        let exporter = Exporter::with_source(config, Arc::new(source));

        let hung = Product::new("Lento", 1.0).with_image_uri("https://slow.test/hung.png");
        let ok = Product::new("Rápido", 1.0).with_image_uri("https://img.test/ok.png");

        let started = Instant::now();
        let composed = exporter
            .compose(&catalog("Loja", vec![hung, ok]))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(composed.document.images.len(), 1);
    });
}

#[test]
fn test_exporting_twice_gives_identical_output() {
    runtime().block_on(async {
        let source = FakeSource::new()
            .with_body("https://img.test/logo.png", png(200, 100), Some("image/png"))
            .with_body("https://img.test/a.jpg", jpeg(64, 48), None);
        let exporter = exporter(source);

        let mut items = products(14);
        items[3].image_uri = Some("https://img.test/a.jpg".to_string());
        let mut subject = catalog("Loja", items);
        subject.logo_uri = Some("https://img.test/logo.png".to_string());

        let first = exporter.compose(&subject).await.unwrap();
        let second = exporter.compose(&subject).await.unwrap();
        assert_eq!(first.report, second.report);

        let first = first.document.finish().unwrap();
        let second = second.document.finish().unwrap();
        assert_eq!(first, second);
    });
}

#[test]
fn test_logo_is_drawn_atop_every_page() {
    runtime().block_on(async {
        let source = FakeSource::new().with_body(
            "https://img.test/logo.png",
            png(300, 300),
            Some("image/png"),
        );
        let exporter = exporter(source);
        let mut subject = catalog("Loja", products(20));
        subject.logo_uri = Some("https://img.test/logo.png".to_string());

        let composed = exporter.compose(&subject).await.unwrap();
        assert_eq!(composed.document.images.len(), 1);
        assert!(composed.document.page_count() > 1);
        for page in composed.document.pages_in_order() {
            let logo = page.images().next().expect("logo on page");
            // scaled down into the 80x80 box, drawn at the left margin
            assert_eq!(logo.width.0, 80.0);
            assert_eq!(logo.origin.0 .0, 40.0);
        }
    });
}

#[test]
fn test_default_source_reads_data_uris_and_files() {
    runtime().block_on(async {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, jpeg(50, 50)).unwrap();

        let data_uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png(10, 20))
        );
        let items = vec![
            Product::new("Arquivo", 1.0).with_image_uri(path.to_string_lossy()),
            Product::new("Inline", 2.0).with_image_uri(data_uri),
        ];

        let exporter = Exporter::new(ExportConfig::default());
        let composed = exporter.compose(&catalog("Loja", items)).await.unwrap();
        assert_eq!(composed.document.images.len(), 2);
    });
}

#[derive(Default)]
struct RecordingShare {
    shared: Mutex<Vec<(PathBuf, String)>>,
}

#[async_trait]
impl ShareTarget for RecordingShare {
    async fn is_available(&self) -> bool {
        true
    }

    async fn share(&self, path: &Path, title: &str) -> std::io::Result<()> {
        self.shared
            .lock()
            .unwrap()
            .push((path.to_path_buf(), title.to_string()));
        Ok(())
    }
}

#[test]
fn test_export_to_cache_writes_and_shares() {
    runtime().block_on(async {
        let dir = TempDir::new().unwrap();
        let config = ExportConfig {
            cache_dir: dir.path().to_path_buf(),
            ..ExportConfig::default()
        };
        let exporter = Exporter::with_source(config, Arc::new(FakeSource::new()));
        let subject = catalog("Verão", products(3));
        let share = RecordingShare::default();

        let path = exporter.export_to_cache(&subject, &share).await.unwrap();
        assert_eq!(path, dir.path().join(format!("catapp-{}.pdf", subject.id)));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(
            share.shared.lock().unwrap().as_slice(),
            &[(path.clone(), "Exportar catálogo Verão".to_string())]
        );

        // a second export of the same catalog overwrites the first
        let again = exporter.export_to_cache(&subject, &NoShare).await.unwrap();
        assert_eq!(again, path);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(std::fs::read(&again).unwrap(), bytes);
    });
}

#[test]
fn test_sink_failures_are_export_errors() {
    runtime().block_on(async {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();
        let config = ExportConfig {
            cache_dir: blocker,
            ..ExportConfig::default()
        };
        let exporter = Exporter::with_source(config, Arc::new(FakeSource::new()));

        let result = exporter
            .export_to_cache(&catalog("Loja", Vec::new()), &NoShare)
            .await;
        assert!(matches!(
            result,
            Err(catalog_pdf::ExportError::Write { .. })
        ));
    });
}

#[test]
fn test_dropped_export_stops_its_fetches() {
    runtime().block_on(async {
        let mut source = FakeSource::new();
        let mut items = Vec::new();
        for n in 0..5 {
            let uri = format!("https://img.test/slow-{n}.png");
            source = source.with_slow_body(&uri, png(8, 8), Duration::from_millis(300));
            items.push(Product::new(format!("Produto {n}"), 1.0).with_image_uri(uri));
        }
        let source = Arc::new(source);
        let exporter = Exporter::with_source(ExportConfig::default(), source.clone());
        let subject = catalog("Loja", items);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(50), exporter.compose(&subject)).await;
        assert!(cancelled.is_err());
        assert_eq!(source.fetches(), 5);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(source.completed(), 0);
    });
}

#[test]
fn test_truetype_font_is_embedded() {
    runtime().block_on(async {
        let font = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("assets")
            .join("DejaVuSansMono.ttf");
        let config = ExportConfig {
            font_path: Some(font),
            compress: false,
            ..ExportConfig::default()
        };
        let exporter = Exporter::with_source(config, Arc::new(FakeSource::new()));

        let bytes = exporter
            .export(&catalog("Loja", products(3)))
            .await
            .unwrap();
        let contains = |needle: &[u8]| bytes.windows(needle.len()).any(|w| w == needle);
        assert!(contains(b"/FontFile2"));
        assert!(contains(b"/CIDFontType2"));
        assert!(contains(b"/Identity-H"));
        assert!(contains(b"/ToUnicode"));
        assert!(contains(b"/W ["));
        assert!(!contains(b"/Helvetica"));
        assert_eq!(rendered_pages(&bytes), 1);
    });
}

#[test]
fn test_unusable_font_fails_the_export() {
    runtime().block_on(async {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("broken.ttf");
        std::fs::write(&font, b"not a font").unwrap();
        let config = ExportConfig {
            font_path: Some(font),
            ..ExportConfig::default()
        };
        let exporter = Exporter::with_source(config, Arc::new(FakeSource::new()));

        let result = exporter.export(&catalog("Loja", Vec::new())).await;
        assert!(matches!(
            result,
            Err(catalog_pdf::ExportError::Document(_))
        ));
    });
}
