//! Image normalization against an in-memory source

mod common;

use catalog_pdf::normalize::{normalize, try_normalize, NormalizeError};
use catalog_pdf::source::DefaultSource;
use catalog_pdf::ImageSlot;
use common::{jpeg, png, runtime, FakeSource};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_missing_uris_are_absent_without_fetching() {
    runtime().block_on(async {
        let source = FakeSource::new();
        assert_eq!(normalize(&source, None, None).await, ImageSlot::Absent);
        assert_eq!(normalize(&source, Some("   "), None).await, ImageSlot::Absent);
        assert_eq!(source.fetches(), 0);
    });
}

#[test]
fn test_declared_content_type_beats_the_extension() {
    runtime().block_on(async {
        let source =
            FakeSource::new().with_body("https://img.test/a.png", jpeg(30, 20), Some("image/jpeg"));
        let canonical = normalize(&source, Some("https://img.test/a.png"), None)
            .await
            .into_option()
            .expect("jpeg decodes");
        assert_eq!((canonical.width, canonical.height), (30, 20));
        assert_eq!(
            image::guess_format(&canonical.png).unwrap(),
            image::ImageFormat::Png
        );
    });
}

#[test]
fn test_extension_is_used_without_a_content_type() {
    runtime().block_on(async {
        let source = FakeSource::new().with_body("https://img.test/b.jpeg?size=large", jpeg(8, 8), None);
        let slot = normalize(&source, Some("https://img.test/b.jpeg?size=large"), None).await;
        assert!(slot.is_present());
    });
}

#[test]
fn test_unknown_formats_default_to_png() {
    runtime().block_on(async {
        let source = FakeSource::new()
            .with_body("https://img.test/raw", png(5, 5), Some("application/octet-stream"))
            .with_body("https://img.test/raw-jpeg", jpeg(5, 5), None);
        assert!(normalize(&source, Some("https://img.test/raw"), None)
            .await
            .is_present());
        // decoded as PNG, which JPEG bytes are not
        let result = try_normalize(&source, "https://img.test/raw-jpeg", None).await;
        assert!(matches!(result, Err(NormalizeError::Decode { .. })));
    });
}

#[test]
fn test_error_statuses_and_empty_bodies_are_absent() {
    runtime().block_on(async {
        let source = FakeSource::new()
            .with_status("https://img.test/forbidden.png", 403)
            .with_body("https://img.test/empty.png", Vec::new(), Some("image/png"));

        assert_eq!(
            normalize(&source, Some("https://img.test/forbidden.png"), None).await,
            ImageSlot::Absent
        );
        assert!(matches!(
            try_normalize(&source, "https://img.test/empty.png", None).await,
            Err(NormalizeError::Empty)
        ));
        assert_eq!(source.fetches(), 2);
    });
}

#[test]
fn test_timeouts_resolve_to_absent() {
    runtime().block_on(async {
        let source = FakeSource::new().with_slow_body(
            "https://img.test/slow.png",
            png(4, 4),
            Duration::from_secs(20),
        );
        let result = try_normalize(
            &source,
            "https://img.test/slow.png",
            Some(Duration::from_millis(100)),
        )
        .await;
        assert!(matches!(result, Err(NormalizeError::Timeout(_))));
    });
}

#[cfg(unix)]
#[test]
fn test_percent_encoded_file_uris_resolve() {
    runtime().block_on(async {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("@user").join("app");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("photo 1.png"), png(12, 6)).unwrap();

        let uri = format!(
            "file://{}/%40user/app/photo%201.png",
            dir.path().display()
        );
        let canonical = normalize(&DefaultSource::new(), Some(uri.as_str()), None)
            .await
            .into_option()
            .expect("local image resolves");
        assert_eq!((canonical.width, canonical.height), (12, 6));
    });
}
