//! Image embedding: turn canonical PNG bytes into an image resource of a
//! [Document] and work out how large to draw it.
//!
//! Embedding happens in two steps so that the expensive part can run off the
//! document: [prepare] decodes pixels and needs nothing but the bytes, while
//! [register] only allocates the decoded raster in the document's arena.

use crate::document::Document;
use crate::image::RasterImage;
use crate::normalize::CanonicalImage;
use crate::slot::ImageSlot;
use crate::units::Pt;
use id_arena::Id;
use tracing::warn;

/// An image registered with a document, with the size to draw it at
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub id: Id<RasterImage>,
    pub width: Pt,
    pub height: Pt,
}

/// Scale `(width, height)` down to fit inside `max_box`, keeping its aspect ratio.
/// Images that already fit keep their natural size. The limiting side comes out
/// exactly at the box edge.
pub fn scale_to_fit(width: f32, height: f32, max_box: (Pt, Pt)) -> (Pt, Pt) {
    if width <= 0.0 || height <= 0.0 {
        return (Pt(0.0), Pt(0.0));
    }
    let (box_width, box_height) = max_box;
    let scale_x = box_width.0 / width;
    let scale_y = box_height.0 / height;
    if scale_x >= 1.0 && scale_y >= 1.0 {
        (Pt(width), Pt(height))
    } else if scale_x <= scale_y {
        (box_width, Pt(height * scale_x))
    } else {
        (Pt(width * scale_y), box_height)
    }
}

/// Decode canonical PNG bytes into a raster that can be embedded
pub fn prepare(canonical: ImageSlot<CanonicalImage>) -> ImageSlot<RasterImage> {
    canonical.and_then(|canonical| match RasterImage::from_png(&canonical.png) {
        Ok(raster) => ImageSlot::Present(raster),
        Err(error) => {
            warn!(%error, "image could not be embedded, continuing without it");
            ImageSlot::Absent
        }
    })
}

/// Register a prepared raster with `doc` and size it to fit `max_box`
pub fn register(
    doc: &mut Document,
    raster: ImageSlot<RasterImage>,
    max_box: (Pt, Pt),
) -> ImageSlot<EmbeddedImage> {
    raster.map(|raster| {
        let (width, height) = scale_to_fit(raster.width as f32, raster.height as f32, max_box);
        let id = doc.add_image(raster);
        EmbeddedImage { id, width, height }
    })
}

/// Embed a canonical image into `doc` in one go
pub fn embed(
    doc: &mut Document,
    canonical: ImageSlot<CanonicalImage>,
    max_box: (Pt, Pt),
) -> ImageSlot<EmbeddedImage> {
    register(doc, prepare(canonical), max_box)
}
