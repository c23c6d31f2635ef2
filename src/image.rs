use crate::refs::{ObjectReferences, RefType};
use image::{DynamicImage, GenericImageView};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Pdf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// A decoded raster, ready to be written into a PDF as an image XObject.
///
/// Pixels are stored as deflated 8-bit RGB samples. Any transparency is split off
/// into a separate deflated greyscale soft mask, which is only kept if at least one
/// pixel is not fully opaque.
pub struct RasterImage {
    /// Natural width, in pixels
    pub width: u32,
    /// Natural height, in pixels
    pub height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl RasterImage {
    /// Decode canonical PNG bytes into a raster
    pub fn from_png(bytes: &[u8]) -> Result<RasterImage, ImageError> {
        let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)?;
        Self::from_dynamic(&image)
    }

    pub fn from_dynamic(image: &DynamicImage) -> Result<RasterImage, ImageError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::Empty { width, height });
        }

        let level = CompressionLevel::DefaultLevel as u8;
        let rgba = image.to_rgba8();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }

        let alpha = alpha
            .iter()
            .any(|&a| a != u8::MAX)
            .then(|| compress_to_vec_zlib(&alpha, level));

        Ok(RasterImage {
            width,
            height,
            rgb: compress_to_vec_zlib(&rgb, level),
            alpha,
        })
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, image_index: usize, writer: &mut Pdf) {
        let id = refs.gen(RefType::Image(image_index));
        let mask_id = self
            .alpha
            .as_ref()
            .map(|_| refs.gen(RefType::ImageMask(image_index)));

        let mut image = writer.image_xobject(id, self.rgb.as_slice());
        image.filter(Filter::FlateDecode);
        image.width(self.width as i32);
        image.height(self.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        if let Some(mask_id) = mask_id {
            image.s_mask(mask_id);
        }
        image.finish();

        // add a transparency mask if we have one
        if let (Some(mask_id), Some(alpha)) = (mask_id, &self.alpha) {
            let mut s_mask = writer.image_xobject(mask_id, alpha.as_slice());
            s_mask.filter(Filter::FlateDecode);
            s_mask.width(self.width as i32);
            s_mask.height(self.height as i32);
            s_mask.color_space().device_gray();
            s_mask.bits_per_component(8);
        }
    }
}
