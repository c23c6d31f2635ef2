use crate::colour::Colour;
use crate::content::render_contents;
use crate::font::Font;
use crate::image::RasterImage;
use crate::layout::Margins;
use crate::pagesize::PageSize;
use crate::rect::Rect;
use crate::refs::{ObjectReferences, RefType};
use crate::units::*;
use crate::PdfError;
use id_arena::{Arena, Id};
use pdf_writer::{Filter, Finish, Name, Pdf};

/// The font and size a span of text is set in
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SpanFont {
    pub id: Id<Font>,
    pub size: Pt,
}

/// A single line of text, positioned by the start of its baseline
#[derive(Clone, PartialEq, Debug)]
pub struct SpanLayout {
    pub text: String,
    pub font: SpanFont,
    pub colour: Colour,
    pub coords: (Pt, Pt),
}

/// An image drawn at a size on the page, `origin` being its lower-left corner
#[derive(Clone, PartialEq, Debug)]
pub struct ImageLayout {
    pub image_id: Id<RasterImage>,
    pub origin: (Pt, Pt),
    pub width: Pt,
    pub height: Pt,
}

#[derive(Clone, PartialEq, Debug)]
pub enum PageContents {
    Text(Vec<SpanLayout>),
    Image(ImageLayout),
}

/// A single page of a document, holding everything drawn on it in drawing order
pub struct Page {
    /// The size of the page
    pub media_box: Rect,
    /// Where content can live, i.e. within the margins
    pub content_box: Rect,
    /// The laid out contents
    pub contents: Vec<PageContents>,
}

impl Page {
    pub fn new(size: PageSize, margins: Option<Margins>) -> Page {
        let (width, height) = size;
        let margins = margins.unwrap_or_else(Margins::empty);
        Page {
            media_box: Rect {
                x1: Pt(0.0),
                y1: Pt(0.0),
                x2: width,
                y2: height,
            },
            content_box: Rect {
                x1: margins.left,
                y1: margins.bottom,
                x2: width - margins.right,
                y2: height - margins.top,
            },
            contents: Vec::default(),
        }
    }

    pub fn width(&self) -> Pt {
        self.media_box.width()
    }

    pub fn height(&self) -> Pt {
        self.media_box.height()
    }

    pub fn add_span(&mut self, span: SpanLayout) {
        self.contents.push(PageContents::Text(vec![span]));
    }

    pub fn add_image(&mut self, image: ImageLayout) {
        self.contents.push(PageContents::Image(image));
    }

    /// All text spans on the page, in drawing order
    pub fn spans(&self) -> impl Iterator<Item = &SpanLayout> {
        self.contents
            .iter()
            .filter_map(|c| match c {
                PageContents::Text(spans) => Some(spans),
                PageContents::Image(_) => None,
            })
            .flatten()
    }

    /// All images on the page, in drawing order
    pub fn images(&self) -> impl Iterator<Item = &ImageLayout> {
        self.contents.iter().filter_map(|c| match c {
            PageContents::Image(image) => Some(image),
            PageContents::Text(_) => None,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn write(
        &self,
        refs: &mut ObjectReferences,
        page_index: usize,
        fonts: &Arena<Font>,
        images: &Arena<RasterImage>,
        compress: bool,
        writer: &mut Pdf,
    ) -> Result<(), PdfError> {
        let id = refs.gen(RefType::Page(page_index));
        let page_tree = refs.get(RefType::PageTree).ok_or(PdfError::PageMissing)?;
        let content_id = refs.gen(RefType::ContentForPage(page_index));

        let mut page = writer.page(id);
        page.media_box(self.media_box.into());
        page.art_box(self.content_box.into());
        page.parent(page_tree);

        let mut resources = page.resources();
        let mut resource_fonts = resources.fonts();
        for (font_id, _) in fonts.iter() {
            if let Some(font_ref) = refs.get(RefType::Font(font_id.index())) {
                resource_fonts.pair(Name(format!("F{}", font_id.index()).as_bytes()), font_ref);
            }
        }
        resource_fonts.finish();
        let mut resource_xobjects = resources.x_objects();
        for (image_id, _) in images.iter() {
            if let Some(image_ref) = refs.get(RefType::Image(image_id.index())) {
                resource_xobjects.pair(
                    Name(format!("I{}", image_id.index()).as_bytes()),
                    image_ref,
                );
            }
        }
        resource_xobjects.finish();
        resources.finish();

        page.contents(content_id);
        page.finish();

        let rendered = render_contents(&self.contents, fonts)?;
        if compress {
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(
                &rendered,
                miniz_oxide::deflate::CompressionLevel::DefaultLevel as u8,
            );
            writer
                .stream(content_id, compressed.as_slice())
                .filter(Filter::FlateDecode);
        } else {
            writer.stream(content_id, rendered.as_slice());
        }

        Ok(())
    }
}
