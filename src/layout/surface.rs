use crate::colour::Colour;
use crate::document::Document;
use crate::embed::EmbeddedImage;
use crate::font::Font;
use crate::layout::Margins;
use crate::page::{ImageLayout, Page, SpanFont, SpanLayout};
use crate::pagesize::PageSize;
use crate::units::Pt;
use id_arena::Id;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextStyle {
    pub size: Pt,
    pub colour: Colour,
}

/// What the layout engine draws onto. All coordinates are PDF user space, with
/// the origin at the bottom-left corner of the page.
pub trait Surface {
    /// Start a new page and make it the target of subsequent draws
    fn begin_page(&mut self) -> PageSize;

    /// Draw a single line of text starting at the baseline point `origin`
    fn draw_text(&mut self, text: &str, origin: (Pt, Pt), style: TextStyle);

    /// Draw an image at its display size, with its bottom-left corner at `origin`
    fn draw_image(&mut self, image: &EmbeddedImage, origin: (Pt, Pt));

    /// Advance width of `text` when set at `size`
    fn text_width(&self, text: &str, size: Pt) -> Pt;
}

/// Draws into the pages of a [Document], all text set in one shared font
pub struct DocumentSurface<'d> {
    doc: &'d mut Document,
    size: PageSize,
    margins: Margins,
    font: Id<Font>,
    current: Option<Id<Page>>,
}

impl<'d> DocumentSurface<'d> {
    pub fn new(doc: &'d mut Document, size: PageSize, margins: Margins, font: Id<Font>) -> Self {
        DocumentSurface {
            doc,
            size,
            margins,
            font,
            current: None,
        }
    }

    fn new_page(&mut self) -> Id<Page> {
        let id = self.doc.add_page(Page::new(self.size, Some(self.margins)));
        self.current = Some(id);
        id
    }

    /// The page being drawn on, started on first use
    fn page(&mut self) -> &mut Page {
        let id = match self.current {
            Some(id) => id,
            None => self.new_page(),
        };
        &mut self.doc.pages[id]
    }
}

impl Surface for DocumentSurface<'_> {
    fn begin_page(&mut self) -> PageSize {
        self.new_page();
        self.size
    }

    fn draw_text(&mut self, text: &str, origin: (Pt, Pt), style: TextStyle) {
        let font = SpanFont {
            id: self.font,
            size: style.size,
        };
        self.page().add_span(SpanLayout {
            text: text.to_string(),
            font,
            colour: style.colour,
            coords: origin,
        });
    }

    fn draw_image(&mut self, image: &EmbeddedImage, origin: (Pt, Pt)) {
        self.page().add_image(ImageLayout {
            image_id: image.id,
            origin,
            width: image.width,
            height: image.height,
        });
    }

    fn text_width(&self, text: &str, size: Pt) -> Pt {
        self.doc.fonts[self.font].width_of_text(text, size)
    }
}
