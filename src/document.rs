use crate::{
    font::Font,
    image::RasterImage,
    info::Info,
    page::Page,
    refs::{ObjectReferences, RefType},
    PdfError,
};
use id_arena::{Arena, Id};
use pdf_writer::{Finish, Pdf, Ref};

/// A document is the main object that stores all the contents of the PDF
/// then renders it out with a call to [Document::write]
pub struct Document {
    pub info: Option<Info>,
    pub pages: Arena<Page>,
    pub page_order: Vec<Id<Page>>,
    pub fonts: Arena<Font>,
    pub images: Arena<RasterImage>,
    /// Whether page content streams are deflated when written
    pub compress: bool,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            info: None,
            pages: Arena::new(),
            page_order: Vec::new(),
            fonts: Arena::new(),
            images: Arena::new(),
            compress: true,
        }
    }
}

impl Document {
    /// Sets information about the document. If not provided, no information block will be
    /// written to the PDF
    pub fn set_info(&mut self, info: Info) {
        self.info = Some(info);
    }

    /// Add a page to the end of the document, returning its id
    pub fn add_page(&mut self, page: Page) -> Id<Page> {
        let id = self.pages.alloc(page);
        self.page_order.push(id);
        id
    }

    /// Number of pages that will be written
    pub fn page_count(&self) -> usize {
        self.page_order.len()
    }

    /// Pages in the order they will appear in the document
    pub fn pages_in_order(&self) -> impl Iterator<Item = &Page> {
        self.page_order.iter().filter_map(|id| self.pages.get(*id))
    }

    /// Add a font to the document structure. Fonts are stored "globally" within
    /// the document, such that any page can refer to it by its id.
    pub fn add_font(&mut self, font: Font) -> Id<Font> {
        self.fonts.alloc(font)
    }

    /// Add an image to the document structure. Images are stored "globally" within the
    /// document, such that any page can re-use an image by referring to its id.
    pub fn add_image(&mut self, image: RasterImage) -> Id<RasterImage> {
        self.images.alloc(image)
    }

    /// Render the document into PDF bytes.
    ///
    /// Until this is called all references are unresolved; rendering generates the
    /// PDF objects and the references between them.
    pub fn finish(self) -> Result<Vec<u8>, PdfError> {
        let Document {
            info,
            pages,
            page_order,
            fonts,
            images,
            compress,
        } = self;

        let mut refs = ObjectReferences::new();

        let catalog_id = refs.gen(RefType::Catalog);
        let page_tree_id = refs.gen(RefType::PageTree);

        let mut writer = Pdf::new();
        if let Some(info) = info {
            info.write(&mut refs, &mut writer);
        }

        for (id, font) in fonts.iter() {
            font.write(&mut refs, id, &mut writer)?;
        }

        for (id, image) in images.iter() {
            image.write(&mut refs, id.index(), &mut writer);
        }

        let mut page_refs: Vec<Ref> = Vec::with_capacity(page_order.len());
        for (page_index, id) in page_order.iter().enumerate() {
            let page = pages.get(*id).ok_or(PdfError::PageMissing)?;
            page.write(&mut refs, page_index, &fonts, &images, compress, &mut writer)?;
            page_refs.push(refs.get(RefType::Page(page_index)).ok_or(PdfError::PageMissing)?);
        }

        writer
            .pages(page_tree_id)
            .count(page_refs.len() as i32)
            .kids(page_refs);

        let mut catalog = writer.catalog(catalog_id);
        catalog.pages(page_tree_id);
        catalog.finish();

        Ok(writer.finish())
    }
}
