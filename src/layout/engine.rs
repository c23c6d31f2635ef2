//! Pagination: a single greedy pass over the block sequence.
//!
//! Each page starts with the header block. Product blocks are then stacked
//! downwards from the header; a block that would cross the bottom margin goes to
//! the top of a fresh page instead. Blocks are never split and never reordered.

use super::blocks::{ContentBlock, HeaderBlock, ProductBlock};
use super::coords::flip_y;
use super::surface::{Surface, TextStyle};
use crate::colour::{colours, Colour};
use crate::config::LayoutMetrics;
use crate::pagesize::PageSize;
use crate::slot::ImageSlot;
use crate::units::Pt;
use tracing::{debug, warn};

/// Appended to descriptions clipped at the right margin
pub const ELLIPSIS: char = '…';

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayoutStyle {
    /// Catalog and product titles
    pub accent: Colour,
    /// Caption and price lines
    pub text: Colour,
    /// Descriptions
    pub muted: Colour,
    pub clip_descriptions: bool,
}

impl Default for LayoutStyle {
    fn default() -> Self {
        LayoutStyle {
            accent: colours::BRAND_BLUE,
            text: colours::TEXT,
            muted: colours::MUTED_TEXT,
            clip_descriptions: true,
        }
    }
}

/// Where a product block ended up, as distances from the top of its page
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlockPlacement {
    pub page: usize,
    pub top: Pt,
    pub bottom: Pt,
}

/// The pagination decisions of one layout pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutReport {
    /// For each page, where the content below its header starts
    pub page_content_tops: Vec<Pt>,
    /// One entry per product block, in order
    pub placements: Vec<BlockPlacement>,
}

impl LayoutReport {
    pub fn page_count(&self) -> usize {
        self.page_content_tops.len()
    }
}

/// The mutable part of a layout pass
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LayoutState {
    /// Zero-based index of the current page; `None` until the first page starts
    pub page: Option<usize>,
    pub page_size: PageSize,
    /// Next free position, as a distance from the top of the page
    pub cursor: Pt,
    pub blocks_on_page: usize,
}

pub struct LayoutEngine<'a, S: Surface> {
    surface: &'a mut S,
    metrics: &'a LayoutMetrics,
    style: LayoutStyle,
    header: Option<HeaderBlock>,
    state: LayoutState,
    report: LayoutReport,
}

impl<'a, S: Surface> LayoutEngine<'a, S> {
    pub fn new(surface: &'a mut S, metrics: &'a LayoutMetrics, style: LayoutStyle) -> Self {
        LayoutEngine {
            surface,
            metrics,
            style,
            header: None,
            state: LayoutState::default(),
            report: LayoutReport::default(),
        }
    }

    pub fn state(&self) -> &LayoutState {
        &self.state
    }

    /// Set the header drawn atop every page started from now on
    pub fn set_header(&mut self, header: HeaderBlock) {
        self.header = Some(header);
    }

    /// Start a new page with the header drawn on it. Returns the cursor, which
    /// sits just below the header's lowest extent.
    pub fn start_page(&mut self) -> Pt {
        let page_size = self.surface.begin_page();
        let page = self.state.page.map_or(0, |p| p + 1);

        let cursor = match &self.header {
            Some(header) => {
                draw_header(self.surface, self.metrics, &self.style, header, page_size.1)
            }
            None => self.metrics.header_content_top,
        };

        debug!(page, cursor = cursor.0, "started page");
        self.state = LayoutState {
            page: Some(page),
            page_size,
            cursor,
            blocks_on_page: 0,
        };
        self.report.page_content_tops.push(cursor);
        cursor
    }

    /// Place a product block below the previous one, starting a new page first
    /// when it wouldn't fit above the bottom margin
    pub fn place_block(&mut self, block: &ProductBlock) -> BlockPlacement {
        let metrics = self.metrics;
        if self.state.page.is_none() {
            self.start_page();
        }

        let height = block.height(metrics);
        let limit = self.state.page_size.1 - metrics.margin_bottom;
        if self.state.cursor + height > limit {
            if self.state.blocks_on_page > 0 {
                self.start_page();
            }
            if self.state.cursor + height > limit {
                warn!(
                    block = %block.title,
                    height = height.0,
                    "block is taller than a page can hold, placing it anyway"
                );
            }
        }

        let page_height = self.state.page_size.1;
        let cursor = self.state.cursor;
        let mut text_x = metrics.margin_left;

        if let ImageSlot::Present(image) = &block.image {
            let image_bottom = cursor - metrics.image_lead + image.height;
            self.surface
                .draw_image(image, (metrics.margin_left, flip_y(page_height, image_bottom)));
            text_x += image.width + metrics.image_text_gap;
        }

        self.surface.draw_text(
            &block.title,
            (text_x, flip_y(page_height, cursor)),
            TextStyle {
                size: metrics.name_size,
                colour: self.style.accent,
            },
        );
        self.surface.draw_text(
            &block.price,
            (text_x, flip_y(page_height, cursor + metrics.price_offset)),
            TextStyle {
                size: metrics.price_size,
                colour: self.style.text,
            },
        );
        if let Some(description) = &block.description {
            let description = if self.style.clip_descriptions {
                let available = self.state.page_size.0 - metrics.margin_left - text_x;
                clip_to_width(&*self.surface, description, metrics.description_size, available)
            } else {
                description.clone()
            };
            self.surface.draw_text(
                &description,
                (text_x, flip_y(page_height, cursor + metrics.description_offset)),
                TextStyle {
                    size: metrics.description_size,
                    colour: self.style.muted,
                },
            );
        }

        self.state.cursor = cursor + height;
        self.state.blocks_on_page += 1;

        let placement = BlockPlacement {
            page: self.state.page.unwrap_or_default(),
            top: cursor - block.lead(metrics),
            bottom: cursor + height,
        };
        self.report.placements.push(placement);
        placement
    }

    /// End the pass. A pass that placed nothing still yields one page.
    pub fn finish(mut self) -> LayoutReport {
        if self.state.page.is_none() {
            self.start_page();
        }
        self.report
    }
}

fn draw_header<S: Surface>(
    surface: &mut S,
    metrics: &LayoutMetrics,
    style: &LayoutStyle,
    header: &HeaderBlock,
    page_height: Pt,
) -> Pt {
    let mut text_x = metrics.margin_left;
    if let ImageSlot::Present(logo) = &header.logo {
        let logo_bottom = metrics.logo_top + logo.height;
        surface.draw_image(logo, (metrics.margin_left, flip_y(page_height, logo_bottom)));
        text_x = metrics.margin_left + logo.width + metrics.image_text_gap;
    }

    surface.draw_text(
        &header.title,
        (text_x, flip_y(page_height, metrics.title_baseline)),
        TextStyle {
            size: metrics.title_size,
            colour: style.accent,
        },
    );
    surface.draw_text(
        &header.caption,
        (text_x, flip_y(page_height, metrics.caption_baseline)),
        TextStyle {
            size: metrics.caption_size,
            colour: style.text,
        },
    );

    header.content_top(metrics)
}

/// Shorten `text` so it fits in `max_width`, ending it with [ELLIPSIS] when
/// anything had to be cut
pub fn clip_to_width<S: Surface + ?Sized>(surface: &S, text: &str, size: Pt, max_width: Pt) -> String {
    if surface.text_width(text, size) <= max_width {
        return text.to_string();
    }

    let mut buf = [0u8; 4];
    let budget = max_width - surface.text_width(ELLIPSIS.encode_utf8(&mut buf), size);
    let mut used = Pt(0.0);
    let mut end = 0;
    for (index, ch) in text.char_indices() {
        used += surface.text_width(ch.encode_utf8(&mut buf), size);
        if used > budget {
            break;
        }
        end = index + ch.len_utf8();
    }

    let mut clipped = text[..end].trim_end().to_string();
    clipped.push(ELLIPSIS);
    clipped
}

/// Lay out a whole block sequence. Each header block starts a new page and
/// becomes the header repeated on the pages after it.
pub fn lay_out<S: Surface>(
    surface: &mut S,
    metrics: &LayoutMetrics,
    style: LayoutStyle,
    blocks: &[ContentBlock],
) -> LayoutReport {
    let mut engine = LayoutEngine::new(surface, metrics, style);
    for block in blocks {
        match block {
            ContentBlock::Header(header) => {
                engine.set_header(header.clone());
                engine.start_page();
            }
            ContentBlock::Product(product) => {
                engine.place_block(product);
            }
        }
    }
    engine.finish()
}
