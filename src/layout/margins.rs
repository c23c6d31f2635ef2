use crate::units::Pt;

/// Margins are used when laying out blocks on a page. Nothing stops content from
/// overflowing them: the layout engine treats them as the limits it paginates
/// against. They are also applied to [`Page`](crate::Page)s to determine the
/// `ArtBox` of each page in the generated PDF
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    /// Create margins by specifying individual components in a clockwise fashion
    /// starting at the top (in the same order as CSS margins)
    pub fn trbl(top: Pt, right: Pt, bottom: Pt, left: Pt) -> Margins {
        Margins {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Create margins where all values are equal
    pub fn all<D: Into<Pt>>(value: D) -> Margins {
        let value: Pt = value.into();
        Margins::trbl(value, value, value, value)
    }

    /// Create margins where all values are 0.0
    pub fn empty() -> Margins {
        Margins::all(Pt(0.0))
    }

    /// Vertical space left between the top and bottom margins of a page
    pub fn usable_height(&self, page_height: Pt) -> Pt {
        page_height - self.top - self.bottom
    }
}
