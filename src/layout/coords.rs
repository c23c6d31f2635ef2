//! The one place where top-down layout offsets become PDF coordinates.
//!
//! Layout reasons about "distance from the top of the page" because blocks flow
//! downwards. PDF user space has its origin at the bottom-left corner, so every
//! y value handed to a drawing call must go through [flip_y] first.

use crate::units::Pt;

/// Convert a distance measured down from the top edge into a PDF y coordinate
pub fn flip_y(page_height: Pt, offset_from_top: Pt) -> Pt {
    page_height - offset_from_top
}

/// Convert a PDF y coordinate back into a distance from the top edge.
///
/// The conversion is its own inverse; this exists so call sites read in the
/// direction they mean.
pub fn offset_from_top(page_height: Pt, y: Pt) -> Pt {
    page_height - y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_edge_maps_to_page_height() {
        assert_eq!(flip_y(Pt(841.89), Pt(0.0)), Pt(841.89));
    }

    #[test]
    fn bottom_edge_maps_to_origin() {
        assert_eq!(flip_y(Pt(800.0), Pt(800.0)), Pt(0.0));
    }

    #[test]
    fn header_title_baseline_sits_sixty_below_the_top() {
        assert_eq!(flip_y(Pt(800.0), Pt(60.0)), Pt(740.0));
    }

    #[test]
    fn larger_offsets_are_lower_on_the_page() {
        let page = Pt(800.0);
        assert!(flip_y(page, Pt(300.0)) < flip_y(page, Pt(200.0)));
    }

    #[test]
    fn conversion_round_trips() {
        let page = Pt(792.0);
        for offset in [0.0, 18.5, 140.0, 712.0, 792.0] {
            assert_eq!(offset_from_top(page, flip_y(page, Pt(offset))), Pt(offset));
        }
    }
}
