//! Pre-defined page sizes for the supported paper formats.
//!
//! All sizes are provided in portrait orientation (width, height). Catalog exports
//! default to [A4].

use crate::units::*;
use serde::{Deserialize, Serialize};

/// Page dimensions as (width, height) in points.
pub type PageSize = (Pt, Pt);

/// ISO A4, rounded the same way most PDF producers round it (595.28 x 841.89)
pub const A4: PageSize = (Pt(595.28), Pt(841.89));
pub const LETTER: PageSize = (Pt(8.5 * 72.0), Pt(11.0 * 72.0));

/// Named paper formats accepted in configuration files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperFormat {
    #[default]
    A4,
    Letter,
}

impl PaperFormat {
    pub fn size(self) -> PageSize {
        match self {
            PaperFormat::A4 => A4,
            PaperFormat::Letter => LETTER,
        }
    }
}
