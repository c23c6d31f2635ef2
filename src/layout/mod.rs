//! Layout of catalog documents onto pages.
//!
//! Content is organised in [blocks](ContentBlock): one header block, repeated
//! atop every page, then one block per product. The [engine](LayoutEngine)
//! paginates them in a single greedy pass and draws through a [Surface], which
//! is a [Document](crate::Document) in production and a recorder in tests.
//!
//! All layout decisions are made in top-down distances; [flip_y] turns them into
//! PDF coordinates right before drawing.

mod blocks;
mod coords;
mod engine;
mod margins;
mod surface;

pub use blocks::*;
pub use coords::*;
pub use engine::*;
pub use margins::*;
pub use surface::*;
