//! Region model: the mutable in-memory document that detection produces,
//! the editor mutates and the generator reads.

mod document;
mod page;
mod region;

pub use document::Document;
pub use page::Page;
pub use region::{FontFamily, Region, RegionId, RegionKind, TextAlign, TextStyle};
