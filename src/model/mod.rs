//! Logical structure model: the division tree and the page link table.

mod links;
mod tree;

pub use links::{LinkEntry, LinkTable};
pub use tree::{AreaRef, ContentPointer, Division, DivisionId, DivisionTree};

/// A document's persisted logical structure: the division tree plus the
/// page link table. Exactly what the structure container stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureMap {
    pub tree: DivisionTree,
    pub links: LinkTable,
}
