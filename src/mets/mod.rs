//! Reading and writing the persisted structure container.
//!
//! The container is a METS-subset XML document: one `LOGICAL`
//! `mets:structMap` of nested `mets:div` elements (with `mets:fptr` content
//! pointers in pointer mode) plus a `mets:structLink` table of
//! page-to-division links. Writing regenerates the document from the model;
//! sections the model does not carry are not preserved.

mod parser;
mod writer;

pub use parser::parse_mets;
pub use writer::generate_mets;

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::StructureMap;
use crate::xml::strip_bom;

/// Read a structure container from disk.
pub fn read_mets<P: AsRef<Path>>(path: P) -> Result<StructureMap> {
    let bytes = fs::read(path)?;
    let xml = String::from_utf8(strip_bom(&bytes).to_vec())?;
    parse_mets(&xml)
}

/// Write a structure container to disk.
pub fn write_mets<P: AsRef<Path>>(path: P, map: &StructureMap) -> Result<()> {
    fs::write(path, generate_mets(map))?;
    Ok(())
}
