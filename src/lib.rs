//! # quire
//!
//! Logical document structure synthesis for digitized page sequences.
//!
//! Page segmentation leaves a flat, page-ordered stream of classified
//! regions: headings of various structural types, and running text. quire
//! folds that stream into a hierarchical division tree (volumes, chapters,
//! sections, articles, ...) plus a mapping from each division to the
//! physical pages it spans, and persists both in a METS-subset structure
//! container.
//!
//! ## Features
//!
//! - Incremental synthesis: each heading either opens a child level,
//!   continues the current heading, or starts a sibling, driven by
//!   configurable tag sets rather than a fixed schema
//! - Resumes against a pre-existing structure container, continuing its
//!   identifier sequence
//! - Two materializations: content pointers on the divisions themselves, or
//!   a separate page link table
//!
//! ## Quick Start
//!
//! ```no_run
//! use quire::{
//!     read_mets, read_page, write_mets, ClassifierRules, RuleSet, StructureMap,
//!     SynthesisMode, Synthesizer,
//! };
//!
//! let mut map = read_mets("mets.xml").unwrap_or_else(|_| StructureMap::default());
//! let rules = RuleSet::default();
//! let classifier = ClassifierRules::default();
//!
//! let mut synth =
//!     Synthesizer::new(&mut map.tree, &mut map.links, SynthesisMode::PageLinks, &rules)?;
//! for page in ["pages/p_0001.xml", "pages/p_0002.xml"] {
//!     for segment in read_page(page, &classifier)? {
//!         synth.process(&segment);
//!     }
//! }
//! let report = synth.finish();
//! println!("{} divisions created", report.created);
//!
//! write_mets("mets.xml", &map)?;
//! # Ok::<(), quire::Error>(())
//! ```

pub mod error;
pub mod mets;
pub mod model;
pub mod pagexml;
pub mod rules;
pub mod segment;
pub mod synth;
pub(crate) mod xml;

pub use error::{Error, Result};
pub use mets::{generate_mets, parse_mets, read_mets, write_mets};
pub use model::{
    AreaRef, ContentPointer, Division, DivisionId, DivisionTree, LinkEntry, LinkTable,
    StructureMap,
};
pub use pagexml::{parse_page, read_page, ClassifierRules};
pub use rules::{RuleSet, SynthesisMode};
pub use segment::{Extent, Segment, SegmentKind, TypeTag};
pub use synth::{DroppedSegment, SynthesisReport, Synthesizer};
