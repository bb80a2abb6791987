//! Classified page segments, the synthesizer's input stream.
//!
//! A [`Segment`] is one layout region of one physical page, already
//! classified upstream: either running text or a heading carrying a
//! structural type tag. The synthesizer folds over these in page order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural type tag drawn from an open vocabulary ("chapter", "section",
/// "article", ...).
///
/// Tags are normalized to ASCII lowercase so that rule lookups and persisted
/// TYPE attributes compare consistently. The vocabulary is open; which tags
/// mean what is decided by the [`RuleSet`](crate::rules::RuleSet), not by
/// this type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct TypeTag(String);

impl TypeTag {
    /// The reserved tag for running text. Never a valid division type.
    pub const TEXT: &'static str = "text";

    pub fn new(tag: impl AsRef<str>) -> Self {
        TypeTag(tag.as_ref().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_text(&self) -> bool {
        self.0 == Self::TEXT
    }
}

impl From<String> for TypeTag {
    fn from(tag: String) -> Self {
        TypeTag::new(tag)
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        TypeTag::new(tag)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of a segment: running text or a heading with a structural
/// type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Running/body content. Carries no label and never opens a division.
    Text,
    /// A heading-like region of the given structural type.
    Heading(TypeTag),
}

impl SegmentKind {
    /// Build a heading kind. The reserved text tag yields [`SegmentKind::Text`].
    pub fn heading(tag: TypeTag) -> SegmentKind {
        if tag.is_text() {
            SegmentKind::Text
        } else {
            SegmentKind::Heading(tag)
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, SegmentKind::Text)
    }

    /// The structural tag, if this is a heading.
    pub fn tag(&self) -> Option<&TypeTag> {
        match self {
            SegmentKind::Heading(tag) => Some(tag),
            SegmentKind::Text => None,
        }
    }
}

/// Bounding geometry of a layout region, in page pixel coordinates.
///
/// Carried through to output untouched; the decision logic never reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl Extent {
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Extent { x, y, w, h }
    }
}

/// One classified layout region of one physical page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Identifier of the physical page this segment was extracted from.
    pub page_id: String,
    /// Identifier of the source content file the region lives in.
    pub file_ref: String,
    /// Identifier of the originating layout region, unique within its page.
    pub region_id: String,
    /// Bounding geometry of the region.
    pub extent: Extent,
    /// Pre-computed classification.
    pub kind: SegmentKind,
    /// Heading text; empty for text segments.
    pub label: String,
}

impl Segment {
    /// Create a running-text segment.
    pub fn text(
        page_id: impl Into<String>,
        file_ref: impl Into<String>,
        region_id: impl Into<String>,
        extent: Extent,
    ) -> Self {
        Segment {
            page_id: page_id.into(),
            file_ref: file_ref.into(),
            region_id: region_id.into(),
            extent,
            kind: SegmentKind::Text,
            label: String::new(),
        }
    }

    /// Create a heading segment of the given structural type.
    ///
    /// The reserved text tag produces a text segment with an empty label.
    pub fn heading(
        page_id: impl Into<String>,
        file_ref: impl Into<String>,
        region_id: impl Into<String>,
        extent: Extent,
        tag: TypeTag,
        label: impl Into<String>,
    ) -> Self {
        let kind = SegmentKind::heading(tag);
        let label = match kind {
            SegmentKind::Text => String::new(),
            SegmentKind::Heading(_) => label.into(),
        };
        Segment {
            page_id: page_id.into(),
            file_ref: file_ref.into(),
            region_id: region_id.into(),
            extent,
            kind,
            label,
        }
    }
}
