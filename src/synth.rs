//! Incremental logical-structure synthesis.
//!
//! Folds a page-ordered stream of classified [`Segment`]s into the division
//! tree, deciding for each heading whether it opens a child of the current
//! division (subordination), continues its label (merge), or starts a
//! sibling (coordination). Text segments attach to whatever division is
//! current. The fold carries its state explicitly (`cursor`, `last_kind`),
//! so a partially processed stream leaves a valid tree a later run can
//! resume from.

use crate::error::Result;
use crate::model::{AreaRef, DivisionId, DivisionTree, LinkTable};
use crate::rules::{RuleSet, SynthesisMode};
use crate::segment::{Segment, SegmentKind, TypeTag};

/// How a heading segment relates to the current division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    /// Open a new child level.
    Subordinate,
    /// Continuation of the current heading; extend its label.
    Merge,
    /// Same-level unit boundary; open a sibling.
    Coordinate,
}

/// A segment that produced no output: text arriving before any heading
/// opened a division.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSegment {
    pub page_id: String,
    pub region_id: String,
}

/// Counts and diagnostics of one synthesis pass.
#[derive(Debug, Default)]
pub struct SynthesisReport {
    /// Divisions created (subordination + coordination).
    pub created: usize,
    /// Headings folded into an existing label.
    pub merged: usize,
    /// Content areas appended or links inserted (duplicates not counted).
    pub attached: usize,
    /// Segments skipped because no division was open yet.
    pub dropped: Vec<DroppedSegment>,
}

/// One synthesis pass over a segment stream.
///
/// Holds mutable borrows of the tree and link table for the duration of the
/// pass; no other pass can touch them concurrently.
pub struct Synthesizer<'a> {
    tree: &'a mut DivisionTree,
    links: &'a mut LinkTable,
    rules: &'a RuleSet,
    mode: SynthesisMode,
    cursor: Option<DivisionId>,
    last_kind: Option<SegmentKind>,
    last_page: Option<String>,
    report: SynthesisReport,
}

impl<'a> Synthesizer<'a> {
    /// Start a pass. Fails if the rule set is malformed; synthesis does not
    /// start against bad configuration.
    pub fn new(
        tree: &'a mut DivisionTree,
        links: &'a mut LinkTable,
        mode: SynthesisMode,
        rules: &'a RuleSet,
    ) -> Result<Self> {
        rules.validate()?;
        Ok(Synthesizer {
            tree,
            links,
            rules,
            mode,
            cursor: None,
            last_kind: None,
            last_page: None,
            report: SynthesisReport::default(),
        })
    }

    /// Fold one segment into the running state.
    pub fn process(&mut self, segment: &Segment) {
        // A heading carrying the reserved text tag is running text.
        let kind = match &segment.kind {
            SegmentKind::Heading(tag) if tag.is_text() => SegmentKind::Text,
            other => other.clone(),
        };

        match &kind {
            SegmentKind::Text => {
                let Some(cursor) = self.cursor else {
                    // The only case producing no tree or link mutation.
                    log::warn!(
                        "{}: dropping region '{}' before first heading",
                        segment.page_id,
                        segment.region_id
                    );
                    self.report.dropped.push(DroppedSegment {
                        page_id: segment.page_id.clone(),
                        region_id: segment.region_id.clone(),
                    });
                    return;
                };
                self.attach(cursor, segment);
            }
            SegmentKind::Heading(tag) => {
                let cursor = match self.cursor {
                    Some(cursor) => cursor,
                    None => self.bootstrap(&segment.page_id),
                };
                let target = match self.relation(cursor, tag) {
                    Relation::Subordinate => self.create(cursor, tag, &segment.label),
                    Relation::Merge => {
                        self.tree.append_label(cursor, &segment.label);
                        self.report.merged += 1;
                        cursor
                    }
                    Relation::Coordinate => {
                        let parent = self
                            .tree
                            .node(cursor)
                            .parent
                            .unwrap_or_else(|| self.tree.root());
                        self.create(parent, tag, &segment.label)
                    }
                };
                log::info!(
                    "continuing with {} region '{}' on page {}",
                    tag,
                    segment.region_id,
                    segment.page_id
                );
                self.cursor = Some(target);
                self.attach(target, segment);
            }
        }

        self.last_kind = Some(kind);
        self.last_page = Some(segment.page_id.clone());
    }

    /// Fold a whole stream and return the report.
    pub fn run(mut self, segments: impl IntoIterator<Item = Segment>) -> SynthesisReport {
        for segment in segments {
            self.process(&segment);
        }
        self.finish()
    }

    /// End the pass and hand back its report.
    pub fn finish(self) -> SynthesisReport {
        self.report
    }

    /// The page of the most recently processed segment, if any.
    pub fn last_page(&self) -> Option<&str> {
        self.last_page.as_deref()
    }

    /// Resolve the starting division for the first heading of a run:
    /// the most recently linked division of the current page if the link
    /// table knows it, otherwise the last container-like division in
    /// document order, otherwise the root.
    fn bootstrap(&self, page_id: &str) -> DivisionId {
        if let Some(linked) = self
            .links
            .last_for(page_id)
            .and_then(|id| self.tree.lookup(id))
        {
            log::info!(
                "starting at last linked division for page {}: {}",
                page_id,
                self.tree.node(linked).id
            );
            return linked;
        }

        let mut anchor = None;
        for id in self.tree.descendants() {
            if let Some(tag) = &self.tree.node(id).type_tag
                && self.rules.containers.contains(tag)
            {
                anchor = Some(id);
            }
        }
        match anchor {
            Some(id) => {
                log::info!("starting at last container division: {}", self.tree.node(id).id);
                id
            }
            None => {
                log::info!("no container division found, starting at root");
                self.tree.root()
            }
        }
    }

    /// Classify a heading against the current division. The three rules are
    /// mutually exclusive and tested in this order.
    fn relation(&self, cursor: DivisionId, kind: &TypeTag) -> Relation {
        let subordinates = match &self.tree.node(cursor).type_tag {
            // The root and untyped divisions subordinate anything.
            None => true,
            Some(tag) => {
                self.rules.containers.contains(tag)
                    || self.rules.always_nested.contains(kind)
                    || (tag != kind && self.rules.floating.contains(kind))
                    || self.rules.nests_under(tag, kind)
            }
        };
        if subordinates {
            return Relation::Subordinate;
        }

        // A follow-up heading of the identical type is a wrapped heading,
        // not a new unit. Deliberately page-independent.
        if let Some(SegmentKind::Heading(last)) = &self.last_kind
            && last == kind
        {
            return Relation::Merge;
        }

        Relation::Coordinate
    }

    fn create(&mut self, parent: DivisionId, tag: &TypeTag, label: &str) -> DivisionId {
        let id = self.tree.insert(parent, tag.clone(), label);
        self.report.created += 1;
        id
    }

    /// Record the segment under the division, in whichever representation
    /// the run materializes.
    fn attach(&mut self, division: DivisionId, segment: &Segment) {
        match self.mode {
            SynthesisMode::ContentPointers => {
                self.tree.push_area(
                    division,
                    AreaRef::new(segment.file_ref.clone(), segment.region_id.clone()),
                );
                self.report.attached += 1;
            }
            SynthesisMode::PageLinks => {
                let id = self.tree.node(division).id.clone();
                if self.links.insert(&segment.page_id, &id) {
                    self.report.attached += 1;
                }
            }
        }
    }
}
