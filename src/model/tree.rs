//! Arena-backed logical division tree.
//!
//! Divisions are stored in a flat arena and addressed by [`DivisionId`]
//! keys; `parent`/`children` are keys rather than owning pointers, so the
//! page link table can refer to divisions without lifetime coupling.
//! Divisions are created during synthesis or loaded from a persisted
//! container and are never removed.

use std::collections::HashMap;
use std::slice;

use crate::segment::TypeTag;

/// Arena key for a division within a [`DivisionTree`].
///
/// Keys are only minted by the owning tree and stay valid for its lifetime
/// (divisions are never removed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DivisionId(u32);

impl DivisionId {
    /// The synthetic root (always 0).
    pub const ROOT: DivisionId = DivisionId(0);
}

/// A `(file, region)` pointer into page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaRef {
    pub file_ref: String,
    pub region_id: String,
}

impl AreaRef {
    pub fn new(file_ref: impl Into<String>, region_id: impl Into<String>) -> Self {
        AreaRef {
            file_ref: file_ref.into(),
            region_id: region_id.into(),
        }
    }
}

/// Content attached directly to a division (content-pointer mode).
///
/// A division gains at most one pointer slot. A single pointer upgrades in
/// place to an ordered sequence when a second area is attached; the first
/// pointer keeps its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPointer {
    Single(AreaRef),
    Sequence(Vec<AreaRef>),
}

impl ContentPointer {
    /// All areas in attachment order.
    pub fn areas(&self) -> &[AreaRef] {
        match self {
            ContentPointer::Single(area) => slice::from_ref(area),
            ContentPointer::Sequence(areas) => areas,
        }
    }
}

/// A node of the logical division tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Division {
    /// Persisted identifier (`LOG_<n>` for allocated divisions, empty for
    /// the synthetic root).
    pub id: String,
    /// Structural type; `None` for the synthetic root and for untyped
    /// divisions loaded from a pre-existing container.
    pub type_tag: Option<TypeTag>,
    /// Display text. Merged headings are joined with newlines in arrival
    /// order.
    pub label: String,
    pub parent: Option<DivisionId>,
    /// Insertion order is document order.
    pub children: Vec<DivisionId>,
    pub content: Option<ContentPointer>,
}

/// The logical division tree of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionTree {
    nodes: Vec<Division>,
    index: HashMap<String, DivisionId>,
    /// Highest numeric `LOG_` suffix seen so far.
    last_suffix: u64,
}

impl Default for DivisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DivisionTree {
    /// Create a tree holding only the synthetic root.
    pub fn new() -> Self {
        DivisionTree {
            nodes: vec![Division {
                id: String::new(),
                type_tag: None,
                label: String::new(),
                parent: None,
                children: Vec::new(),
                content: None,
            }],
            index: HashMap::new(),
            last_suffix: 0,
        }
    }

    pub fn root(&self) -> DivisionId {
        DivisionId::ROOT
    }

    /// Number of divisions, excluding the synthetic root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: DivisionId) -> &Division {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: DivisionId) -> &mut Division {
        &mut self.nodes[id.0 as usize]
    }

    /// Look up a division by its persisted identifier.
    pub fn lookup(&self, id: &str) -> Option<DivisionId> {
        self.index.get(id).copied()
    }

    /// Insert a new division with a freshly allocated `LOG_<n>` identifier.
    ///
    /// The suffix is one greater than the maximum numeric suffix among all
    /// identifiers seen so far, so resumed runs never collide with persisted
    /// divisions.
    pub fn insert(&mut self, parent: DivisionId, type_tag: TypeTag, label: &str) -> DivisionId {
        self.last_suffix += 1;
        let id = format!("LOG_{}", self.last_suffix);
        self.push_node(parent, id, Some(type_tag), label.to_string())
    }

    /// Insert a division loaded from a persisted container, keeping its
    /// identifier. Returns `None` if the identifier is already taken.
    pub fn insert_existing(
        &mut self,
        parent: DivisionId,
        id: String,
        type_tag: Option<TypeTag>,
        label: String,
    ) -> Option<DivisionId> {
        if self.index.contains_key(&id) {
            return None;
        }
        // Non-numeric suffixes don't advance the allocator but keep their node.
        if let Some(suffix) = id.strip_prefix("LOG_")
            && let Ok(n) = suffix.parse::<u64>()
        {
            self.last_suffix = self.last_suffix.max(n);
        }
        Some(self.push_node(parent, id, type_tag, label))
    }

    fn push_node(
        &mut self,
        parent: DivisionId,
        id: String,
        type_tag: Option<TypeTag>,
        label: String,
    ) -> DivisionId {
        let key = DivisionId(self.nodes.len() as u32);
        self.nodes.push(Division {
            id: id.clone(),
            type_tag,
            label,
            parent: Some(parent),
            children: Vec::new(),
            content: None,
        });
        self.index.insert(id, key);
        self.node_mut(parent).children.push(key);
        key
    }

    /// Append heading text to a division's label, separated by a newline.
    pub fn append_label(&mut self, id: DivisionId, text: &str) {
        let label = &mut self.node_mut(id).label;
        label.push('\n');
        label.push_str(text);
    }

    /// Attach a content area to a division. A second attach converts the
    /// single pointer into a sequence in place.
    pub fn push_area(&mut self, id: DivisionId, area: AreaRef) {
        let content = &mut self.node_mut(id).content;
        match content.take() {
            None => *content = Some(ContentPointer::Single(area)),
            Some(ContentPointer::Single(first)) => {
                *content = Some(ContentPointer::Sequence(vec![first, area]));
            }
            Some(ContentPointer::Sequence(mut areas)) => {
                areas.push(area);
                *content = Some(ContentPointer::Sequence(areas));
            }
        }
    }

    /// Attach a content area, always in sequence form. Used when loading a
    /// persisted sequence so a one-element sequence round-trips unchanged.
    pub(crate) fn push_area_sequenced(&mut self, id: DivisionId, area: AreaRef) {
        let content = &mut self.node_mut(id).content;
        match content.take() {
            None => *content = Some(ContentPointer::Sequence(vec![area])),
            Some(ContentPointer::Single(first)) => {
                *content = Some(ContentPointer::Sequence(vec![first, area]));
            }
            Some(ContentPointer::Sequence(mut areas)) => {
                areas.push(area);
                *content = Some(ContentPointer::Sequence(areas));
            }
        }
    }

    /// All divisions in pre-order document order, excluding the synthetic
    /// root.
    pub fn descendants(&self) -> impl Iterator<Item = DivisionId> + '_ {
        let mut stack: Vec<DivisionId> = self.node(DivisionId::ROOT).children.clone();
        stack.reverse();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            for &child in self.node(next).children.iter().rev() {
                stack.push(child);
            }
            Some(next)
        })
    }
}
