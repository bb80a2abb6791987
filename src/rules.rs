//! Run configuration: materialization mode and subordination rule sets.
//!
//! The decision algorithm is driven by externally suppliable tag sets, not
//! by a fixed schema. The defaults follow common bibliographic digitization
//! practice (volumes and issues contain everything, indexes and prefaces
//! always nest, chapters contain sections).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::segment::TypeTag;

/// Which output representation a run materializes. Fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesisMode {
    /// Attach `(file, region)` pointers directly to each division.
    ContentPointers,
    /// Record `(page, division)` pairs in the global link table.
    #[default]
    PageLinks,
}

impl FromStr for SynthesisMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pointers" => Ok(SynthesisMode::ContentPointers),
            "links" => Ok(SynthesisMode::PageLinks),
            other => Err(Error::InvalidConfig(format!(
                "unknown mode '{other}' (expected 'links' or 'pointers')"
            ))),
        }
    }
}

impl fmt::Display for SynthesisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisMode::ContentPointers => f.write_str("pointers"),
            SynthesisMode::PageLinks => f.write_str("links"),
        }
    }
}

/// The tag sets driving subordination decisions.
///
/// All four sets can be loaded from JSON to match a collection's cataloguing
/// conventions; [`RuleSet::default`] covers the usual bibliographic tags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSet {
    /// Container-like tags. A container always subordinates the next
    /// heading, and containers are the anchors the bootstrap scan looks for.
    pub containers: BTreeSet<TypeTag>,
    /// Tags that nest regardless of context (fixed-position front/back
    /// matter).
    pub always_nested: BTreeSet<TypeTag>,
    /// Tags that subordinate whenever the current division's tag differs.
    pub floating: BTreeSet<TypeTag>,
    /// Parent-to-children adjacency: a heading whose tag appears in its
    /// cursor tag's entry opens a child level.
    pub nesting: BTreeMap<TypeTag, BTreeSet<TypeTag>>,
}

fn tags<const N: usize>(names: [&str; N]) -> BTreeSet<TypeTag> {
    names.into_iter().map(TypeTag::new).collect()
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet {
            containers: tags([
                "issue",
                "part",
                "folder",
                "map",
                "illustration",
                "additional",
                "title_page",
                "volume",
                "monograph",
                "letter",
                "fascicle",
                "fragment",
                "manuscript",
                "bundle",
            ]),
            always_nested: tags([
                "index",
                "table_of_contents",
                "appendix",
                "preface",
                "dedication",
                "privilege",
                "review",
                "musical_notation",
                "bookplate",
                "binding",
                "address",
                "annotation",
            ]),
            floating: tags(["article", "verse", "entry"]),
            nesting: [(TypeTag::new("chapter"), tags(["section"]))]
                .into_iter()
                .collect(),
        }
    }
}

impl RuleSet {
    /// Parse a rule set from JSON. Absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<RuleSet> {
        let rules: RuleSet =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load a rule set from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RuleSet> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Check that the reserved text tag appears in no set. Synthesis does
    /// not start with a malformed rule set.
    pub fn validate(&self) -> Result<()> {
        let reserved = |set: &BTreeSet<TypeTag>| set.iter().any(TypeTag::is_text);
        if reserved(&self.containers)
            || reserved(&self.always_nested)
            || reserved(&self.floating)
            || self
                .nesting
                .iter()
                .any(|(parent, children)| parent.is_text() || reserved(children))
        {
            return Err(Error::InvalidConfig(format!(
                "the reserved '{}' tag cannot appear in a rule set",
                TypeTag::TEXT
            )));
        }
        Ok(())
    }

    /// Whether `child` opens a new level under a division tagged `parent`.
    pub fn nests_under(&self, parent: &TypeTag, child: &TypeTag) -> bool {
        self.nesting
            .get(parent)
            .is_some_and(|children| children.contains(child))
    }
}
