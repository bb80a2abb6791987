//! PAGE-layout page file ingestion — the segment stream producer.
//!
//! Reads one page's layout analysis (PAGE XML) and emits the page's text
//! regions as classified [`Segment`]s in document order, which upstream
//! segmentation tools store in reading order. Non-text regions (tables,
//! images) are not consumed. Which region subtypes are marginalia to skip
//! and which are headings is configuration, not logic.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::segment::{Extent, Segment, TypeTag};
use crate::xml::{local_name, resolve_entity, strip_bom, unescape_attr};

fn names<const N: usize>(values: [&str; N]) -> BTreeSet<String> {
    values.into_iter().map(String::from).collect()
}

/// Region classification configuration.
///
/// The defaults match the usual page-segmentation vocabulary for scanned
/// bibliographic material; collections with different conventions supply
/// their own sets as JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierRules {
    /// Page-level types whose pages yield no segments at all.
    pub skip_pages: BTreeSet<String>,
    /// Region subtypes outside the linear text flow (marginalia and
    /// friends).
    pub skip_regions: BTreeSet<String>,
    /// Region subtypes that open a division.
    pub heading_regions: BTreeSet<String>,
    /// The structural type a heading region maps to.
    pub heading_type: TypeTag,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        ClassifierRules {
            skip_pages: names(["front-cover", "back-cover", "title", "blank"]),
            skip_regions: names([
                "caption",
                "header",
                "footer",
                "page-number",
                "drop-capital",
                "credit",
                "signature-mark",
                "catch-word",
                "marginalia",
                "footnote",
                "footnote-continued",
                "endnote",
            ]),
            heading_regions: names(["heading"]),
            heading_type: TypeTag::new("chapter"),
        }
    }
}

impl ClassifierRules {
    /// Parse classifier configuration from JSON. Absent fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<ClassifierRules> {
        let rules: ClassifierRules =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load classifier configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ClassifierRules> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Headings cannot map to the reserved text tag.
    pub fn validate(&self) -> Result<()> {
        if self.heading_type.is_text() {
            return Err(Error::InvalidConfig(format!(
                "heading regions cannot map to the reserved '{}' tag",
                TypeTag::TEXT
            )));
        }
        Ok(())
    }
}

/// Read a page file from disk.
///
/// The page identifier is the file stem and the file reference the file
/// name, matching how segmentation workspaces name their members.
pub fn read_page<P: AsRef<Path>>(path: P, rules: &ClassifierRules) -> Result<Vec<Segment>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let xml = String::from_utf8(strip_bom(&bytes).to_vec())?;

    let page_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidPage(format!("no file stem in '{}'", path.display())))?;
    let file_ref = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| page_id.clone());

    parse_page(&xml, &page_id, &file_ref, rules)
}

/// The text region currently being collected.
struct RegionState {
    region_id: String,
    subtype: Option<String>,
    points: Option<String>,
    text: Option<String>,
}

/// Parse one page document into classified segments.
pub fn parse_page(
    xml: &str,
    page_id: &str,
    file_ref: &str,
    rules: &ClassifierRules,
) -> Result<Vec<Segment>> {
    rules.validate()?;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut segments = Vec::new();
    let mut region: Option<RegionState> = None;
    let mut in_line = false;
    let mut in_unicode = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"Page" => {
                    if let Some(page_type) = attr(&e, b"type")
                        && rules.skip_pages.contains(&page_type)
                    {
                        log::info!("{page_id}: skipping page of type {page_type}");
                        return Ok(Vec::new());
                    }
                }
                b"TextRegion" => {
                    region = Some(RegionState {
                        region_id: attr(&e, b"id").unwrap_or_default(),
                        subtype: attr(&e, b"type"),
                        points: None,
                        text: None,
                    });
                }
                b"TextLine" => in_line = true,
                // Tolerate producers that don't self-close Coords
                b"Coords" if !in_line => {
                    if let Some(state) = &mut region
                        && state.points.is_none()
                    {
                        state.points = attr(&e, b"points");
                    }
                }
                b"Unicode" if !in_line => {
                    if let Some(state) = &mut region
                        && state.text.is_none()
                    {
                        state.text = Some(String::new());
                        in_unicode = true;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"Coords"
                    && !in_line
                    && let Some(state) = &mut region
                    && state.points.is_none()
                {
                    state.points = attr(&e, b"points");
                }
            }
            Ok(Event::Text(e)) => {
                if in_unicode && let Some(state) = &mut region {
                    if let Some(text) = &mut state.text {
                        text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_unicode && let Some(state) = &mut region {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let (Some(text), Some(resolved)) =
                        (&mut state.text, resolve_entity(&entity))
                    {
                        text.push_str(&resolved);
                    }
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"TextLine" => in_line = false,
                b"Unicode" => in_unicode = false,
                b"TextRegion" => {
                    if let Some(state) = region.take()
                        && let Some(segment) = classify(state, page_id, file_ref, rules)
                    {
                        segments.push(segment);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(segments)
}

/// Turn a collected region into a segment, or drop it per the rules.
fn classify(
    state: RegionState,
    page_id: &str,
    file_ref: &str,
    rules: &ClassifierRules,
) -> Option<Segment> {
    // Non-linear elements never enter the stream
    if let Some(subtype) = &state.subtype
        && rules.skip_regions.contains(subtype)
    {
        return None;
    }

    let text = state.text.unwrap_or_default();
    if text.trim().is_empty() {
        log::warn!("{page_id}: skipping empty text region '{}'", state.region_id);
        return None;
    }

    let extent = state
        .points
        .as_deref()
        .and_then(bbox_from_points)
        .unwrap_or_default();

    let is_heading = state
        .subtype
        .as_ref()
        .is_some_and(|subtype| rules.heading_regions.contains(subtype));

    Some(if is_heading {
        Segment::heading(
            page_id,
            file_ref,
            state.region_id,
            extent,
            rules.heading_type.clone(),
            text,
        )
    } else {
        Segment::text(page_id, file_ref, state.region_id, extent)
    })
}

/// Bounding box of a PAGE `points` polygon ("x1,y1 x2,y2 ...").
fn bbox_from_points(points: &str) -> Option<Extent> {
    let mut min_x = i64::MAX;
    let mut min_y = i64::MAX;
    let mut max_x = i64::MIN;
    let mut max_y = i64::MIN;
    let mut seen = false;

    for pair in points.split_whitespace() {
        let (x, y) = pair.split_once(',')?;
        let x: i64 = x.trim().parse().ok()?;
        let y: i64 = y.trim().parse().ok()?;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
        seen = true;
    }

    if !seen {
        return None;
    }
    Some(Extent::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

/// The value of the attribute with the given local name, entity-decoded.
fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| local_name(a.key.as_ref()) == name)
        .map(|a| unescape_attr(&a.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentKind;
    use proptest::prelude::*;

    fn page(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<PcGts xmlns="http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15">
  <Page imageFilename="0001.tif" imageWidth="2000" imageHeight="3000">
{body}
  </Page>
</PcGts>"#
        )
    }

    fn region(id: &str, subtype: &str, text: &str) -> String {
        format!(
            r#"    <TextRegion id="{id}" type="{subtype}">
      <Coords points="100,200 500,200 500,260 100,260"/>
      <TextLine id="{id}_l1">
        <Coords points="100,200 500,200 500,230 100,230"/>
        <TextEquiv><Unicode>line-level text is ignored</Unicode></TextEquiv>
      </TextLine>
      <TextEquiv><Unicode>{text}</Unicode></TextEquiv>
    </TextRegion>"#
        )
    }

    #[test]
    fn classifies_headings_and_body_text() {
        let xml = page(&format!(
            "{}\n{}",
            region("r1", "heading", "Erstes Kapitel"),
            region("r2", "paragraph", "Es war einmal...")
        ));
        let segments = parse_page(&xml, "p_0001", "p_0001.xml", &ClassifierRules::default()).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(
            segments[0].kind,
            SegmentKind::Heading(TypeTag::new("chapter"))
        );
        assert_eq!(segments[0].label, "Erstes Kapitel");
        assert_eq!(segments[0].region_id, "r1");
        assert_eq!(segments[0].extent, Extent::new(100, 200, 400, 60));

        assert!(segments[1].kind.is_text());
        assert!(segments[1].label.is_empty());
        assert_eq!(segments[1].page_id, "p_0001");
        assert_eq!(segments[1].file_ref, "p_0001.xml");
    }

    #[test]
    fn skips_marginalia_and_empty_regions() {
        let xml = page(&format!(
            "{}\n{}\n{}",
            region("r1", "marginalia", "gloss"),
            region("r2", "page-number", "42"),
            region("r3", "paragraph", "")
        ));
        let segments = parse_page(&xml, "p", "p.xml", &ClassifierRules::default()).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn skips_cover_pages_entirely() {
        let xml = format!(
            r#"<PcGts><Page type="title">
{}
</Page></PcGts>"#,
            region("r1", "heading", "TITLE")
        );
        let segments = parse_page(&xml, "p", "p.xml", &ClassifierRules::default()).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn heading_target_is_configurable() {
        let rules = ClassifierRules::from_json(r#"{"heading_type": "article"}"#).unwrap();
        let xml = page(&region("r1", "heading", "Der Winter"));
        let segments = parse_page(&xml, "p", "p.xml", &rules).unwrap();
        assert_eq!(
            segments[0].kind,
            SegmentKind::Heading(TypeTag::new("article"))
        );
    }

    #[test]
    fn reserved_heading_target_is_rejected() {
        assert!(matches!(
            ClassifierRules::from_json(r#"{"heading_type": "text"}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn resolves_entities_in_region_text() {
        let xml = page(&region("r1", "heading", "Krieg &amp; Frieden"));
        let segments = parse_page(&xml, "p", "p.xml", &ClassifierRules::default()).unwrap();
        assert_eq!(segments[0].label, "Krieg & Frieden");
    }

    #[test]
    fn bbox_covers_all_points() {
        assert_eq!(
            bbox_from_points("100,200 500,200 500,260 100,260"),
            Some(Extent::new(100, 200, 400, 60))
        );
        assert_eq!(bbox_from_points("10,10"), Some(Extent::new(10, 10, 0, 0)));
        assert_eq!(bbox_from_points(""), None);
        assert_eq!(bbox_from_points("10;10"), None);
    }

    proptest! {
        #[test]
        fn prop_bbox_contains_every_point(
            points in prop::collection::vec((0i64..5000, 0i64..5000), 1..12)
        ) {
            let encoded: Vec<String> = points.iter().map(|(x, y)| format!("{x},{y}")).collect();
            let bbox = bbox_from_points(&encoded.join(" ")).unwrap();
            for (x, y) in points {
                prop_assert!(bbox.x <= x && x <= bbox.x + bbox.w);
                prop_assert!(bbox.y <= y && y <= bbox.y + bbox.h);
            }
        }
    }
}
