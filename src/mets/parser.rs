//! Parsing the persisted structure container (METS subset).
//!
//! Extracts the `LOGICAL` structure map (nested `mets:div` elements with
//! optional `mets:fptr` content pointers) and the `mets:structLink` page
//! link table. Foreign sections such as a `PHYSICAL` structure map or the
//! file section are read past and ignored.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::model::{AreaRef, DivisionId, StructureMap};
use crate::segment::TypeTag;
use crate::xml::{local_name, unescape_attr};

/// Parse a structure container document.
///
/// Pre-existing state is validated on load: duplicate division identifiers
/// and links to divisions the tree does not contain are errors, not
/// something synthesis attempts to repair.
pub fn parse_mets(xml: &str) -> Result<StructureMap> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut map = StructureMap::default();
    let mut in_logical = false;
    let mut in_seq = false;
    // Current ancestry within the logical map; top is the open division.
    let mut stack: Vec<DivisionId> = vec![map.tree.root()];

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"structMap" => {
                    in_logical = attr_value(&e, b"TYPE").as_deref() == Some("LOGICAL");
                }
                b"div" if in_logical => {
                    let id = open_div(&mut map, &stack, &e)?;
                    stack.push(id);
                }
                b"seq" if in_logical => in_seq = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"div" if in_logical => {
                    open_div(&mut map, &stack, &e)?;
                }
                b"area" if in_logical => read_area(&mut map, &stack, in_seq, &e),
                b"smLink" => read_smlink(&mut map, &e)?,
                _ => {}
            },
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"structMap" => in_logical = false,
                b"div" if in_logical && stack.len() > 1 => {
                    stack.pop();
                }
                b"seq" => in_seq = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    // Links must point at divisions the tree actually contains
    for entry in map.links.entries() {
        if map.tree.lookup(&entry.division_id).is_none() {
            return Err(Error::InvalidMets(format!(
                "link references unknown division '{}'",
                entry.division_id
            )));
        }
    }

    Ok(map)
}

/// Attach one `mets:area` to the open division.
fn read_area(map: &mut StructureMap, stack: &[DivisionId], in_seq: bool, e: &BytesStart<'_>) {
    let file_ref = attr_value(e, b"FILEID").unwrap_or_default();
    let region_id = attr_value(e, b"BEGIN").unwrap_or_default();
    let area = AreaRef::new(file_ref, region_id);
    let div = stack.last().copied().unwrap_or(DivisionId::ROOT);
    if in_seq {
        map.tree.push_area_sequenced(div, area);
    } else {
        map.tree.push_area(div, area);
    }
}

/// Record one `mets:smLink` entry. xlink:from names the division,
/// xlink:to the page.
fn read_smlink(map: &mut StructureMap, e: &BytesStart<'_>) -> Result<()> {
    let division = attr_value(e, b"from").unwrap_or_default();
    let page = attr_value(e, b"to").unwrap_or_default();
    if division.is_empty() || page.is_empty() {
        return Err(Error::InvalidMets(
            "smLink without xlink:from/xlink:to".to_string(),
        ));
    }
    map.links.insert(&page, &division);
    Ok(())
}

/// Register one `mets:div` under the current ancestor.
fn open_div(
    map: &mut StructureMap,
    stack: &[DivisionId],
    e: &BytesStart<'_>,
) -> Result<DivisionId> {
    let id = attr_value(e, b"ID")
        .ok_or_else(|| Error::InvalidMets("div without ID attribute".to_string()))?;
    let type_tag = attr_value(e, b"TYPE").map(TypeTag::new);
    if type_tag.as_ref().is_some_and(TypeTag::is_text) {
        return Err(Error::InvalidMets(format!(
            "division '{id}' carries the reserved '{}' type",
            TypeTag::TEXT
        )));
    }
    let label = attr_value(e, b"LABEL").unwrap_or_default();
    let parent = stack.last().copied().unwrap_or(DivisionId::ROOT);

    map.tree
        .insert_existing(parent, id.clone(), type_tag, label)
        .ok_or_else(|| Error::InvalidMets(format!("duplicate division id '{id}'")))
}

/// The value of the attribute with the given local name, entity-decoded.
fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == name)
        .map(|attr| unescape_attr(&attr.value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentPointer;

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:xlink="http://www.w3.org/1999/xlink">
  <mets:structMap TYPE="LOGICAL">
    <mets:div TYPE="volume" ID="LOG_1" LABEL="Vol. 1 &amp; 2">
      <mets:div TYPE="chapter" ID="LOG_2" LABEL="Erstes Kapitel">
        <mets:fptr>
          <mets:area BETYPE="IDREF" FILEID="FILE_0001" BEGIN="r_01"/>
        </mets:fptr>
      </mets:div>
    </mets:div>
  </mets:structMap>
  <mets:structLink>
    <mets:smLink xlink:from="LOG_2" xlink:to="PHYS_0001"/>
    <mets:smLink xlink:from="LOG_2" xlink:to="PHYS_0002"/>
  </mets:structLink>
</mets:mets>"#;

    #[test]
    fn parses_divisions_links_and_areas() {
        let map = parse_mets(MINIMAL).unwrap();

        assert_eq!(map.tree.len(), 2);
        let volume = map.tree.lookup("LOG_1").unwrap();
        assert_eq!(map.tree.node(volume).label, "Vol. 1 & 2");
        assert_eq!(
            map.tree.node(volume).type_tag,
            Some(TypeTag::new("volume"))
        );

        let chapter = map.tree.lookup("LOG_2").unwrap();
        assert_eq!(map.tree.node(chapter).parent, Some(volume));
        assert_eq!(
            map.tree.node(chapter).content,
            Some(ContentPointer::Single(AreaRef::new("FILE_0001", "r_01")))
        );

        assert_eq!(map.links.divisions_for("PHYS_0001"), ["LOG_2"]);
        assert_eq!(map.links.divisions_for("PHYS_0002"), ["LOG_2"]);
    }

    #[test]
    fn ignores_physical_struct_map() {
        let xml = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/">
  <mets:structMap TYPE="PHYSICAL">
    <mets:div TYPE="physSequence" ID="PHYS_0000">
      <mets:div TYPE="page" ID="PHYS_0001"/>
    </mets:div>
  </mets:structMap>
  <mets:structMap TYPE="LOGICAL">
    <mets:div TYPE="monograph" ID="LOG_1"/>
  </mets:structMap>
</mets:mets>"#;
        let map = parse_mets(xml).unwrap();
        assert_eq!(map.tree.len(), 1);
        assert!(map.tree.lookup("PHYS_0001").is_none());
    }

    #[test]
    fn empty_document_yields_empty_map() {
        let map = parse_mets(r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/"/>"#).unwrap();
        assert!(map.tree.is_empty());
        assert!(map.links.is_empty());
    }

    #[test]
    fn duplicate_division_id_is_an_error() {
        let xml = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/">
  <mets:structMap TYPE="LOGICAL">
    <mets:div TYPE="chapter" ID="LOG_1"/>
    <mets:div TYPE="chapter" ID="LOG_1"/>
  </mets:structMap>
</mets:mets>"#;
        assert!(matches!(parse_mets(xml), Err(Error::InvalidMets(_))));
    }

    #[test]
    fn text_typed_division_is_an_error() {
        let xml = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/">
  <mets:structMap TYPE="LOGICAL">
    <mets:div TYPE="chapter" ID="LOG_1">
      <mets:div TYPE="text" ID="LOG_2"/>
    </mets:div>
  </mets:structMap>
</mets:mets>"#;
        assert!(matches!(parse_mets(xml), Err(Error::InvalidMets(_))));
    }

    #[test]
    fn dangling_link_is_an_error() {
        let xml = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/" xmlns:xlink="http://www.w3.org/1999/xlink">
  <mets:structMap TYPE="LOGICAL">
    <mets:div TYPE="chapter" ID="LOG_1"/>
  </mets:structMap>
  <mets:structLink>
    <mets:smLink xlink:from="LOG_99" xlink:to="PHYS_0001"/>
  </mets:structLink>
</mets:mets>"#;
        assert!(matches!(parse_mets(xml), Err(Error::InvalidMets(_))));
    }

    #[test]
    fn sequence_of_areas_round_trips_structurally() {
        let xml = r#"<mets:mets xmlns:mets="http://www.loc.gov/METS/">
  <mets:structMap TYPE="LOGICAL">
    <mets:div TYPE="chapter" ID="LOG_1">
      <mets:fptr>
        <mets:seq>
          <mets:area FILEID="FILE_0001" BEGIN="r_01"/>
          <mets:area FILEID="FILE_0001" BEGIN="r_02"/>
        </mets:seq>
      </mets:fptr>
    </mets:div>
  </mets:structMap>
</mets:mets>"#;
        let map = parse_mets(xml).unwrap();
        let div = map.tree.lookup("LOG_1").unwrap();
        match map.tree.node(div).content.as_ref().unwrap() {
            ContentPointer::Sequence(areas) => {
                assert_eq!(areas.len(), 2);
                assert_eq!(areas[1].region_id, "r_02");
            }
            other => panic!("expected sequence, got {other:?}"),
        }
    }
}
