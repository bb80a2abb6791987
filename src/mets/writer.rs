//! Writing the persisted structure container (METS subset).
//!
//! Regenerates a complete document from the model: the `LOGICAL` structure
//! map, and the `mets:structLink` section when the link table is non-empty.

use crate::model::{ContentPointer, DivisionId, StructureMap};
use crate::xml::escape_xml;

/// Generate the structure container document.
pub fn generate_mets(map: &StructureMap) -> String {
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(
        "<mets:mets xmlns:mets=\"http://www.loc.gov/METS/\" \
         xmlns:xlink=\"http://www.w3.org/1999/xlink\">\n",
    );

    out.push_str("  <mets:structMap TYPE=\"LOGICAL\">\n");
    for &child in &map.tree.node(map.tree.root()).children {
        write_div(map, child, 2, &mut out);
    }
    out.push_str("  </mets:structMap>\n");

    if !map.links.is_empty() {
        out.push_str("  <mets:structLink>\n");
        for entry in map.links.entries() {
            out.push_str(&format!(
                "    <mets:smLink xlink:from=\"{}\" xlink:to=\"{}\"/>\n",
                escape_xml(&entry.division_id),
                escape_xml(&entry.page_id)
            ));
        }
        out.push_str("  </mets:structLink>\n");
    }

    out.push_str("</mets:mets>\n");
    out
}

fn write_div(map: &StructureMap, id: DivisionId, depth: usize, out: &mut String) {
    let div = map.tree.node(id);
    let indent = "  ".repeat(depth);

    out.push_str(&indent);
    out.push_str("<mets:div");
    if let Some(tag) = &div.type_tag {
        out.push_str(&format!(" TYPE=\"{}\"", escape_xml(tag.as_str())));
    }
    out.push_str(&format!(" ID=\"{}\"", escape_xml(&div.id)));
    if !div.label.is_empty() {
        out.push_str(&format!(" LABEL=\"{}\"", escape_xml(&div.label)));
    }

    if div.content.is_none() && div.children.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");

    if let Some(content) = &div.content {
        write_fptr(content, depth + 1, out);
    }
    for &child in &div.children {
        write_div(map, child, depth + 1, out);
    }

    out.push_str(&indent);
    out.push_str("</mets:div>\n");
}

fn write_fptr(content: &ContentPointer, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let area = |file_ref: &str, region_id: &str, indent: &str| {
        format!(
            "{}<mets:area BETYPE=\"IDREF\" FILEID=\"{}\" BEGIN=\"{}\"/>\n",
            indent,
            escape_xml(file_ref),
            escape_xml(region_id)
        )
    };

    out.push_str(&format!("{indent}<mets:fptr>\n"));
    match content {
        ContentPointer::Single(a) => {
            out.push_str(&area(&a.file_ref, &a.region_id, &format!("{indent}  ")));
        }
        ContentPointer::Sequence(areas) => {
            out.push_str(&format!("{indent}  <mets:seq>\n"));
            for a in areas {
                out.push_str(&area(&a.file_ref, &a.region_id, &format!("{indent}    ")));
            }
            out.push_str(&format!("{indent}  </mets:seq>\n"));
        }
    }
    out.push_str(&format!("{indent}</mets:fptr>\n"));
}
