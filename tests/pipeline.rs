//! End-to-end pipeline tests: PAGE files in, structure container out.

use std::fs;

use quire::{
    read_mets, read_page, write_mets, ClassifierRules, RuleSet, StructureMap, SynthesisMode,
    Synthesizer, TypeTag,
};
use tempfile::TempDir;

fn page_file(dir: &TempDir, name: &str, regions: &str) -> std::path::PathBuf {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<PcGts xmlns="http://schema.primaresearch.org/PAGE/gts/pagecontent/2019-07-15">
  <Page imageFilename="{name}.tif" imageWidth="2000" imageHeight="3000">
{regions}
  </Page>
</PcGts>"#
    );
    let path = dir.path().join(format!("{name}.xml"));
    fs::write(&path, xml).unwrap();
    path
}

fn region(id: &str, subtype: &str, text: &str) -> String {
    format!(
        r#"    <TextRegion id="{id}" type="{subtype}">
      <Coords points="100,200 500,200 500,260 100,260"/>
      <TextEquiv><Unicode>{text}</Unicode></TextEquiv>
    </TextRegion>"#
    )
}

#[test]
fn pages_become_linked_structure() {
    let dir = TempDir::new().unwrap();
    let mets_path = dir.path().join("mets.xml");

    let p1 = page_file(
        &dir,
        "p_0001",
        &format!(
            "{}\n{}\n{}",
            region("r1", "heading", "Erstes Kapitel"),
            region("r2", "paragraph", "Es war einmal..."),
            region("r3", "page-number", "1")
        ),
    );
    let p2 = page_file(
        &dir,
        "p_0002",
        &format!(
            "{}\n{}",
            region("r1", "paragraph", "...und so weiter."),
            region("r2", "heading", "Zweites Kapitel")
        ),
    );

    // Seed the container with a volume, the way a catalogue record would
    let mut map = StructureMap::default();
    map.tree
        .insert(map.tree.root(), TypeTag::new("volume"), "Bd. 1");

    let rules = RuleSet::default();
    let classifier = ClassifierRules::default();
    let mut synth = Synthesizer::new(
        &mut map.tree,
        &mut map.links,
        SynthesisMode::PageLinks,
        &rules,
    )
    .unwrap();
    for path in [&p1, &p2] {
        for segment in read_page(path, &classifier).unwrap() {
            synth.process(&segment);
        }
    }
    let report = synth.finish();

    assert_eq!(report.created, 2);
    assert!(report.dropped.is_empty());

    write_mets(&mets_path, &map).unwrap();
    let restored = read_mets(&mets_path).unwrap();

    // Both chapters sit under the seeded volume
    let volume = restored.tree.lookup("LOG_1").unwrap();
    let chapters = &restored.tree.node(volume).children;
    assert_eq!(chapters.len(), 2);
    assert_eq!(restored.tree.node(chapters[0]).label, "Erstes Kapitel");
    assert_eq!(restored.tree.node(chapters[1]).label, "Zweites Kapitel");

    // Page one holds only the first chapter; page two spans the boundary
    assert_eq!(restored.links.divisions_for("p_0001"), ["LOG_2"]);
    assert_eq!(restored.links.divisions_for("p_0002"), ["LOG_2", "LOG_3"]);
}

#[test]
fn orphaned_text_in_later_run_is_dropped() {
    let dir = TempDir::new().unwrap();
    let mets_path = dir.path().join("mets.xml");

    let p1 = page_file(
        &dir,
        "p_0001",
        &format!(
            "{}\n{}",
            region("r1", "heading", "Der Winter"),
            region("r2", "paragraph", "Kalt ist es.")
        ),
    );
    let p2 = page_file(
        &dir,
        "p_0002",
        &region("r1", "paragraph", "Noch immer kalt."),
    );

    let rules = RuleSet::default();
    let classifier = ClassifierRules {
        heading_type: TypeTag::new("article"),
        ..ClassifierRules::default()
    };

    // First run: page one only
    let mut map = StructureMap::default();
    let synth = Synthesizer::new(
        &mut map.tree,
        &mut map.links,
        SynthesisMode::PageLinks,
        &rules,
    )
    .unwrap();
    synth.run(read_page(&p1, &classifier).unwrap());
    write_mets(&mets_path, &map).unwrap();

    // Second run: page two, against the persisted container. Its text has
    // no heading, so without the persisted link table it would be dropped.
    let mut resumed = read_mets(&mets_path).unwrap();
    let mut synth = Synthesizer::new(
        &mut resumed.tree,
        &mut resumed.links,
        SynthesisMode::PageLinks,
        &rules,
    )
    .unwrap();
    for segment in read_page(&p2, &classifier).unwrap() {
        synth.process(&segment);
    }
    let report = synth.finish();

    // The orphaned text is reported, not attached anywhere
    assert_eq!(report.dropped.len(), 1);
    assert_eq!(report.dropped[0].page_id, "p_0002");
    assert!(resumed.links.divisions_for("p_0002").is_empty());
    // The persisted article is untouched
    assert_eq!(resumed.links.divisions_for("p_0001"), ["LOG_1"]);
}
