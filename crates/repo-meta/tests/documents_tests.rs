//! Document-level behaviour across the repository file types

use pretty_assertions::assert_eq;
use repo_meta::{
    ArchetypeCatalog, Error, Metadata, Plugin, Pom, Versioning, compare_versions, sort_versions,
};
use repo_test_utils::pom::PomBuilder;
use rstest::rstest;
use std::cmp::Ordering;

const GROUP_METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <plugins>
    <plugin>
      <name>Apache Maven Clean Plugin</name>
      <prefix>clean</prefix>
      <artifactId>maven-clean-plugin</artifactId>
    </plugin>
    <plugin>
      <prefix>exec</prefix>
      <artifactId>exec-maven-plugin</artifactId>
    </plugin>
  </plugins>
</metadata>
"#;

#[test]
fn test_group_metadata_lists_plugins() {
    let metadata = Metadata::from_xml(GROUP_METADATA).unwrap();

    assert!(metadata.versioning.is_none());
    assert_eq!(
        metadata.plugins,
        vec![
            Plugin {
                name: Some("Apache Maven Clean Plugin".into()),
                prefix: "clean".into(),
                artifact_id: "maven-clean-plugin".into(),
            },
            Plugin {
                name: None,
                prefix: "exec".into(),
                artifact_id: "exec-maven-plugin".into(),
            },
        ]
    );
    assert_eq!(Metadata::from_xml(&metadata.to_xml().unwrap()).unwrap(), metadata);
}

#[test]
fn test_read_skips_byte_order_mark() {
    let text = format!("\u{feff}{GROUP_METADATA}");
    let metadata = Metadata::read(&mut text.as_bytes()).unwrap();
    assert_eq!(metadata.plugins.len(), 2);
}

#[test]
fn test_empty_document_is_empty() {
    assert!(Metadata::from_xml("<metadata/>").unwrap().is_empty());
    assert!(!Metadata::from_xml(GROUP_METADATA).unwrap().is_empty());
}

#[rstest]
#[case("<metadata><groupId>unterminated")]
#[case("<metadata><versioning></metadata>")]
fn test_malformed_metadata_is_a_parse_error(#[case] text: &str) {
    let error = Metadata::from_xml(text).unwrap_err();
    assert!(matches!(error, Error::Parse { document: "repository metadata", .. }));
    assert!(error.to_string().starts_with("Malformed repository metadata"));
}

#[test]
fn test_invalid_utf8_is_an_encoding_error() {
    let error = Metadata::read(&mut &[0x3c, 0xff, 0xfe][..]).unwrap_err();
    assert!(matches!(error, Error::Encoding(_)));
}

#[test]
fn test_versions_merged_from_three_repositories() {
    let repository = |versions: &[&str], last_updated: &str| Metadata {
        group_id: Some("org.acme".into()),
        artifact_id: Some("foo".into()),
        versioning: Some(Versioning {
            latest: versions.last().map(|v| v.to_string()),
            versions: versions.iter().map(|v| v.to_string()).collect(),
            last_updated: Some(last_updated.into()),
            ..Versioning::default()
        }),
        ..Metadata::default()
    };

    let mut merged = Metadata::default();
    for metadata in [
        repository(&["1.0", "1.1"], "20240101000000"),
        repository(&["1.1", "2.0-beta-1"], "20240301000000"),
        repository(&["1.2"], "20240201000000"),
    ] {
        merged.merge(&metadata);
    }

    let mut versioning = merged.versioning.unwrap();
    assert_eq!(versioning.latest.as_deref(), Some("2.0-beta-1"));
    assert_eq!(versioning.last_updated.as_deref(), Some("20240301000000"));
    sort_versions(&mut versioning.versions);
    assert_eq!(versioning.versions, vec!["1.0", "1.1", "1.2", "2.0-beta-1"]);
}

#[test]
fn test_catalog_round_trip_keeps_optional_fields() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<archetype-catalog>
  <archetypes>
    <archetype>
      <groupId>org.acme.archetypes</groupId>
      <artifactId>quickstart</artifactId>
      <version>1.0</version>
      <description>Quick start</description>
    </archetype>
    <archetype>
      <groupId>org.acme.archetypes</groupId>
      <artifactId>webapp</artifactId>
      <version>2.1</version>
      <repository>https://repo.example.org/</repository>
    </archetype>
  </archetypes>
</archetype-catalog>
"#;
    let catalog = ArchetypeCatalog::from_xml(xml).unwrap();
    assert_eq!(catalog.archetypes.len(), 2);
    assert_eq!(catalog.archetypes[0].description.as_deref(), Some("Quick start"));
    assert_eq!(catalog.archetypes[1].repository.as_deref(), Some("https://repo.example.org/"));

    let written = catalog.to_xml().unwrap();
    assert!(!written.contains("<repository/>"));
    assert_eq!(ArchetypeCatalog::from_xml(&written).unwrap(), catalog);
}

#[rstest]
#[case(PomBuilder::new("org.acme", "maven-demo-plugin", "1.0").plugin(), "demo")]
#[case(PomBuilder::new("org.acme", "demo-maven-plugin", "1.0").plugin(), "demo")]
#[case(PomBuilder::new("org.acme", "tool", "1.0").plugin(), "tool")]
#[case(
    PomBuilder::new("org.acme", "maven-demo-plugin", "1.0").plugin().goal_prefix("dm"),
    "dm"
)]
#[case(
    PomBuilder::new("org.acme", "maven-demo-plugin", "1.0").plugin().managed_goal_prefix("mg"),
    "mg"
)]
fn test_plugin_prefix_from_project_model(#[case] pom: PomBuilder, #[case] expected: &str) {
    let (_, artifact_id, _) = pom.coordinates();
    let model = Pom::from_xml(&pom.build()).unwrap();
    assert!(model.is_plugin());
    assert_eq!(model.plugin_prefix(artifact_id), expected);
}

#[test]
fn test_project_model_name_and_packaging() {
    let text = PomBuilder::new("org.acme", "foo", "1.0").packaging("war").name("Foo").build();
    let model = Pom::read(&mut text.as_bytes()).unwrap();
    assert_eq!(model.packaging.as_deref(), Some("war"));
    assert_eq!(model.name.as_deref(), Some("Foo"));
    assert!(!model.is_plugin());
}

#[rstest]
#[case("1.0-SNAPSHOT", "1.0", Ordering::Less)]
#[case("1.0-alpha-1", "1.0-beta-1", Ordering::Less)]
#[case("1.0-rc1", "1.0", Ordering::Less)]
#[case("1.0-sp1", "1.0", Ordering::Greater)]
#[case("1.10", "1.9", Ordering::Greater)]
#[case("1.0.0", "1", Ordering::Equal)]
fn test_version_ordering(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
    assert_eq!(compare_versions(a, b), expected);
}
