//! The slice of a project model needed to describe published plugins.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::xml;

const DOCUMENT: &str = "project model";
const PLUGIN_PACKAGING: &str = "maven-plugin";
const DESCRIPTOR_PLUGIN: &str = "maven-plugin-plugin";
const DESCRIPTOR_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

xml::wrapped_list!(build_plugin_list, "plugin", BuildPlugin);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pom {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub packaging: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub build: Option<Build>,
    #[serde(default)]
    pub parent: Option<Parent>,
}

/// The `<parent>` reference a model inherits missing coordinates from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parent {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    #[serde(default, deserialize_with = "build_plugin_list::deserialize")]
    pub plugins: Vec<BuildPlugin>,
    #[serde(default)]
    pub plugin_management: Option<PluginManagement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManagement {
    #[serde(default, deserialize_with = "build_plugin_list::deserialize")]
    pub plugins: Vec<BuildPlugin>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPlugin {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub configuration: Option<PluginConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginConfiguration {
    #[serde(default)]
    pub goal_prefix: Option<String>,
}

impl Pom {
    pub fn from_xml(text: &str) -> Result<Self> {
        xml::from_str(DOCUMENT, text)
    }

    pub fn read(reader: &mut dyn Read) -> Result<Self> {
        xml::from_reader(DOCUMENT, reader)
    }

    /// Group id, inherited from the parent when the model omits it.
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref()?.group_id.as_deref())
    }

    /// Version, inherited from the parent when the model omits it.
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref()?.version.as_deref())
    }

    pub fn is_plugin(&self) -> bool {
        self.packaging.as_deref() == Some(PLUGIN_PACKAGING)
    }

    /// Goal prefix configured on the plugin descriptor plugin, looking at the
    /// declared build plugins before the managed ones.
    ///
    /// Only the first descriptor plugin in each list is consulted.
    pub fn configured_goal_prefix(&self) -> Option<&str> {
        let build = self.build.as_ref()?;
        let declared = goal_prefix_in(&build.plugins);
        declared.or_else(|| {
            build
                .plugin_management
                .as_ref()
                .and_then(|management| goal_prefix_in(&management.plugins))
        })
    }

    /// Invocation prefix for a plugin published as `artifact_id`.
    pub fn plugin_prefix(&self, artifact_id: &str) -> String {
        if let Some(prefix) = self.configured_goal_prefix() {
            return prefix.to_owned();
        }
        if let Some(prefix) = artifact_id
            .strip_prefix("maven-")
            .and_then(|rest| rest.strip_suffix("-plugin"))
        {
            return prefix.to_owned();
        }
        if let Some(prefix) = artifact_id.strip_suffix("-maven-plugin") {
            return prefix.to_owned();
        }
        artifact_id.to_owned()
    }
}

fn goal_prefix_in(plugins: &[BuildPlugin]) -> Option<&str> {
    let descriptor = plugins.iter().find(|plugin| {
        plugin.artifact_id.as_deref() == Some(DESCRIPTOR_PLUGIN)
            && plugin
                .group_id
                .as_deref()
                .is_none_or(|group| group == DESCRIPTOR_PLUGIN_GROUP)
    })?;
    descriptor.configuration.as_ref()?.goal_prefix.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn plugin_pom(build: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.acme</groupId>
  <artifactId>ignored</artifactId>
  <version>1.0</version>
  <packaging>maven-plugin</packaging>
  <name>Acme Plugin</name>
  {build}
</project>"#
        )
    }

    #[test]
    fn test_declared_goal_prefix_wins() {
        let pom = Pom::from_xml(&plugin_pom(
            r#"<build>
    <plugins>
      <plugin>
        <artifactId>maven-plugin-plugin</artifactId>
        <configuration><goalPrefix>declared</goalPrefix></configuration>
      </plugin>
    </plugins>
    <pluginManagement>
      <plugins>
        <plugin>
          <groupId>org.apache.maven.plugins</groupId>
          <artifactId>maven-plugin-plugin</artifactId>
          <configuration><goalPrefix>managed</goalPrefix></configuration>
        </plugin>
      </plugins>
    </pluginManagement>
  </build>"#,
        ))
        .unwrap();

        assert!(pom.is_plugin());
        assert_eq!(pom.name.as_deref(), Some("Acme Plugin"));
        assert_eq!(pom.plugin_prefix("maven-foo-plugin"), "declared");
    }

    #[test]
    fn test_managed_goal_prefix_used_when_not_declared() {
        let pom = Pom::from_xml(&plugin_pom(
            r#"<build>
    <pluginManagement>
      <plugins>
        <plugin>
          <groupId>org.apache.maven.plugins</groupId>
          <artifactId>maven-plugin-plugin</artifactId>
          <configuration><goalPrefix>managed</goalPrefix></configuration>
        </plugin>
      </plugins>
    </pluginManagement>
  </build>"#,
        ))
        .unwrap();

        assert_eq!(pom.plugin_prefix("whatever"), "managed");
    }

    #[test]
    fn test_foreign_descriptor_group_is_ignored() {
        let pom = Pom::from_xml(&plugin_pom(
            r#"<build>
    <plugins>
      <plugin>
        <groupId>com.example</groupId>
        <artifactId>maven-plugin-plugin</artifactId>
        <configuration><goalPrefix>nope</goalPrefix></configuration>
      </plugin>
    </plugins>
  </build>"#,
        ))
        .unwrap();

        assert_eq!(pom.plugin_prefix("acme-maven-plugin"), "acme");
    }

    #[rstest]
    #[case("maven-compiler-plugin", "compiler")]
    #[case("exec-maven-plugin", "exec")]
    #[case("custom-tool", "custom-tool")]
    fn test_prefix_naming_conventions(#[case] artifact_id: &str, #[case] expected: &str) {
        let pom = Pom::from_xml(&plugin_pom("")).unwrap();
        assert_eq!(pom.plugin_prefix(artifact_id), expected);
    }

    #[test]
    fn test_coordinates_inherited_from_parent() {
        let pom = Pom::from_xml(
            "<project><parent><groupId>org.acme</groupId><artifactId>parent</artifactId>\
             <version>2.0</version></parent><artifactId>child</artifactId></project>",
        )
        .unwrap();
        assert_eq!(pom.effective_group_id(), Some("org.acme"));
        assert_eq!(pom.effective_version(), Some("2.0"));

        let own = Pom::from_xml(
            "<project><parent><groupId>org.acme</groupId><version>2.0</version></parent>\
             <groupId>org.other</groupId><version>3.0</version></project>",
        )
        .unwrap();
        assert_eq!(own.effective_group_id(), Some("org.other"));
        assert_eq!(own.effective_version(), Some("3.0"));
        assert_eq!(Pom::default().effective_group_id(), None);
    }

    #[test]
    fn test_jar_packaging_is_not_plugin() {
        let pom = Pom::from_xml("<project><packaging>jar</packaging></project>").unwrap();
        assert!(!pom.is_plugin());
        assert!(Pom::from_xml("<project><packaging>maven-plugin").is_err());
    }
}
