//! Project model (POM) text builders.
//!
//! Stores only look at packaging, name and the `maven-plugin-plugin`
//! goal prefix, so that is all these builders emit.

/// Builds the text of a `pom.xml`.
///
/// # Example
///
/// ```rust
/// use repo_test_utils::pom::PomBuilder;
///
/// let xml = PomBuilder::new("org.acme", "demo-maven-plugin", "1.0")
///     .plugin()
///     .name("Demo")
///     .build();
/// assert!(xml.contains("<packaging>maven-plugin</packaging>"));
/// ```
#[derive(Debug, Clone)]
pub struct PomBuilder {
    group_id: String,
    artifact_id: String,
    version: String,
    packaging: Option<String>,
    name: Option<String>,
    goal_prefix: Option<String>,
    managed_goal_prefix: Option<String>,
    inherited: bool,
}

impl PomBuilder {
    pub fn new(group_id: &str, artifact_id: &str, version: &str) -> Self {
        Self {
            group_id: group_id.to_owned(),
            artifact_id: artifact_id.to_owned(),
            version: version.to_owned(),
            packaging: None,
            name: None,
            goal_prefix: None,
            managed_goal_prefix: None,
            inherited: false,
        }
    }

    pub fn packaging(mut self, packaging: &str) -> Self {
        self.packaging = Some(packaging.to_owned());
        self
    }

    /// Shorthand for `maven-plugin` packaging.
    pub fn plugin(self) -> Self {
        self.packaging("maven-plugin")
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// Declare `maven-plugin-plugin` in `<build><plugins>` with this goal prefix.
    pub fn goal_prefix(mut self, prefix: &str) -> Self {
        self.goal_prefix = Some(prefix.to_owned());
        self
    }

    /// Declare `maven-plugin-plugin` in `<pluginManagement>` with this goal prefix.
    pub fn managed_goal_prefix(mut self, prefix: &str) -> Self {
        self.managed_goal_prefix = Some(prefix.to_owned());
        self
    }

    /// Take group id and version from a `<parent>` block instead of declaring them.
    pub fn inherit_coordinates(mut self) -> Self {
        self.inherited = true;
        self
    }

    /// `(group_id, artifact_id, version)`
    pub fn coordinates(&self) -> (&str, &str, &str) {
        (&self.group_id, &self.artifact_id, &self.version)
    }

    pub fn build(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<project>\n");
        xml.push_str("  <modelVersion>4.0.0</modelVersion>\n");
        if self.inherited {
            xml.push_str("  <parent>\n");
            xml.push_str(&format!("    <groupId>{}</groupId>\n", self.group_id));
            xml.push_str("    <artifactId>parent</artifactId>\n");
            xml.push_str(&format!("    <version>{}</version>\n", self.version));
            xml.push_str("  </parent>\n");
            xml.push_str(&format!("  <artifactId>{}</artifactId>\n", self.artifact_id));
        } else {
            xml.push_str(&format!("  <groupId>{}</groupId>\n", self.group_id));
            xml.push_str(&format!("  <artifactId>{}</artifactId>\n", self.artifact_id));
            xml.push_str(&format!("  <version>{}</version>\n", self.version));
        }
        if let Some(packaging) = &self.packaging {
            xml.push_str(&format!("  <packaging>{packaging}</packaging>\n"));
        }
        if let Some(name) = &self.name {
            xml.push_str(&format!("  <name>{name}</name>\n"));
        }
        if self.goal_prefix.is_some() || self.managed_goal_prefix.is_some() {
            xml.push_str("  <build>\n");
            if let Some(prefix) = &self.goal_prefix {
                xml.push_str("    <plugins>\n");
                xml.push_str(&plugin_plugin(prefix));
                xml.push_str("    </plugins>\n");
            }
            if let Some(prefix) = &self.managed_goal_prefix {
                xml.push_str("    <pluginManagement>\n      <plugins>\n");
                xml.push_str(&plugin_plugin(prefix));
                xml.push_str("      </plugins>\n    </pluginManagement>\n");
            }
            xml.push_str("  </build>\n");
        }
        xml.push_str("</project>\n");
        xml
    }
}

fn plugin_plugin(prefix: &str) -> String {
    format!(
        "      <plugin>\n\
         \x20       <groupId>org.apache.maven.plugins</groupId>\n\
         \x20       <artifactId>maven-plugin-plugin</artifactId>\n\
         \x20       <configuration><goalPrefix>{prefix}</goalPrefix></configuration>\n\
         \x20     </plugin>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_pom_has_coordinates_only() {
        let xml = PomBuilder::new("g", "a", "1").build();
        assert!(xml.contains("<groupId>g</groupId>"));
        assert!(!xml.contains("<packaging>"));
        assert!(!xml.contains("<build>"));
    }

    #[test]
    fn inherited_coordinates_move_into_parent() {
        let xml = PomBuilder::new("g", "a", "1").inherit_coordinates().build();
        let parent_end = xml.find("</parent>").unwrap();
        assert!(xml.find("<groupId>g</groupId>").unwrap() < parent_end);
        assert!(xml.find("<artifactId>a</artifactId>").unwrap() > parent_end);
    }

    #[test]
    fn goal_prefixes_land_in_their_sections() {
        let xml = PomBuilder::new("g", "a", "1")
            .goal_prefix("declared")
            .managed_goal_prefix("managed")
            .build();
        let management = xml.find("<pluginManagement>").unwrap();
        assert!(xml.find("declared").unwrap() < management);
        assert!(xml.find("managed</goalPrefix>").unwrap() > management);
    }
}
