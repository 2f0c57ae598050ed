//! Archetype catalogs (`archetype-catalog.xml`).

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::xml;

/// File name of the catalog at the repository root.
pub const ARCHETYPE_CATALOG_FILE_NAME: &str = "archetype-catalog.xml";

const DOCUMENT: &str = "archetype catalog";

xml::wrapped_list!(archetype_list, "archetype", Archetype);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "archetype-catalog")]
pub struct ArchetypeCatalog {
    #[serde(default, with = "archetype_list")]
    pub archetypes: Vec<Archetype>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archetype {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ArchetypeCatalog {
    pub fn from_xml(text: &str) -> Result<Self> {
        xml::from_str(DOCUMENT, text)
    }

    pub fn read(reader: &mut dyn Read) -> Result<Self> {
        xml::from_reader(DOCUMENT, reader)
    }

    pub fn to_xml(&self) -> Result<String> {
        xml::to_document(DOCUMENT, self)
    }

    /// Append every archetype of `other` not already listed.
    pub fn extend_from(&mut self, other: &ArchetypeCatalog) {
        for archetype in &other.archetypes {
            if !self.archetypes.contains(archetype) {
                self.archetypes.push(archetype.clone());
            }
        }
    }
}
