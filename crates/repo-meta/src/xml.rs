//! XML plumbing shared by the repository documents.

use std::io::Read;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Serialize `value` as an indented UTF-8 document with an XML declaration.
pub(crate) fn to_document<T: Serialize>(document: &'static str, value: &T) -> Result<String> {
    let mut body = String::new();
    let mut serializer = quick_xml::se::Serializer::new(&mut body);
    serializer.indent(' ', 2);
    value.serialize(serializer).map_err(|e| Error::Write {
        document,
        message: e.to_string(),
    })?;

    let mut out = String::with_capacity(DECLARATION.len() + body.len() + 1);
    out.push_str(DECLARATION);
    out.push_str(&body);
    out.push('\n');
    Ok(out)
}

pub(crate) fn from_str<T: DeserializeOwned>(document: &'static str, text: &str) -> Result<T> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    quick_xml::de::from_str(text).map_err(|e| Error::Parse {
        document,
        message: e.to_string(),
    })
}

pub(crate) fn from_reader<T: DeserializeOwned>(document: &'static str, reader: &mut dyn Read) -> Result<T> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| Error::Io { document, source })?;
    from_str(document, &String::from_utf8(bytes)?)
}

/// Serde adapter for `<items><item/>...</items>` wrapper elements.
///
/// Expands to a module usable with `#[serde(with = "...")]` on a `Vec` field.
macro_rules! wrapped_list {
    ($module:ident, $element:literal, $item:ty) => {
        pub(crate) mod $module {
            #[allow(unused_imports)]
            use super::*;
            use serde::{Deserialize, Deserializer, Serialize, Serializer};

            #[derive(Serialize)]
            struct Wrapper<'a> {
                #[serde(rename = $element)]
                items: &'a [$item],
            }

            #[derive(Deserialize)]
            struct Owned {
                #[serde(rename = $element, default)]
                items: Vec<$item>,
            }

            #[allow(dead_code)]
            pub fn serialize<S: Serializer>(items: &[$item], serializer: S) -> std::result::Result<S::Ok, S::Error> {
                Wrapper { items }.serialize(serializer)
            }

            pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<$item>, D::Error> {
                Ok(Owned::deserialize(deserializer)?.items)
            }
        }
    };
}

pub(crate) use wrapped_list;
