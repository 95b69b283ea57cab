//! The extraction result and property lookup

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::document::MetaTag;
use crate::error::{DeclutterError, DeclutterResult};

/// Which path produced the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// The readability pass found a main-content candidate
    Readability,
    /// Readability gave up; content is the script-free `<body>`
    Fallback,
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Readability => f.write_str("readability"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Readable content and metadata of one page
///
/// Serialized in camelCase. Optional fields are always present in JSON
/// output (as `null` when unknown) so every property can be looked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub title: String,
    pub author: Option<String>,
    /// Cleaned HTML of the main content
    pub content: String,
    pub description: Option<String>,
    /// Host of the page URL without a leading `www.`
    pub domain: Option<String>,
    pub favicon: Option<String>,
    pub image: Option<String>,
    pub published: Option<String>,
    pub site: Option<String>,
    pub lang: Option<String>,
    pub dir: Option<String>,
    pub word_count: usize,
    pub parse_time_ms: u64,
    pub url: Option<String>,
    pub meta_tags: Vec<MetaTag>,
    pub schema_org_data: Vec<Value>,
    pub extractor: ExtractorKind,
}

impl ParseResult {
    /// JSON names of every property, in serialization order
    pub const PROPERTY_NAMES: [&'static str; 17] = [
        "title",
        "author",
        "content",
        "description",
        "domain",
        "favicon",
        "image",
        "published",
        "site",
        "lang",
        "dir",
        "wordCount",
        "parseTimeMs",
        "url",
        "metaTags",
        "schemaOrgData",
        "extractor",
    ];

    /// Look up one property by its JSON name
    ///
    /// # Errors
    ///
    /// Returns [`DeclutterError::UnknownProperty`] for names outside
    /// [`Self::PROPERTY_NAMES`].
    pub fn property(&self, name: &str) -> DeclutterResult<Value> {
        if !Self::PROPERTY_NAMES.contains(&name) {
            return Err(DeclutterError::UnknownProperty {
                name: name.to_string(),
                valid: Self::PROPERTY_NAMES.join(", "),
            });
        }

        let mut value = serde_json::to_value(self)?;
        Ok(value
            .get_mut(name)
            .map(Value::take)
            .unwrap_or(Value::Null))
    }
}
