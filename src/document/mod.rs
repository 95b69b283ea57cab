//! The parsed page and the environment it is evaluated in
//!
//! Extraction itself runs inside `dom_smoothie`, which builds its own tree.
//! A `Document` keeps the raw HTML and answers the metadata questions the
//! extraction library leaves open: meta tags, JSON-LD blocks, the `<title>`,
//! and a script-free body for the fallback path.

use ego_tree::NodeId;
use log::{debug, warn};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

use crate::utils::{VIEWPORT_HEIGHT, VIEWPORT_WIDTH};

static META_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta").expect("BUG: hardcoded CSS selector 'meta' is invalid")
});

static JSON_LD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#)
        .expect("BUG: hardcoded CSS selector for JSON-LD scripts is invalid")
});

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector 'title' is invalid")
});

static HEAD_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("head").expect("BUG: hardcoded CSS selector 'head' is invalid")
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("BUG: hardcoded CSS selector 'body' is invalid")
});

static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script, noscript")
        .expect("BUG: hardcoded CSS selector 'script, noscript' is invalid")
});

/// Fixed viewport the page is assumed to be rendered in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub inner_width: u32,
    pub inner_height: u32,
    pub device_pixel_ratio: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            inner_width: VIEWPORT_WIDTH,
            inner_height: VIEWPORT_HEIGHT,
            device_pixel_ratio: 1.0,
        }
    }
}

/// A `<meta>` element with content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    pub content: String,
}

impl MetaTag {
    /// Whether this tag is keyed by `key` through either `name` or `property`
    #[must_use]
    pub fn is(&self, key: &str) -> bool {
        self.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(key))
            || self.property.as_deref().is_some_and(|p| p.eq_ignore_ascii_case(key))
    }
}

/// Raw page HTML plus its base URL and viewport
#[derive(Debug, Clone)]
pub struct Document {
    pub html: String,
    pub base_url: Option<Url>,
    pub environment: Environment,
}

impl Document {
    #[must_use]
    pub fn new(html: impl Into<String>, base_url: Option<Url>) -> Self {
        let document = Self {
            html: html.into(),
            base_url,
            environment: Environment::default(),
        };
        debug!(
            "Document environment: {}x{} @{}x, base URL {}",
            document.environment.inner_width,
            document.environment.inner_height,
            document.environment.device_pixel_ratio,
            document.base_url.as_ref().map_or("<none>", Url::as_str)
        );
        document
    }

    fn parse(&self) -> Html {
        Html::parse_document(&self.html)
    }

    /// Every `<meta>` with a `content` and a `name` or `property`, in document order
    #[must_use]
    pub fn meta_tags(&self) -> Vec<MetaTag> {
        let html = self.parse();
        html.select(&META_SELECTOR)
            .filter_map(|el| {
                let attr = |key: &str| el.value().attr(key).map(str::to_string);
                let content = attr("content")?;
                let name = attr("name");
                let property = attr("property");
                if name.is_none() && property.is_none() {
                    return None;
                }
                Some(MetaTag {
                    name,
                    property,
                    content,
                })
            })
            .collect()
    }

    /// Parsed JSON-LD blocks
    ///
    /// Top-level arrays and `@graph` members are flattened so each returned
    /// value is one schema.org entity. Blocks that are not valid JSON are
    /// skipped with a warning.
    #[must_use]
    pub fn schema_org_data(&self) -> Vec<Value> {
        let html = self.parse();
        let mut items = Vec::new();

        for (index, script) in html.select(&JSON_LD_SELECTOR).enumerate() {
            let raw: String = script.text().collect();
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(raw) {
                Ok(value) => flatten_schema(value, &mut items),
                Err(e) => warn!("Skipping JSON-LD block {index}: {e}"),
            }
        }

        items
    }

    /// Trimmed text of `<title>`, if any
    #[must_use]
    pub fn title_tag(&self) -> Option<String> {
        let html = self.parse();
        html.select(&TITLE_SELECTOR)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Inner HTML of `<body>`, or the whole document when there is none
    #[must_use]
    pub fn body_html(&self) -> String {
        let html = self.parse();
        html.select(&BODY_SELECTOR)
            .next()
            .map_or_else(|| html.root_element().html(), |body| body.inner_html())
    }

    /// Outer HTML of the first element matching `selector`
    ///
    /// Returns `None` when the selector is invalid or matches nothing.
    #[must_use]
    pub fn select_outer_html(&self, selector: &str) -> Option<String> {
        let selector = match Selector::parse(selector) {
            Ok(s) => s,
            Err(e) => {
                warn!("Invalid content selector '{selector}': {e}");
                return None;
            }
        };
        let html = self.parse();
        html.select(&selector).next().map(|el| el.html())
    }

    /// A copy whose `<body>` holds only the first element matching `selector`
    ///
    /// `<head>` is kept so metadata survives. Returns `None` when the
    /// selector is invalid or matches nothing.
    #[must_use]
    pub fn narrowed(&self, selector: &str) -> Option<Self> {
        let fragment = self.select_outer_html(selector)?;
        let html = self.parse();
        let head = html
            .select(&HEAD_SELECTOR)
            .next()
            .map(|h| h.inner_html())
            .unwrap_or_default();
        let lang = html
            .root_element()
            .value()
            .attr("lang")
            .map(|l| format!(r#" lang="{}""#, l.replace('"', "&quot;")))
            .unwrap_or_default();

        Some(Self {
            html: format!("<!DOCTYPE html><html{lang}><head>{head}</head><body>{fragment}</body></html>"),
            base_url: self.base_url.clone(),
            environment: self.environment,
        })
    }

    /// The document with `<script>` and `<noscript>` elements removed
    #[must_use]
    pub fn strip_scripts(&self) -> String {
        let mut html = self.parse();
        let ids: Vec<NodeId> = html.select(&SCRIPT_SELECTOR).map(|el| el.id()).collect();
        for id in ids {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }
        html.html()
    }

    /// Script-free inner HTML of `<body>`
    #[must_use]
    pub fn clean_body_html(&self) -> String {
        Self::new_quiet(self.strip_scripts()).body_html()
    }

    fn new_quiet(html: String) -> Self {
        Self {
            html,
            base_url: None,
            environment: Environment::default(),
        }
    }
}

/// First string found for `key` in a JSON-LD entity
///
/// Handles plain strings, `{ "name": .. }` / `{ "url": .. }` objects, and
/// arrays of either (first usable element wins).
#[must_use]
pub fn schema_string(entity: &Value, key: &str) -> Option<String> {
    fn as_text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Object(map) => map
                .get("name")
                .or_else(|| map.get("url"))
                .and_then(as_text),
            Value::Array(items) => items.iter().find_map(as_text),
            _ => None,
        }
    }
    entity.get(key).and_then(as_text)
}

fn flatten_schema(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                if let Value::Object(_) = item {
                    flatten_schema(item, out);
                }
            }
        }
        Value::Object(mut map) => {
            if let Some(Value::Array(graph)) = map.remove("@graph") {
                out.extend(graph.into_iter().filter(Value::is_object));
                if map.keys().any(|k| k != "@context") {
                    out.push(Value::Object(map));
                }
            } else {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}
