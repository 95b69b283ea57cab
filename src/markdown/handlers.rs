//! Custom element handlers for htmd
//!
//! Extends the default conversion with fenced code blocks that carry the
//! language hint from the HTML, backtick-safe inline code, and link text
//! fallbacks for icon-only anchors.

use htmd::{
    Element, HtmlToMarkdown,
    element_handler::{HandlerResult, Handlers},
};
use markup5ever_rcdom::{Node, NodeData};
use std::rc::Rc;

/// Elements whose content never reaches the markdown output
const SKIPPED_TAGS: [&str; 7] = ["script", "style", "noscript", "iframe", "svg", "template", "head"];

/// Create an htmd converter with the custom handlers installed
pub fn create_converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .add_handler(vec!["pre"], pre_handler)
        .add_handler(vec!["code"], code_handler)
        .add_handler(vec!["a"], link_handler)
        .build()
}

/// `<pre>` becomes a fenced block; the language comes from the `<pre>` or its `<code>` child
fn pre_handler(_handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let content = extract_raw_text(element.node);
    let content = content.trim_matches('\n');

    let language = get_language_from_attrs(element.attrs).or_else(|| {
        first_child_element(element.node, "code").and_then(|code| match &code.data {
            NodeData::Element { attrs, .. } => get_language_from_attrs(&attrs.borrow()),
            _ => None,
        })
    });

    let fence = fence_for(content);
    Some(HandlerResult::from(format!(
        "\n\n{fence}{}\n{content}\n{fence}\n\n",
        language.unwrap_or_default()
    )))
}

/// Inline `<code>`; code inside `<pre>` is emitted by [`pre_handler`]
fn code_handler(_handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let content = extract_raw_text(element.node);

    if is_inside_pre(element.node) {
        return Some(HandlerResult::from(content));
    }

    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Some(HandlerResult::from(String::new()));
    }

    let delimiter = "`".repeat(longest_backtick_run(trimmed) + 1);
    if trimmed.starts_with('`') || trimmed.ends_with('`') {
        Some(HandlerResult::from(format!("{delimiter} {trimmed} {delimiter}")))
    } else {
        Some(HandlerResult::from(format!("{delimiter}{trimmed}{delimiter}")))
    }
}

/// `<a>` with fallback text from aria-label, title, alt, or the cleaned href
fn link_handler(handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let text = handlers.walk_children(element.node).content;
    let text = text.trim();

    let Some(href) = get_attr(element.attrs, "href") else {
        return Some(HandlerResult::from(text.to_string()));
    };

    let link_text = if text.is_empty() {
        get_attr(element.attrs, "aria-label")
            .or_else(|| get_attr(element.attrs, "title"))
            .or_else(|| get_attr(element.attrs, "alt"))
            .unwrap_or_else(|| clean_url_for_display(&href))
    } else {
        text.to_string()
    };

    let result = match get_attr(element.attrs, "title") {
        Some(title) if title != link_text => {
            format!("[{link_text}]({href} \"{}\")", title.replace('"', "\\\""))
        }
        _ => format!("[{link_text}]({href})"),
    };

    Some(HandlerResult::from(result))
}

/// Raw text of a subtree, bypassing htmd's escaping
fn extract_raw_text(node: &Rc<Node>) -> String {
    let mut text = String::new();
    collect_text(node, &mut text);
    text
}

fn collect_text(node: &Rc<Node>, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { .. } | NodeData::Document | NodeData::Doctype { .. } => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
        NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
    }
}

fn is_inside_pre(node: &Rc<Node>) -> bool {
    let mut current = node.parent.take();
    node.parent.set(current.clone());

    while let Some(weak_parent) = current {
        let Some(parent) = weak_parent.upgrade() else {
            break;
        };
        if let NodeData::Element { ref name, .. } = parent.data
            && &*name.local == "pre"
        {
            return true;
        }
        current = parent.parent.take();
        parent.parent.set(current.clone());
    }
    false
}

fn first_child_element(node: &Rc<Node>, tag: &str) -> Option<Rc<Node>> {
    node.children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, NodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}

/// Language hint from `data-language` or a `language-*` / `lang-*` class
fn get_language_from_attrs(attrs: &[html5ever::Attribute]) -> Option<String> {
    if let Some(lang) = get_attr(attrs, "data-language") {
        return Some(lang.trim().to_ascii_lowercase());
    }

    let class = get_attr(attrs, "class")?;
    class.split_whitespace().find_map(|token| {
        token
            .strip_prefix("language-")
            .or_else(|| token.strip_prefix("lang-"))
            .filter(|lang| !lang.is_empty())
            .map(str::to_ascii_lowercase)
    })
}

fn get_attr(attrs: &[html5ever::Attribute], name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| a.value.to_string())
        .filter(|v| !v.trim().is_empty())
}

/// Backtick fence longer than any backtick run inside `content`
fn fence_for(content: &str) -> String {
    "`".repeat((longest_backtick_run(content) + 1).max(3))
}

fn longest_backtick_run(content: &str) -> usize {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

/// Human-readable link text derived from a URL
fn clean_url_for_display(url: &str) -> String {
    let cleaned = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches('/');
    let cleaned = cleaned.split(['?', '#']).next().unwrap_or(cleaned);
    let cleaned = cleaned
        .trim_end_matches('/')
        .trim_end_matches(".html")
        .trim_end_matches(".htm")
        .trim_end_matches("/index");
    let cleaned = cleaned.replace(['-', '_'], " ");

    let mut chars = cleaned.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_url_for_display() {
        assert_eq!(clean_url_for_display("/guide"), "Guide");
        assert_eq!(clean_url_for_display("/installation-guide"), "Installation guide");
        assert_eq!(clean_url_for_display("/docs/api.html"), "Docs/api");
        assert_eq!(clean_url_for_display("#"), "#");
    }

    #[test]
    fn test_code_block_with_language_class() {
        let converter = create_converter();
        let html = r#"<pre><code class="language-python">def hello():
    print("world")</code></pre>"#;
        let md = converter.convert(html).unwrap();

        assert!(md.contains("```python\ndef hello():\n    print(\"world\")\n```"), "got: {md}");
    }

    #[test]
    fn test_code_block_with_data_language() {
        let converter = create_converter();
        let md = converter
            .convert(r#"<pre data-language="Rust">let x = 1;</pre>"#)
            .unwrap();
        assert!(md.contains("```rust\nlet x = 1;\n```"), "got: {md}");
    }

    #[test]
    fn test_code_block_containing_fences() {
        let converter = create_converter();
        let md = converter.convert("<pre>```\ninner\n```</pre>").unwrap();
        assert!(md.contains("````\n```\ninner\n```\n````"), "got: {md}");
    }

    #[test]
    fn test_inline_code_with_backticks() {
        let converter = create_converter();
        let md = converter.convert("<p>Run <code>a`b</code> now</p>").unwrap();
        assert!(md.contains("``a`b``"), "got: {md}");
    }

    #[test]
    fn test_inline_code_with_double_backticks() {
        let converter = create_converter();
        let md = converter.convert("<p>Use <code>a``b</code> here</p>").unwrap();
        assert!(md.contains("```a``b```"), "got: {md}");

        let md = converter.convert("<p>Use <code>``x</code> here</p>").unwrap();
        assert!(md.contains("``` ``x ```"), "got: {md}");
    }

    #[test]
    fn test_inline_code_with_angle_brackets() {
        let converter = create_converter();
        let md = converter
            .convert("<p>Press <code>&lt;Left&gt;</code> to go back</p>")
            .unwrap();
        assert!(md.contains("`<Left>`"), "got: {md}");
    }

    #[test]
    fn test_link_fallbacks() {
        let converter = create_converter();
        let md = converter
            .convert(r#"<p><a href="/guide" aria-label="Installation Guide"></a></p>"#)
            .unwrap();
        assert!(md.contains("[Installation Guide](/guide)"), "got: {md}");

        let md = converter
            .convert(r#"<p><a href="/installation-guide"></a></p>"#)
            .unwrap();
        assert!(md.contains("[Installation guide](/installation-guide)"), "got: {md}");
    }

    #[test]
    fn test_skipped_tags() {
        let converter = create_converter();
        let md = converter
            .convert("<p>Keep</p><script>var x;</script><style>p{}</style><noscript>js</noscript>")
            .unwrap();
        assert_eq!(md.trim(), "Keep");
    }
}
