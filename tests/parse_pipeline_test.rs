//! Load, extract, and render single pages

use declutter::extractor::ExtractorKind;
use declutter::output::{render, render_property, write_output};
use declutter::{DeclutterError, ExtractOptions, FetchConfig, OutputFormat, parse_source};
use url::Url;

mod common;

use common::{create_article_html, create_html_mock, create_test_dir, create_test_html, test_url};

#[tokio::test]
async fn test_parse_file_without_base_url_keeps_relative_links() {
    let dir = create_test_dir().unwrap();
    let path = dir.path().join("article.html");
    std::fs::write(&path, create_article_html("Local Story", "Ana Ruiz")).unwrap();

    let parsed = parse_source(
        path.to_str().unwrap(),
        &FetchConfig::default(),
        &ExtractOptions::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(parsed.result.title, "Local Story");
    assert_eq!(parsed.result.author.as_deref(), Some("Ana Ruiz"));
    assert_eq!(parsed.result.extractor, ExtractorKind::Readability);
    assert!(parsed.result.url.is_none());
    assert!(parsed.result.domain.is_none());

    let markdown = render(&parsed.result, OutputFormat::Markdown, &parsed.source).unwrap();
    assert!(markdown.contains(&format!("source: \"{}\"", path.display())));
    assert!(markdown.contains("](../related)"));
}

#[tokio::test]
async fn test_parse_file_with_base_url_resolves_links() {
    let dir = create_test_dir().unwrap();
    let path = dir.path().join("article.html");
    std::fs::write(&path, create_article_html("Local Story", "Ana Ruiz")).unwrap();
    let base = Url::parse("https://news.example.org/world/story").unwrap();

    let parsed = parse_source(
        path.to_str().unwrap(),
        &FetchConfig::default(),
        &ExtractOptions::default(),
        Some(base),
    )
    .await
    .unwrap();

    assert_eq!(parsed.result.domain.as_deref(), Some("news.example.org"));
    let markdown = render(&parsed.result, OutputFormat::Markdown, &parsed.source).unwrap();
    assert!(markdown.contains("source: \"https://news.example.org/world/story\""));
    assert!(markdown.contains("](https://news.example.org/related)"));
}

#[tokio::test]
async fn test_parse_url_renders_markdown_document() {
    let mut server = mockito::Server::new_async().await;
    let _page = create_html_mock(
        &mut server,
        "/blog/rivers",
        &create_article_html("Reading Rivers", "Jo Banks"),
    )
    .await;

    let parsed = parse_source(
        &test_url(&server, "/blog/rivers"),
        &FetchConfig::default(),
        &ExtractOptions::default(),
        None,
    )
    .await
    .unwrap();

    let markdown = render(&parsed.result, OutputFormat::Markdown, &parsed.source).unwrap();
    let (frontmatter, body) = markdown
        .strip_prefix("---\n")
        .and_then(|rest| rest.split_once("---\n"))
        .expect("markdown starts with frontmatter");

    assert!(frontmatter.contains("title: \"Reading Rivers\""));
    assert!(frontmatter.contains("author: \"Jo Banks\""));
    assert!(frontmatter.contains("word_count: "));
    assert!(frontmatter.contains("extracted: \""));
    assert!(body.contains("Reading Rivers"));
    assert!(body.contains(&format!("]({})", test_url(&server, "/related"))));
    assert!(!body.contains("Archive"));
}

#[tokio::test]
async fn test_json_output_and_properties() {
    let dir = create_test_dir().unwrap();
    let path = dir.path().join("tiny.html");
    std::fs::write(&path, create_test_html("Tiny", "<p>Just a few words.</p>")).unwrap();

    let parsed = parse_source(
        path.to_str().unwrap(),
        &FetchConfig::default(),
        &ExtractOptions::default(),
        None,
    )
    .await
    .unwrap();

    assert_eq!(parsed.result.extractor, ExtractorKind::Fallback);
    let json: serde_json::Value =
        serde_json::from_str(&render(&parsed.result, OutputFormat::Json, &parsed.source).unwrap())
            .unwrap();
    assert_eq!(json["title"], "Tiny");
    assert_eq!(json["wordCount"], 4);
    assert!(json["author"].is_null());

    assert_eq!(render_property(&parsed.result, "title").unwrap(), "Tiny");
    assert_eq!(render_property(&parsed.result, "author").unwrap(), "");
    assert_eq!(render_property(&parsed.result, "wordCount").unwrap(), "4");
    let err = render_property(&parsed.result, "nope").unwrap_err();
    assert!(matches!(err, DeclutterError::UnknownProperty { .. }), "{err}");
}

#[tokio::test]
async fn test_html_output_is_the_extracted_content() {
    let dir = create_test_dir().unwrap();
    let path = dir.path().join("article.html");
    std::fs::write(&path, create_article_html("Html Out", "Lee")).unwrap();

    let parsed = parse_source(
        path.to_str().unwrap(),
        &FetchConfig::default(),
        &ExtractOptions::default(),
        None,
    )
    .await
    .unwrap();

    let html = render(&parsed.result, OutputFormat::Html, &parsed.source).unwrap();
    assert_eq!(html, parsed.result.content);
    assert!(html.contains("Rivers carve"));
}

#[tokio::test]
async fn test_write_output_creates_parent_directories() {
    let dir = create_test_dir().unwrap();
    let target = dir.path().join("nested").join("out").join("page.md");

    write_output("# Saved\n", Some(&target)).await.unwrap();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "# Saved\n");
}

#[tokio::test]
async fn test_unreachable_url_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _gone = common::create_error_mock(&mut server, "/gone", 404, 1).await;

    let err = parse_source(
        &test_url(&server, "/gone"),
        &FetchConfig::default(),
        &ExtractOptions::default(),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, DeclutterError::Fetch(_)), "{err}");
}
