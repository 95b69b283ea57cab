//! Test utilities and helper functions for the declutter test suite

use anyhow::Result;
use declutter::RetryPolicy;
use mockito::{Mock, Server};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Creates a temporary directory for test output
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test HTML document with specified content
#[allow(dead_code)]
pub fn create_test_html(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
</head>
<body>
    {}
</body>
</html>"#,
        html_escape::encode_text(title),
        body
    )
}

/// An article long enough for the readability pass to accept
#[allow(dead_code)]
pub fn create_article_html(title: &str, author: &str) -> String {
    let paragraph = "Rivers carve their valleys slowly, grain by grain, over thousands of \
                     years, and the people who live beside them learn to read the water \
                     the way others read the weather or the faces of old friends. ";
    let body = format!(
        r#"<header><nav><a href="/">Home</a> <a href="/archive">Archive</a></nav></header>
    <article>
      <h1>{title}</h1>
      <p>{p}</p>
      <p>{p}<a href="../related">a related story</a>.</p>
      <p>{p}</p>
      <p>{p}</p>
    </article>
    <footer>Footer links and copyright</footer>"#,
        title = html_escape::encode_text(title),
        p = paragraph.repeat(2)
    );

    create_test_html(title, &body).replace(
        "<meta charset=\"UTF-8\">",
        &format!(
            "<meta charset=\"UTF-8\">\n    <meta name=\"author\" content=\"{}\">",
            html_escape::encode_double_quoted_attribute(author)
        ),
    )
}

/// Builds a `<urlset>` sitemap listing `urls`
#[allow(dead_code)]
pub fn create_urlset(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|u| format!("  <url><loc>{}</loc></url>\n", html_escape::encode_text(u)))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{entries}</urlset>"
    )
}

/// Builds a `<sitemapindex>` listing `sitemaps`
#[allow(dead_code)]
pub fn create_sitemap_index(sitemaps: &[String]) -> String {
    let entries: String = sitemaps
        .iter()
        .map(|u| format!("  <sitemap><loc>{u}</loc></sitemap>\n"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{entries}</sitemapindex>"
    )
}

/// Retry policy with short, deterministic delays
#[allow(dead_code)]
pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(10),
        backoff_multiplier: 2.0,
        max_delay: Duration::from_millis(50),
        jitter: false,
    }
}

/// Creates a mock endpoint that returns HTML content
#[allow(dead_code)]
pub async fn create_html_mock(server: &mut Server, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns XML content
#[allow(dead_code)]
pub async fn create_xml_mock(server: &mut Server, path: &str, xml: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/xml")
        .with_body(xml)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns a redirect
#[allow(dead_code)]
pub async fn create_redirect_mock(server: &mut Server, from: &str, to: &str) -> Mock {
    server
        .mock("GET", from)
        .with_status(301)
        .with_header("location", to)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns an error `hits` times
#[allow(dead_code)]
pub async fn create_error_mock(server: &mut Server, path: &str, status: usize, hits: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_body("Error")
        .expect(hits)
        .create_async()
        .await
}

/// Verifies that a file exists and has content
#[allow(dead_code)]
pub async fn assert_file_exists_with_content(path: &Path) -> Result<String> {
    assert!(path.exists(), "File does not exist: {path:?}");
    let content = tokio::fs::read_to_string(path).await?;
    assert!(!content.is_empty(), "File is empty: {path:?}");
    Ok(content)
}

/// Helper to create test URLs
#[allow(dead_code)]
pub fn test_url(server: &Server, path: &str) -> String {
    format!("{}{}", server.url(), path)
}
