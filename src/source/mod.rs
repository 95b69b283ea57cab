//! Page sources: local files and URLs
//!
//! A source argument starting with `http://` or `https://` is fetched over
//! HTTP; anything else is read from disk relative to the working directory.

mod fetcher;

pub use fetcher::{Fetched, Fetcher};

use log::debug;
use std::fmt;
use std::path::PathBuf;
use url::Url;

use crate::error::{DeclutterError, DeclutterResult};

/// Where a page comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(Url),
}

/// Raw HTML of a page together with its provenance
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub source: Source,
    pub html: String,
    /// URL after redirects; `None` for files
    pub final_url: Option<Url>,
    pub content_type: Option<String>,
}

impl LoadedPage {
    /// Whether the declared content type is an HTML or XML flavour
    ///
    /// Pages without a declared type (files, bare servers) count as HTML.
    #[must_use]
    pub fn is_markup(&self) -> bool {
        self.content_type.as_deref().is_none_or(|ct| {
            let ct = ct.to_ascii_lowercase();
            ct.contains("html") || ct.contains("xml")
        })
    }
}

impl Source {
    /// Decide whether `input` is a URL or a file path
    ///
    /// # Errors
    ///
    /// Fails for empty input, for `http(s)://` input that does not parse as a
    /// URL, and when the working directory cannot be determined.
    pub fn detect(input: &str) -> DeclutterResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DeclutterError::InvalidSource {
                input: input.to_string(),
                reason: "source is empty".to_string(),
            });
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|e| DeclutterError::InvalidSource {
                input: input.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Self::Url(url));
        }

        let path = PathBuf::from(trimmed);
        if path.is_absolute() {
            Ok(Self::File(path))
        } else {
            Ok(Self::File(std::env::current_dir()?.join(path)))
        }
    }

    /// Read the file or fetch the URL
    pub async fn load(&self, fetcher: &Fetcher) -> DeclutterResult<LoadedPage> {
        match self {
            Self::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|source| DeclutterError::ReadFile {
                        path: path.clone(),
                        source,
                    })?;
                debug!("Read {} bytes from {}", bytes.len(), path.display());

                Ok(LoadedPage {
                    source: self.clone(),
                    html: String::from_utf8_lossy(&bytes).into_owned(),
                    final_url: None,
                    content_type: None,
                })
            }
            Self::Url(url) => {
                let fetched = fetcher.fetch_text(url).await?;
                Ok(LoadedPage {
                    source: self.clone(),
                    html: fetched.body,
                    final_url: Some(fetched.final_url),
                    content_type: fetched.content_type,
                })
            }
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_prefixes_are_urls() {
        assert!(matches!(
            Source::detect("https://example.com/a").unwrap(),
            Source::Url(_)
        ));
        assert!(matches!(
            Source::detect("http://example.com").unwrap(),
            Source::Url(_)
        ));
    }

    #[test]
    fn other_inputs_are_files_resolved_against_cwd() {
        let source = Source::detect("pages/article.html").unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(source, Source::File(cwd.join("pages/article.html")));
    }

    #[test]
    fn empty_and_malformed_sources_are_rejected() {
        assert!(Source::detect("   ").is_err());
        assert!(Source::detect("http://").is_err());
    }
}
