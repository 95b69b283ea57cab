//! HTTP fetching with status classification
//!
//! One `Fetcher` wraps a pooled reqwest client and is shared by every page
//! and sitemap request of a run.

use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use std::time::Duration;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{DeclutterError, DeclutterResult, FetchError};

/// A successfully fetched response body
#[derive(Debug, Clone)]
pub struct Fetched<B> {
    pub body: B,
    /// URL after following redirects
    pub final_url: Url,
    pub content_type: Option<String>,
}

/// Reusable HTTP client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Build a client from `config`
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized or the user agent is
    /// not a valid header value.
    pub fn new(config: &FetchConfig) -> DeclutterResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| DeclutterError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    async fn send(&self, url: &Url) -> DeclutterResult<reqwest::Response> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        Ok(response)
    }

    /// GET `url` and decode the body as text, honoring the declared charset
    pub async fn fetch_text(&self, url: &Url) -> DeclutterResult<Fetched<String>> {
        let response = self.send(url).await?;
        let final_url = response.url().clone();
        let content_type = content_type(&response);

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), &e))?;
        debug!("Fetched {} bytes from {final_url}", body.len());

        Ok(Fetched {
            body,
            final_url,
            content_type,
        })
    }

    /// GET `url` and return the raw body
    pub async fn fetch_bytes(&self, url: &Url) -> DeclutterResult<Fetched<Vec<u8>>> {
        let response = self.send(url).await?;
        let final_url = response.url().clone();
        let content_type = content_type(&response);

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), &e))?
            .to_vec();
        debug!("Fetched {} bytes from {final_url}", body.len());

        Ok(Fetched {
            body,
            final_url,
            content_type,
        })
    }
}

fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
