//! Timeout-bounded HTTP fetching
//!
//! Every network call the scanner makes goes through the [`Fetch`] trait.
//! [`HttpFetcher`] is the reqwest-backed implementation; tests substitute
//! canned responses.

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Client, redirect};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::ScannerConfig;
use crate::error::FetchError;

/// HTTP method of a probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FetchMethod {
    #[default]
    Get,
    Head,
}

/// Redirect handling of a probe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RedirectMode {
    #[default]
    Follow,

    /// Return 3xx responses as-is so `Location` can be inspected
    Manual,
}

/// Per-request options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    pub method: FetchMethod,
    pub redirect: RedirectMode,

    /// Overrides the fetcher's default timeout
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    pub fn head() -> Self {
        Self {
            method: FetchMethod::Head,
            ..Self::default()
        }
    }

    pub fn manual_redirect() -> Self {
        Self {
            redirect: RedirectMode::Manual,
            ..Self::default()
        }
    }
}

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Final URL after any followed redirects
    pub url: String,
    pub status: u16,

    /// `Location` header, when present
    pub location: Option<String>,

    /// Body text; empty for HEAD requests
    pub body: String,

    /// Time from sending the request to reading the full body
    pub elapsed: Duration,
}

impl FetchResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// The network seam of the scanner
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Issue one request, bounded by the configured or overridden timeout.
    async fn fetch_with_timeout(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<FetchResponse, FetchError>;

    /// GET a resource whose absence is an expected outcome.
    ///
    /// Network failures are logged and turned into `None`.
    async fn fetch_text(&self, url: &str) -> Option<FetchResponse> {
        match self.fetch_with_timeout(url, FetchOptions::default()).await {
            Ok(response) => Some(response),
            Err(err) => {
                debug!(%url, error = %err, "resource probe failed");
                None
            }
        }
    }
}

/// reqwest-backed [`Fetch`] implementation
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    manual_client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ScannerConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        let manual_client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            manual_client,
            timeout: config.timeout(),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_with_timeout(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<FetchResponse, FetchError> {
        let client = match options.redirect {
            RedirectMode::Follow => &self.client,
            RedirectMode::Manual => &self.manual_client,
        };
        let request = match options.method {
            FetchMethod::Get => client.get(url),
            FetchMethod::Head => client.head(url),
        };
        let timeout = options.timeout.unwrap_or(self.timeout);

        let started = Instant::now();
        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            let body = match options.method {
                FetchMethod::Get => response.text().await?,
                FetchMethod::Head => String::new(),
            };

            Ok::<_, reqwest::Error>(FetchResponse {
                url: final_url,
                status,
                location,
                body,
                elapsed: started.elapsed(),
            })
        };

        // Dropping the timeout future cancels both the request and its timer.
        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(response)) => {
                debug!(
                    %url,
                    status = response.status,
                    elapsed_ms = response.elapsed_ms(),
                    "fetched"
                );
                Ok(response)
            }
            Ok(Err(err)) => Err(FetchError::Request {
                url: url.to_string(),
                message: err.to_string(),
            }),
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&ScannerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<html><title>Hello</title></html>")
            .create_async()
            .await;

        let response = fetcher()
            .fetch_with_timeout(&server.url(), FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.is_ok());
        assert!(response.body.contains("Hello"));
    }

    #[tokio::test]
    async fn test_sends_user_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/robots.txt")
            .match_header("user-agent", mockito::Matcher::Regex("siteaudit".to_string()))
            .with_status(200)
            .create_async()
            .await;

        let url = format!("{}/robots.txt", server.url());
        fetcher()
            .fetch_with_timeout(&url, FetchOptions::default())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_manual_redirect_exposes_location() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/")
            .with_status(301)
            .with_header("location", "https://example.com/")
            .create_async()
            .await;

        let response = fetcher()
            .fetch_with_timeout(&server.url(), FetchOptions::manual_redirect())
            .await
            .unwrap();

        assert_eq!(response.status, 301);
        assert_eq!(response.location.as_deref(), Some("https://example.com/"));
    }

    #[tokio::test]
    async fn test_follow_redirect_reaches_target() {
        let mut server = mockito::Server::new_async().await;
        let target = format!("{}/home", server.url());
        let _redirect = server
            .mock("GET", "/")
            .with_status(302)
            .with_header("location", &target)
            .create_async()
            .await;
        let _home = server
            .mock("GET", "/home")
            .with_status(200)
            .with_body("home")
            .create_async()
            .await;

        let response = fetcher()
            .fetch_with_timeout(&server.url(), FetchOptions::default())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.url, target);
        assert_eq!(response.body, "home");
    }

    #[tokio::test]
    async fn test_head_has_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("HEAD", "/favicon.ico")
            .with_status(200)
            .create_async()
            .await;

        let url = format!("{}/favicon.ico", server.url());
        let response = fetcher()
            .fetch_with_timeout(&url, FetchOptions::head())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let options = FetchOptions {
            timeout: Some(Duration::from_millis(200)),
            ..FetchOptions::default()
        };
        let url = format!("http://{addr}/");
        let err = fetcher().fetch_with_timeout(&url, options).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Timeout {
                url,
                timeout_ms: 200
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_text_swallows_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/llms.txt");
        assert!(fetcher().fetch_text(&url).await.is_none());

        let err = fetcher()
            .fetch_with_timeout(&url, FetchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }

    #[tokio::test]
    async fn test_fetch_text_keeps_error_statuses() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/sitemap.xml")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/sitemap.xml", server.url());
        let response = fetcher().fetch_text(&url).await.unwrap();
        assert_eq!(response.status, 404);
        assert!(!response.is_ok());
    }
}
