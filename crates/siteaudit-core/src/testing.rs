//! Canned-response fetcher for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::FetchError;
use crate::fetch::{Fetch, FetchMethod, FetchOptions, FetchResponse, RedirectMode};

type Key = (FetchMethod, RedirectMode, String);

/// Answers registered requests; everything else fails like a refused connection.
#[derive(Default)]
pub struct StubFetcher {
    responses: HashMap<Key, FetchResponse>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Followed GET
    pub fn page(self, url: &str, status: u16, body: &str) -> Self {
        self.page_with_elapsed(url, status, body, 0)
    }

    pub fn page_with_elapsed(self, url: &str, status: u16, body: &str, elapsed_ms: u64) -> Self {
        self.insert(FetchMethod::Get, RedirectMode::Follow, url, status, None, body, elapsed_ms)
    }

    /// GET with manual redirect handling
    pub fn page_manual(self, url: &str, status: u16, body: &str) -> Self {
        self.insert(FetchMethod::Get, RedirectMode::Manual, url, status, None, body, 0)
    }

    /// Manual-redirect GET answering with a `Location` header
    pub fn redirect(self, url: &str, status: u16, location: &str) -> Self {
        self.insert(
            FetchMethod::Get,
            RedirectMode::Manual,
            url,
            status,
            Some(location),
            "",
            0,
        )
    }

    pub fn head(self, url: &str, status: u16) -> Self {
        self.insert(FetchMethod::Head, RedirectMode::Follow, url, status, None, "", 0)
    }

    /// URLs requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    #[allow(clippy::too_many_arguments)]
    fn insert(
        mut self,
        method: FetchMethod,
        redirect: RedirectMode,
        url: &str,
        status: u16,
        location: Option<&str>,
        body: &str,
        elapsed_ms: u64,
    ) -> Self {
        self.responses.insert(
            (method, redirect, url.to_string()),
            FetchResponse {
                url: url.to_string(),
                status,
                location: location.map(str::to_owned),
                body: body.to_string(),
                elapsed: Duration::from_millis(elapsed_ms),
            },
        );
        self
    }
}

#[async_trait]
impl Fetch for StubFetcher {
    async fn fetch_with_timeout(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<FetchResponse, FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }

        self.responses
            .get(&(options.method, options.redirect, url.to_string()))
            .cloned()
            .ok_or_else(|| FetchError::Request {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}
