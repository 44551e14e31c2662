//! Per-origin robots.txt cache
//!
//! Each origin's robots.txt is fetched at most once per run, through the
//! same proxy pool as every other request. Concurrent pipelines asking for
//! the same origin wait on a single fetch.

use crate::crawler::{FetchStatus, FetchTask, Fetcher};
use crate::extract::ContentKind;
use crate::robots::ParsedRobots;
use crate::FetchError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use url::Url;

#[derive(Debug, Default)]
pub struct RobotsCache {
    origins: Mutex<HashMap<String, Arc<OnceCell<ParsedRobots>>>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for the origin of `url`, fetching them on first use
    ///
    /// Only pool exhaustion is an error; any other failure to fetch
    /// robots.txt allows everything.
    pub async fn rules_for(
        &self,
        url: &Url,
        fetcher: &Fetcher,
    ) -> Result<ParsedRobots, FetchError> {
        let origin = url.origin().ascii_serialization();
        let cell = {
            let mut origins = self.origins.lock().await;
            origins.entry(origin.clone()).or_default().clone()
        };

        cell.get_or_try_init(|| fetch_robots(&origin, fetcher))
            .await
            .cloned()
    }
}

/// Fetches and parses `{origin}/robots.txt`
async fn fetch_robots(origin: &str, fetcher: &Fetcher) -> Result<ParsedRobots, FetchError> {
    let Ok(url) = Url::parse(&format!("{}/robots.txt", origin)) else {
        return Ok(ParsedRobots::allow_all());
    };

    tracing::debug!("Fetching {}", url);
    let result = fetcher.fetch(&FetchTask::new(url, 0, ContentKind::Text)).await;

    match result.status {
        FetchStatus::Fetched { .. } => Ok(ParsedRobots::from_content(&String::from_utf8_lossy(
            &result.body,
        ))),
        FetchStatus::Failed(e @ FetchError::ProxyExhausted { .. }) => Err(e),
        FetchStatus::Failed(e) => {
            tracing::debug!("No usable robots.txt for {}: {}", origin, e);
            Ok(ParsedRobots::allow_all())
        }
    }
}
