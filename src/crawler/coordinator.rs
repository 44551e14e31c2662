//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! a run, including:
//! - Seeding and owning the frontier
//! - Dispatching fetch-extract pipelines under a concurrency limit
//! - Feeding discovered links back into the frontier
//! - Handling the run timeout, cancellation and proxy exhaustion

use crate::aggregate::{Aggregator, ResultSet};
use crate::config::{resolve_target, validate, Config};
use crate::crawler::fetcher::{FetchStatus, FetchTask, Fetcher};
use crate::crawler::frontier::CrawlState;
use crate::crawler::parser::{parse_page, DiscoveredLink};
use crate::extract::{extract_emails, ContentKind};
use crate::output::RunStats;
use crate::proxy::ProxyPool;
use crate::robots::RobotsCache;
use crate::state::{AbortReason, PageState, RunState};
use crate::url::Scope;
use crate::{FetchError, HarvestError};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Upper bound on a robots.txt `Crawl-delay` we are willing to honour
const MAX_CRAWL_DELAY: Duration = Duration::from_secs(30);

/// Log progress every this many finished resources
const PROGRESS_INTERVAL: u64 = 10;

/// What a finished crawl hands to the exporter
#[derive(Debug)]
pub struct CrawlOutcome {
    pub target: Url,
    pub state: RunState,
    pub stats: RunStats,
    pub results: ResultSet,
}

/// Read-only state shared by every pipeline
struct PipelineContext {
    fetcher: Fetcher,
    aggregator: Arc<Aggregator>,
    robots: Option<RobotsCache>,
    scope: Scope,
    restrict_to_target: bool,
    delay_ms: [u64; 2],
}

/// What one pipeline reports back to the coordinator
#[derive(Debug)]
struct PageReport {
    url: Url,
    depth: u32,
    state: PageState,
    content: ContentKind,
    attempts: u32,
    links: Vec<DiscoveredLink>,
    new_addresses: usize,
    abort: Option<AbortReason>,
}

impl PageReport {
    fn new(task: &FetchTask, state: PageState) -> Self {
        Self {
            url: task.url.clone(),
            depth: task.depth,
            state,
            content: ContentKind::Unknown,
            attempts: 0,
            links: Vec::new(),
            new_addresses: 0,
            abort: None,
        }
    }

    fn aborted(task: &FetchTask, error: FetchError) -> Self {
        let mut report = Self::new(task, PageState::Unreachable);
        if let FetchError::ProxyExhausted { waited_secs } = error {
            report.abort = Some(AbortReason::ProxyExhausted { waited_secs });
        }
        report
    }
}

/// Main crawler structure
///
/// The crawler is the only writer of the frontier. Pipelines run as tasks
/// in a `JoinSet`, bounded by a semaphore; each returns a [`PageReport`]
/// whose links the loop enqueues.
pub struct Crawler {
    target: Url,
    context: Arc<PipelineContext>,
    frontier: CrawlState,
    state: RunState,
    stats: RunStats,
    max_concurrent: usize,
    run_timeout: Option<Duration>,
}

impl Crawler {
    /// Validates the configuration, builds the proxy pool and seeds the frontier
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        validate(&config)?;

        let target = resolve_target(&config.target.url)?;
        let scope = Scope::for_target(&target, config.target.include_subdomains)
            .ok_or_else(|| HarvestError::InvalidTarget(target.to_string()))?;

        let pool = Arc::new(ProxyPool::from_config(
            &config.proxy,
            &config.fetch,
            Some(&scope),
        )?);
        Self::with_pool(config, target, scope, pool)
    }

    /// Builds a crawler around an existing pool
    pub fn with_pool(
        config: Config,
        target: Url,
        scope: Scope,
        pool: Arc<ProxyPool>,
    ) -> Result<Self, HarvestError> {
        let context = PipelineContext {
            fetcher: Fetcher::new(pool, &config.fetch),
            aggregator: Arc::new(Aggregator::new()),
            robots: config.crawler.respect_robots.then(RobotsCache::new),
            scope,
            restrict_to_target: config.extract.restrict_to_target_domain,
            delay_ms: config.crawler.delay_ms,
        };

        let mut crawler = Self {
            target: target.clone(),
            context: Arc::new(context),
            frontier: CrawlState::new(config.crawler.max_depth, config.crawler.page_budget),
            state: RunState::Idle,
            stats: RunStats::new(),
            max_concurrent: config.crawler.max_concurrent_fetches.max(1) as usize,
            run_timeout: (config.crawler.run_timeout_secs > 0)
                .then(|| Duration::from_secs(config.crawler.run_timeout_secs)),
        };

        crawler.seed(target.clone());
        for path in &config.target.seed_paths {
            let seed = target
                .join(path)
                .map_err(|e| HarvestError::InvalidTarget(format!("{}: {}", path, e)))?;
            crawler.seed(seed);
        }

        if config.target.include_subdomains {
            for label in &config.target.seed_subdomains {
                let host = format!("{}.{}", label, crawler.context.scope.base());
                let seed = Url::parse(&format!("{}://{}/", target.scheme(), host))
                    .map_err(|e| HarvestError::InvalidTarget(format!("{}: {}", host, e)))?;
                crawler.seed(seed);
            }
        }

        Ok(crawler)
    }

    /// Queues a depth-0 task
    fn seed(&mut self, url: Url) {
        let hint = ContentKind::from_path(url.path()).unwrap_or(ContentKind::Html);
        let task = FetchTask::new(url, 0, hint);
        let shown = task.url.to_string();
        match self.frontier.enqueue(task) {
            Ok(()) => tracing::debug!("Seeded {}", shown),
            Err(rejection) => tracing::debug!("Seed {} not queued: {:?}", shown, rejection),
        }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Shared handle on the result store; addresses appear as they are found
    pub fn aggregator(&self) -> Arc<Aggregator> {
        self.context.aggregator.clone()
    }

    /// Runs to completion with no external cancellation
    pub async fn run(self) -> CrawlOutcome {
        self.run_until(std::future::pending()).await
    }

    /// Runs the main crawl loop until the frontier drains, the run timeout
    /// fires, the pool is exhausted, or `shutdown` resolves
    pub async fn run_until<F>(mut self, shutdown: F) -> CrawlOutcome
    where
        F: Future<Output = ()>,
    {
        self.state.start();
        let started = Instant::now();
        tracing::info!(
            "Starting harvest of {} (scope {}, {} pipelines)",
            self.target,
            self.context.scope.base(),
            self.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut in_flight: JoinSet<PageReport> = JoinSet::new();

        let run_timeout = self.run_timeout;
        let timeout = async move {
            match run_timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timeout);
        tokio::pin!(shutdown);

        let abort = loop {
            while let Ok(permit) = semaphore.clone().try_acquire_owned() {
                let Some(task) = self.frontier.next_task() else {
                    break;
                };
                let context = self.context.clone();
                in_flight.spawn(async move {
                    let report = process(task, &context).await;
                    drop(permit);
                    report
                });
            }

            if in_flight.is_empty() {
                tracing::info!("Frontier is empty, crawl complete");
                break None;
            }

            tokio::select! {
                joined = in_flight.join_next() => match joined {
                    Some(Ok(report)) => {
                        if let Some(reason) = self.absorb(report, in_flight.len()) {
                            break Some(reason);
                        }
                    }
                    Some(Err(e)) => tracing::error!("Pipeline task failed: {}", e),
                    None => {}
                },
                _ = &mut timeout => {
                    tracing::warn!(
                        "Run timeout reached with {} pipelines in flight and {} queued",
                        in_flight.len(),
                        self.frontier.pending_len()
                    );
                    self.stats.timed_out = true;
                    break None;
                }
                _ = &mut shutdown => {
                    tracing::warn!("Shutdown requested");
                    break Some(AbortReason::Cancelled);
                }
            }
        };

        in_flight.abort_all();
        while in_flight.join_next().await.is_some() {}

        match abort {
            Some(reason) => {
                tracing::error!("Run aborted: {}", reason);
                self.state.abort(reason);
            }
            None => {
                self.state.finish();
            }
        }

        let results = self.context.aggregator.snapshot();
        self.stats.addresses_found = results.len() as u64;

        tracing::info!(
            "Harvest {} in {:?}: {} visited, {} failed, {} addresses",
            self.state,
            started.elapsed(),
            self.stats.pages_visited,
            self.stats.pages_failed,
            self.stats.addresses_found
        );

        CrawlOutcome {
            target: self.target,
            state: self.state,
            stats: self.stats,
            results,
        }
    }

    /// Folds one pipeline result into the run; returns an abort reason if the
    /// run must stop
    fn absorb(&mut self, report: PageReport, in_flight: usize) -> Option<AbortReason> {
        if let Some(reason) = report.abort {
            return Some(reason);
        }

        tracing::debug!(
            "{} {} (depth {}, {}, {} new addresses)",
            report.state,
            report.url,
            report.depth,
            report.content,
            report.new_addresses
        );
        self.stats
            .record_page(report.state, report.content, report.attempts);

        for link in report.links {
            self.enqueue_link(link, report.depth + 1);
        }

        if self.stats.pages_visited % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} visited, {} queued, {} in flight, {} addresses ({} of budget left)",
                self.stats.pages_visited,
                self.frontier.pending_len(),
                in_flight,
                self.context.aggregator.len(),
                self.frontier.budget_remaining()
            );
        }

        None
    }

    fn enqueue_link(&mut self, link: DiscoveredLink, depth: u32) {
        let url = match Url::parse(&link.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Failed to parse URL {}: {}", link.url, e);
                return;
            }
        };

        if !self.context.scope.contains(&url) {
            tracing::trace!("Out of scope: {}", url);
            return;
        }

        if let Err(rejection) = self.frontier.enqueue(FetchTask::new(url, depth, link.hint)) {
            tracing::trace!("Not queued ({:?}): {}", rejection, link.url);
        }
    }
}

/// One fetch-extract pipeline: robots check, fetch, extract, discover links
async fn process(task: FetchTask, context: &PipelineContext) -> PageReport {
    let user_agent = context.fetcher.primary_user_agent();
    let mut crawl_delay = None;

    if let Some(robots) = &context.robots {
        match robots.rules_for(&task.url, &context.fetcher).await {
            Ok(rules) => {
                if !rules.is_allowed(task.url.as_str(), user_agent) {
                    tracing::info!("URL {} disallowed by robots.txt", task.url);
                    return PageReport::new(&task, PageState::Disallowed);
                }
                crawl_delay = rules.crawl_delay(user_agent);
            }
            Err(e) => return PageReport::aborted(&task, e),
        }
    }

    let result = context.fetcher.fetch(&task).await;

    let mut report = match &result.status {
        FetchStatus::Failed(e @ FetchError::ProxyExhausted { .. }) => {
            return PageReport::aborted(&task, e.clone());
        }
        FetchStatus::Failed(e) => PageReport::new(&task, PageState::from_fetch_error(e)),
        FetchStatus::Fetched { .. } => {
            let mut report = PageReport::new(&task, PageState::Processed);
            report.content = result.content;

            match extract_emails(&result.body, result.content, task.url.as_str()) {
                Ok(emails) => {
                    for email in emails.iter().filter(|e| context.keeps(&e.address)) {
                        if context.aggregator.record_email(email) {
                            report.new_addresses += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", task.url, e);
                    report.state = PageState::Malformed;
                }
            }

            if result.content == ContentKind::Html {
                let html = String::from_utf8_lossy(&result.body);
                report.links = parse_page(&html, &result.final_url).links;
            }
            report
        }
    };
    report.attempts = result.attempts;

    let pause = context.pause(crawl_delay);
    if !pause.is_zero() {
        tokio::time::sleep(pause).await;
    }

    report
}

impl PipelineContext {
    /// Applies the optional target-domain restriction
    fn keeps(&self, address: &str) -> bool {
        if !self.restrict_to_target {
            return true;
        }
        address
            .rsplit_once('@')
            .is_some_and(|(_, domain)| self.scope.owns_email_domain(domain))
    }

    /// Politeness pause after a fetch: random within `delay-ms`, but never
    /// shorter than the host's `Crawl-delay`
    fn pause(&self, crawl_delay: Option<f64>) -> Duration {
        let [min, max] = self.delay_ms;
        let configured = if max > min {
            Duration::from_millis(rand::thread_rng().gen_range(min..=max))
        } else {
            Duration::from_millis(min)
        };

        let requested = crawl_delay
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(|secs| Duration::from_secs_f64(secs).min(MAX_CRAWL_DELAY))
            .unwrap_or(Duration::ZERO);

        configured.max(requested)
    }
}
