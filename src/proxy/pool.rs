use crate::config::{FetchConfig, ProxyConfig, TransportKind, DEFAULT_TOR_ADDRESS};
use crate::crawler::build_http_client;
use crate::proxy::route::{ProxyRoute, RouteHealth, RouteOutcome};
use crate::url::Scope;
use crate::FetchError;
use reqwest::Client;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Signalled when no route is healthy or degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no healthy or degraded proxy route available")]
pub struct PoolExhausted;

/// When routes change health and how long exhaustion is tolerated
#[derive(Debug, Clone, Copy)]
pub struct HealthThresholds {
    pub degraded_after: u32,
    pub banned_after: u32,
    pub exhaustion_grace: Duration,
    pub exhaustion_poll: Duration,
}

impl From<&ProxyConfig> for HealthThresholds {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            degraded_after: config.degraded_after,
            banned_after: config.banned_after,
            exhaustion_grace: Duration::from_secs(config.exhaustion_grace_secs),
            exhaustion_poll: Duration::from_millis(config.exhaustion_poll_ms),
        }
    }
}

/// A route handed out for one request attempt
///
/// Carries its own client handle so the request runs without holding the
/// pool lock. Dropping a lease without reporting leaves the route untouched.
#[derive(Debug, Clone)]
pub struct RouteLease {
    pub index: usize,
    pub id: String,
    pub client: Client,
}

#[derive(Debug)]
struct PoolInner {
    routes: Vec<ProxyRoute>,
    cursor: usize,
}

/// The set of egress routes available to a run
#[derive(Debug)]
pub struct ProxyPool {
    inner: Mutex<PoolInner>,
    clients: Vec<Client>,
    thresholds: HealthThresholds,
}

impl ProxyPool {
    /// Creates a pool from prepared routes and their clients
    ///
    /// `routes` and `clients` are paired by position.
    pub fn new(routes: Vec<(ProxyRoute, Client)>, thresholds: HealthThresholds) -> Self {
        let (routes, clients): (Vec<_>, Vec<_>) = routes.into_iter().unzip();
        Self {
            inner: Mutex::new(PoolInner { routes, cursor: 0 }),
            clients,
            thresholds,
        }
    }

    /// Builds one client per configured route
    ///
    /// With no routes configured the pool holds a single direct route. When
    /// `scope` is given, redirects leaving it are not followed.
    pub fn from_config(
        proxy: &ProxyConfig,
        fetch: &FetchConfig,
        scope: Option<&Scope>,
    ) -> Result<Self, reqwest::Error> {
        let entries: Vec<(TransportKind, Option<String>)> = if proxy.routes.is_empty() {
            vec![(TransportKind::Direct, None)]
        } else {
            proxy
                .routes
                .iter()
                .map(|entry| {
                    let address = match entry.kind {
                        TransportKind::Direct => None,
                        TransportKind::Tor => Some(
                            entry
                                .address
                                .clone()
                                .unwrap_or_else(|| DEFAULT_TOR_ADDRESS.to_string()),
                        ),
                        TransportKind::Socks => entry.address.clone(),
                    };
                    (entry.kind, address)
                })
                .collect()
        };

        let mut routes = Vec::with_capacity(entries.len());
        for (index, (kind, address)) in entries.into_iter().enumerate() {
            let client = build_http_client(address.as_deref(), fetch, scope)?;
            routes.push((ProxyRoute::new(index, kind, address), client));
        }

        tracing::info!("Proxy pool ready with {} route(s)", routes.len());
        Ok(Self::new(routes, HealthThresholds::from(proxy)))
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Picks the next route
    ///
    /// Healthy routes are served round-robin; degraded routes are used only
    /// when no healthy route remains. Selection performs no I/O.
    pub fn acquire_route(&self) -> Result<RouteLease, PoolExhausted> {
        let mut inner = self.lock();
        let count = inner.routes.len();
        if count == 0 {
            return Err(PoolExhausted);
        }

        for wanted in [RouteHealth::Healthy, RouteHealth::Degraded] {
            let start = inner.cursor;
            let found = (0..count)
                .map(|offset| (start + offset) % count)
                .find(|&i| inner.routes[i].health == wanted);

            if let Some(index) = found {
                inner.cursor = (index + 1) % count;
                return Ok(RouteLease {
                    index,
                    id: inner.routes[index].id.clone(),
                    client: self.clients[index].clone(),
                });
            }
        }

        Err(PoolExhausted)
    }

    /// Waits for a route, polling an exhausted pool until the grace period ends
    pub async fn wait_for_route(&self) -> Result<RouteLease, FetchError> {
        let started = Instant::now();
        let mut warned = false;

        loop {
            match self.acquire_route() {
                Ok(lease) => return Ok(lease),
                Err(PoolExhausted) => {
                    let waited = started.elapsed();
                    if waited >= self.thresholds.exhaustion_grace {
                        return Err(FetchError::ProxyExhausted {
                            waited_secs: waited.as_secs(),
                        });
                    }
                    if !warned {
                        tracing::warn!(
                            "Proxy pool exhausted; polling for up to {:?}",
                            self.thresholds.exhaustion_grace
                        );
                        warned = true;
                    }
                    let remaining = self.thresholds.exhaustion_grace - waited;
                    tokio::time::sleep(self.thresholds.exhaustion_poll.min(remaining)).await;
                }
            }
        }
    }

    /// Records the outcome of one attempt made through `lease`
    pub fn report(&self, lease: &RouteLease, outcome: RouteOutcome) {
        let mut inner = self.lock();
        let Some(route) = inner.routes.get_mut(lease.index) else {
            return;
        };

        if let Some(health) = route.apply(
            outcome,
            self.thresholds.degraded_after,
            self.thresholds.banned_after,
        ) {
            match health {
                RouteHealth::Healthy => tracing::info!("Route {} recovered", route.id),
                RouteHealth::Degraded => tracing::warn!(
                    "Route {} degraded after {} consecutive failures",
                    route.id,
                    route.consecutive_failures
                ),
                RouteHealth::Banned => tracing::warn!(
                    "Route {} banned after {} consecutive failures",
                    route.id,
                    route.consecutive_failures
                ),
            }
        }
    }

    /// Copy of the route table, banned routes included
    pub fn snapshot(&self) -> Vec<ProxyRoute> {
        self.lock().routes.clone()
    }
}
