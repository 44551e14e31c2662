use crate::config::TransportKind;
use std::fmt;

/// Health of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteHealth {
    /// Preferred for selection
    Healthy,
    /// Used only when no healthy route is left
    Degraded,
    /// Never selected again in this run; kept for diagnostics
    Banned,
}

impl fmt::Display for RouteHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Banned => write!(f, "banned"),
        }
    }
}

/// What happened when a route was used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The request went through; the server's answer does not matter
    Success,
    /// Timeout, connection reset, SOCKS handshake failure
    Failure,
    /// The server explicitly refused this egress (403/429)
    Blocked,
}

/// One egress path a fetch may use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    /// Stable identifier, e.g. `direct#0` or `tor#1@127.0.0.1:9050`
    pub id: String,

    pub kind: TransportKind,

    /// `host:port` of the SOCKS endpoint, if any
    pub address: Option<String>,

    pub health: RouteHealth,

    pub consecutive_failures: u32,

    pub total_requests: u64,

    pub total_failures: u64,
}

impl ProxyRoute {
    /// Creates a healthy route
    pub fn new(index: usize, kind: TransportKind, address: Option<String>) -> Self {
        let label = match kind {
            TransportKind::Direct => "direct",
            TransportKind::Socks => "socks",
            TransportKind::Tor => "tor",
        };
        let id = match &address {
            Some(addr) => format!("{}#{}@{}", label, index, addr),
            None => format!("{}#{}", label, index),
        };

        Self {
            id,
            kind,
            address,
            health: RouteHealth::Healthy,
            consecutive_failures: 0,
            total_requests: 0,
            total_failures: 0,
        }
    }

    /// Applies an outcome and returns the new health if it changed
    ///
    /// A route reaching `degraded_after` consecutive failures is degraded and
    /// banned at `banned_after`. A success clears the failure streak and
    /// restores a degraded route. Banned routes never recover.
    pub fn apply(
        &mut self,
        outcome: RouteOutcome,
        degraded_after: u32,
        banned_after: u32,
    ) -> Option<RouteHealth> {
        self.total_requests += 1;
        let before = self.health;

        if self.health == RouteHealth::Banned {
            if outcome != RouteOutcome::Success {
                self.total_failures += 1;
            }
            return None;
        }

        match outcome {
            RouteOutcome::Success => {
                self.consecutive_failures = 0;
                self.health = RouteHealth::Healthy;
            }
            RouteOutcome::Failure | RouteOutcome::Blocked => {
                self.total_failures += 1;
                self.consecutive_failures += 1;
                if self.consecutive_failures >= banned_after {
                    self.health = RouteHealth::Banned;
                } else if self.consecutive_failures >= degraded_after {
                    self.health = RouteHealth::Degraded;
                }
            }
        }

        (self.health != before).then_some(self.health)
    }
}
