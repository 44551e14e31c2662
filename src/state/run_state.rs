use std::fmt;

/// Why a run ended in `Aborted`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// No usable proxy route for longer than the configured grace period
    ProxyExhausted { waited_secs: u64 },

    /// The run was cancelled from outside (e.g. Ctrl-C)
    Cancelled,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProxyExhausted { waited_secs } => {
                write!(f, "proxy pool exhausted for {}s", waited_secs)
            }
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Lifecycle of a single harvest run
///
/// ```text
/// Idle --start--> Running --finish--> Completed
///                    |
///                    +----abort-----> Aborted
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Aborted(AbortReason),
}

impl RunState {
    /// Idle → Running. Returns false if the transition is not allowed.
    pub fn start(&mut self) -> bool {
        if *self == Self::Idle {
            *self = Self::Running;
            true
        } else {
            false
        }
    }

    /// Running → Completed
    pub fn finish(&mut self) -> bool {
        if *self == Self::Running {
            *self = Self::Completed;
            true
        } else {
            false
        }
    }

    /// Running → Aborted
    pub fn abort(&mut self, reason: AbortReason) -> bool {
        if *self == Self::Running {
            *self = Self::Aborted(reason);
            true
        } else {
            false
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Aborted(reason) => write!(f, "aborted ({})", reason),
        }
    }
}
