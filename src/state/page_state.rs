/// Page state definitions for tracking fetch outcomes
///
/// Every dispatched URL ends in exactly one of these states.
use crate::FetchError;
use std::fmt;

/// Represents the final state of a resource after its fetch-extract pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Success States =====
    /// Resource was fetched and its content handed to the extractor
    Processed,

    /// Resource was fetched but the extractor rejected it as malformed
    Malformed,

    // ===== Skip States =====
    /// URL is disallowed by the host's robots.txt
    Disallowed,

    // ===== Error States =====
    /// Server answered 404 or 410
    DeadLink,

    /// Server answered 401, 403 or 429 (explicit block)
    Blocked,

    /// Other permanent HTTP failure (remaining 4xx)
    Failed,

    /// Every attempt ended in a transient failure
    Unreachable,
}

impl PageState {
    /// Maps a terminal fetch error to the page state it produces
    pub fn from_fetch_error(error: &FetchError) -> Self {
        match error {
            FetchError::Permanent { status_code, .. } => match status_code {
                404 | 410 => Self::DeadLink,
                401 | 403 | 429 => Self::Blocked,
                _ => Self::Failed,
            },
            FetchError::Transient { .. } | FetchError::ProxyExhausted { .. } => Self::Unreachable,
        }
    }

    /// Returns true if the resource content was retrieved
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed | Self::Malformed)
    }

    /// Returns true if the URL was deliberately not fetched
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Disallowed)
    }

    /// Returns true if fetching the resource failed
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::DeadLink | Self::Blocked | Self::Failed | Self::Unreachable
        )
    }

    /// Short machine-friendly name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Malformed => "malformed",
            Self::Disallowed => "disallowed",
            Self::DeadLink => "dead_link",
            Self::Blocked => "blocked",
            Self::Failed => "failed",
            Self::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permanent(status_code: u16) -> FetchError {
        FetchError::Permanent {
            url: "https://example.com/x".to_string(),
            status_code,
        }
    }

    #[test]
    fn test_from_fetch_error() {
        assert_eq!(PageState::from_fetch_error(&permanent(404)), PageState::DeadLink);
        assert_eq!(PageState::from_fetch_error(&permanent(410)), PageState::DeadLink);
        assert_eq!(PageState::from_fetch_error(&permanent(403)), PageState::Blocked);
        assert_eq!(PageState::from_fetch_error(&permanent(429)), PageState::Blocked);
        assert_eq!(PageState::from_fetch_error(&permanent(400)), PageState::Failed);

        let transient = FetchError::Transient {
            url: "https://example.com/".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(PageState::from_fetch_error(&transient), PageState::Unreachable);
    }

    #[test]
    fn test_classification_is_exclusive() {
        for state in [
            PageState::Processed,
            PageState::Malformed,
            PageState::Disallowed,
            PageState::DeadLink,
            PageState::Blocked,
            PageState::Failed,
            PageState::Unreachable,
        ] {
            let flags = [state.is_success(), state.is_skipped(), state.is_error()];
            assert_eq!(
                flags.iter().filter(|f| **f).count(),
                1,
                "{} must be in exactly one class",
                state
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PageState::Processed), "processed");
        assert_eq!(format!("{}", PageState::DeadLink), "dead_link");
    }
}
