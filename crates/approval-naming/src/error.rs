//! Error types for approval naming
//!
//! Provides error handling for:
//! - Qualifiers that cannot classify the host environment
//! - Caller mistakes (empty scenario labels, unknown custom qualifiers)
//! - Scope stack misuse (double release, foreign release, leaks)
//! - Base identity resolution failures

use crate::scope::ScopeId;

/// Where users can report an unclassified environment
pub const ISSUE_TRACKER: &str = concat!(env!("CARGO_PKG_REPOSITORY"), "/issues/new");

/// Main naming error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NamingError {
    /// A qualifier cannot classify the current environment
    #[error(
        "the {qualifier} qualifier does not recognize this environment\n\
         detected: {detected}\n\
         to use the raw description instead, pass `FailureMode::BestEffort` \
         or set APPROVAL_NAMING_FAILURE_MODE=best-effort\n\
         to get it supported, open an issue at {tracker} including the detected value",
        tracker = ISSUE_TRACKER
    )]
    UnsupportedEnvironment {
        /// Qualifier that failed
        qualifier: &'static str,
        /// Raw value read from the host
        detected: String,
    },

    /// Scenario qualifier requested without any label
    #[error("scenario qualifier needs at least one label")]
    InvalidScenarioLabel,

    /// Scope stack misuse
    #[error("scope misuse: {0}")]
    ScopeMisuse(#[from] ScopeMisuseError),

    /// No custom qualifier registered under this name
    #[error("no qualifier registered as `{name}`")]
    UnknownQualifier {
        /// Requested name
        name: String,
    },

    /// A qualifier function produced an empty value
    #[error("qualifier `{kind}` produced an empty value")]
    EmptyQualifier {
        /// Qualifier kind or registered name
        kind: String,
    },

    /// No call-stack frame or thread name identifies the running test
    #[error(
        "cannot determine the running test: no user frame in the backtrace and \
         the thread is unnamed; build tests with debug info or use `with_base_name`"
    )]
    BaseIdentityUnavailable,

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

impl NamingError {
    /// Whether this error reports a bug in the calling test
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidScenarioLabel | Self::ScopeMisuse(_) | Self::UnknownQualifier { .. }
        )
    }
}

/// Scope stack misuse
///
/// Each of these indicates a test-authoring bug that would otherwise corrupt
/// the names composed by later tests on the same thread.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeMisuseError {
    /// The scope was already released
    #[error("scope {scope} was already released")]
    AlreadyReleased {
        /// Released scope
        scope: ScopeId,
    },

    /// The scope belongs to another execution context
    #[error("scope {scope} belongs to another thread")]
    ForeignContext {
        /// Foreign scope
        scope: ScopeId,
    },

    /// The scope was never issued on this thread
    #[error("scope {scope} was never entered on this thread")]
    UnknownScope {
        /// Unknown scope
        scope: ScopeId,
    },

    /// Qualifiers remain on the stack when it should be empty
    #[error("{} qualifier(s) still active: {}", .remaining.len(), .remaining.join(", "))]
    Leaked {
        /// Values still on the stack, oldest first
        remaining: Vec<String>,
    },
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, NamingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_environment_message_is_actionable() {
        let err = NamingError::UnsupportedEnvironment {
            qualifier: "runtime",
            detected: "rustc 1.80.0-beta.2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("rustc 1.80.0-beta.2"));
        assert!(msg.contains("FailureMode::BestEffort"));
        assert!(msg.contains(ISSUE_TRACKER));
    }

    #[test]
    fn leaked_lists_values() {
        let err = ScopeMisuseError::Leaked {
            remaining: vec!["ForScenario.a".into(), "ForUser.b".into()],
        };
        assert_eq!(
            err.to_string(),
            "2 qualifier(s) still active: ForScenario.a, ForUser.b"
        );
    }
}
