//! Failure classification.
//!
//! Retry and circuit-breaker decisions operate on data rather than on error
//! type hierarchies: every failure an operation produces is mapped to a
//! [`FailureKind`] through the [`Classify`] trait, and policies match on
//! those kinds.
//!
//! # Example
//!
//! ```rust
//! use breakwater::{Classify, FailureKind};
//!
//! #[derive(Debug)]
//! enum DbError {
//!     ConnectionReset,
//!     UniqueViolation,
//! }
//!
//! impl Classify for DbError {
//!     fn kind(&self) -> FailureKind {
//!         match self {
//!             DbError::ConnectionReset => FailureKind::new("connection"),
//!             DbError::UniqueViolation => FailureKind::new("constraint"),
//!         }
//!     }
//! }
//!
//! assert_eq!(DbError::ConnectionReset.kind(), FailureKind::new("connection"));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The classification tag of a failure.
///
/// Kinds are compared by name. A handful of well-known kinds are provided as
/// constants; anything else is created with [`FailureKind::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FailureKind(Cow<'static, str>);

impl FailureKind {
    /// An attempt exceeded its per-attempt timeout.
    pub const TIMEOUT: FailureKind = FailureKind(Cow::Borrowed("timeout"));
    /// The process ran out of memory. Fatal: never retried.
    pub const OUT_OF_MEMORY: FailureKind = FailureKind(Cow::Borrowed("out_of_memory"));
    /// The process was interrupted from outside (signal, shutdown). Fatal: never retried.
    pub const INTERRUPTED: FailureKind = FailureKind(Cow::Borrowed("interrupted"));
    /// Fallback kind for failures that carry no better classification.
    pub const UNCLASSIFIED: FailureKind = FailureKind(Cow::Borrowed("unclassified"));

    /// Kinds that always propagate immediately, whatever the policy's lists say.
    pub const FATAL: [FailureKind; 2] = [Self::OUT_OF_MEMORY, Self::INTERRUPTED];

    /// Create a kind from a name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The kind's name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for process-level conditions that must never be retried.
    pub fn is_fatal(&self) -> bool {
        Self::FATAL.contains(self)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for FailureKind {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FailureKind {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Maps a failure to the [`FailureKind`] used by retry and breaker decisions.
pub trait Classify {
    /// The classification of this failure.
    fn kind(&self) -> FailureKind;
}

impl<T: Classify + ?Sized> Classify for &T {
    fn kind(&self) -> FailureKind {
        (**self).kind()
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    fn kind(&self) -> FailureKind {
        (**self).kind()
    }
}

impl Classify for FailureKind {
    fn kind(&self) -> FailureKind {
        self.clone()
    }
}

impl Classify for std::io::Error {
    fn kind(&self) -> FailureKind {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::TimedOut => FailureKind::TIMEOUT,
            ErrorKind::OutOfMemory => FailureKind::OUT_OF_MEMORY,
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe => FailureKind::new("connection"),
            ErrorKind::NotFound => FailureKind::new("not_found"),
            ErrorKind::PermissionDenied => FailureKind::new("permission_denied"),
            ErrorKind::InvalidInput | ErrorKind::InvalidData => FailureKind::new("invalid_input"),
            _ => FailureKind::new("io"),
        }
    }
}

/// A ready-made classified error for callers that don't have their own.
///
/// Carries a kind, a message and an optional underlying cause. Cloning shares
/// the cause.
///
/// ```rust
/// use breakwater::{Classify, Failure, FailureKind};
///
/// let err = Failure::new("rate_limited", "429 from upstream");
/// assert_eq!(err.kind(), FailureKind::new("rate_limited"));
/// assert_eq!(err.to_string(), "rate_limited: 429 from upstream");
/// ```
#[derive(Debug, Clone)]
pub struct Failure {
    kind: FailureKind,
    message: String,
    source: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Failure {
    /// Create a failure of the given kind.
    pub fn new(kind: impl Into<FailureKind>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        self.source = Some(Arc::from(source.into()));
        self
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Classify for Failure {
    fn kind(&self) -> FailureKind {
        self.kind.clone()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// The outcome of a single failed attempt: either the operation's own error
/// or the per-attempt timeout firing first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError<E> {
    /// The attempt did not finish within the per-attempt timeout.
    Timeout {
        /// The timeout that was exceeded.
        duration: Duration,
    },
    /// The operation returned an error.
    Failed(E),
}

impl<E> AttemptError<E> {
    /// Returns true if the attempt timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The operation's error, if the attempt didn't time out.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Timeout { .. } => None,
        }
    }

    /// Borrow the operation's error, if any.
    pub fn inner(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Timeout { .. } => None,
        }
    }
}

impl<E: Classify> Classify for AttemptError<E> {
    fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::TIMEOUT,
            Self::Failed(e) => e.kind(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { duration } => write!(f, "attempt timed out after {:?}", duration),
            Self::Failed(e) => write!(f, "{}", e),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for AttemptError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timeout { .. } => None,
            Self::Failed(e) => Some(e),
        }
    }
}
