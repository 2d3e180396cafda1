//! The fast-fail error raised by an open breaker.

use std::sync::Arc;
use std::time::Duration;

use super::CircuitState;

/// Error returned when a circuit breaker denies a call.
///
/// The protected operation was not invoked for this gate check, so there is no
/// underlying failure to report; the breaker's state is carried instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitOpen {
    /// Name of the breaker that refused the call.
    pub name: Arc<str>,
    /// Breaker state at the time of the refusal.
    pub state: CircuitState,
    /// Qualifying failures counted by the breaker.
    pub failure_count: u32,
    /// Remaining cooldown before the breaker lets a probe through.
    pub retry_after: Option<Duration>,
    /// Invocations already made by the refused call before the breaker opened.
    pub attempts: u32,
}

impl std::fmt::Display for CircuitOpen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "circuit '{}' is {} after {} failures",
            self.name, self.state, self.failure_count
        )?;
        if let Some(after) = self.retry_after {
            write!(f, ", retry after {:?}", after)?;
        }
        Ok(())
    }
}

impl std::error::Error for CircuitOpen {}
