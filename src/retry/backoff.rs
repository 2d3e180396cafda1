//! Backoff delay calculation.

use std::time::Duration;

use rand::Rng;

/// Proportional jitter applied when jitter is enabled: ±25% of the raw delay.
pub const DEFAULT_JITTER: f64 = 0.25;

/// Exponential backoff: `base_delay * exponential_base^(attempt - 1)`, capped at
/// `max_delay`, optionally perturbed by jitter.
///
/// Pure data. Cloning is cheap and a `Backoff` can be shared freely.
///
/// # Examples
///
/// ```rust
/// use breakwater::retry::Backoff;
/// use std::time::Duration;
///
/// let backoff = Backoff::new(Duration::from_millis(100), 2.0, Duration::from_millis(500));
///
/// assert_eq!(backoff.delay(1), Duration::from_millis(100));
/// assert_eq!(backoff.delay(2), Duration::from_millis(200));
/// assert_eq!(backoff.delay(3), Duration::from_millis(400));
/// assert_eq!(backoff.delay(4), Duration::from_millis(500)); // capped
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Backoff {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied per attempt.
    pub exponential_base: f64,
    /// Ceiling on the un-jittered delay.
    pub max_delay: Duration,
    /// Randomization applied after capping.
    pub jitter: JitterStrategy,
}

/// Strategy for adding randomness to delays.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JitterStrategy {
    /// No jitter applied.
    #[default]
    None,
    /// Add a uniform offset of up to ±factor of the delay.
    Proportional(f64),
}

impl Backoff {
    /// Create a backoff without jitter.
    pub fn new(base_delay: Duration, exponential_base: f64, max_delay: Duration) -> Self {
        Self {
            base_delay,
            exponential_base,
            max_delay,
            jitter: JitterStrategy::None,
        }
    }

    /// Enable ±25% jitter.
    pub fn with_jitter(mut self) -> Self {
        self.jitter = JitterStrategy::Proportional(DEFAULT_JITTER);
        self
    }

    /// Set an explicit jitter strategy.
    pub fn with_jitter_strategy(mut self, jitter: JitterStrategy) -> Self {
        self.jitter = jitter;
        self
    }

    /// The capped delay before retry number `attempt` (1-indexed), before jitter.
    ///
    /// `attempt` 0 is treated as 1.
    pub fn raw_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.exponential_base.powi(exponent);
        let max_nanos = self.max_delay.as_nanos() as f64;
        let nanos = self.base_delay.as_nanos() as f64 * factor;

        // 0 * inf only happens for a zero base delay.
        let capped = if nanos.is_nan() {
            0.0
        } else {
            nanos.clamp(0.0, max_nanos)
        };

        nanos_to_duration(capped)
    }

    /// The delay before retry number `attempt` (1-indexed), jitter included.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.jitter.apply(self.raw_delay(attempt))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 2.0, Duration::from_secs(60)).with_jitter()
    }
}

impl JitterStrategy {
    /// Apply jitter to an already capped delay.
    ///
    /// The result lies in `[delay * (1 - factor), delay * (1 + factor)]`, floored at
    /// zero. It is not re-capped, so a jittered delay may exceed `max_delay` by up
    /// to the jitter factor.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterStrategy::None => delay,
            JitterStrategy::Proportional(factor) => {
                let factor = factor.clamp(0.0, 1.0);
                let nanos = delay.as_nanos() as f64;
                let spread = nanos * factor;
                if spread.is_nan() || spread <= 0.0 {
                    return delay;
                }
                let min = (nanos - spread).max(0.0);
                let max = nanos + spread;
                let jittered = rand::rng().random_range(min..=max);
                nanos_to_duration(jittered)
            }
        }
    }

    /// The jitter factor, zero when disabled.
    pub fn factor(&self) -> f64 {
        match self {
            JitterStrategy::None => 0.0,
            JitterStrategy::Proportional(factor) => *factor,
        }
    }
}

fn nanos_to_duration(nanos: f64) -> Duration {
    let nanos = nanos.round();
    if nanos >= u64::MAX as f64 {
        Duration::from_nanos(u64::MAX)
    } else {
        Duration::from_nanos(nanos as u64)
    }
}
