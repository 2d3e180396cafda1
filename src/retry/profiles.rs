//! Named policy presets for common dependency classes.
//!
//! Presets are ordinary [`RetryPolicy`] values; every field can still be
//! overridden with the `with_*` builders.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::policy::RetryPolicy;
use crate::error::ConfigError;

impl RetryPolicy {
    /// Database calls: few attempts, short delays.
    ///
    /// 3 attempts, 500ms base delay doubling up to 5s, jittered.
    ///
    /// ```rust
    /// use breakwater::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::database();
    /// assert_eq!(policy.max_attempts(), 3);
    /// assert_eq!(policy.backoff().max_delay, Duration::from_secs(5));
    /// ```
    pub fn database() -> Self {
        Self::new()
            .with_max_attempts(3)
            .with_base_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(5))
            .with_exponential_base(2.0)
            .with_jitter()
    }

    /// External HTTP APIs: more attempts, a long ceiling and a bounded attempt time.
    ///
    /// 5 attempts, 1s base delay doubling up to 60s, jittered, 30s per attempt.
    pub fn external_api() -> Self {
        Self::new()
            .with_max_attempts(5)
            .with_base_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(60))
            .with_exponential_base(2.0)
            .with_jitter()
            .with_timeout(Duration::from_secs(30))
    }

    /// LLM calls: moderate attempts with a gentler multiplier.
    ///
    /// 3 attempts, 2s base delay growing by 1.5x up to 30s, jittered.
    pub fn llm() -> Self {
        Self::new()
            .with_max_attempts(3)
            .with_base_delay(Duration::from_secs(2))
            .with_max_delay(Duration::from_secs(30))
            .with_exponential_base(1.5)
            .with_jitter()
    }
}

/// A named preset, for selecting a policy from configuration.
///
/// ```rust
/// use breakwater::{Profile, RetryPolicy};
///
/// let profile: Profile = "external_api".parse().unwrap();
/// assert_eq!(profile.policy(), RetryPolicy::external_api());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Profile {
    /// [`RetryPolicy::database`].
    Database,
    /// [`RetryPolicy::external_api`].
    ExternalApi,
    /// [`RetryPolicy::llm`].
    Llm,
}

impl Profile {
    /// Every preset.
    pub const ALL: [Profile; 3] = [Profile::Database, Profile::ExternalApi, Profile::Llm];

    /// Build the preset's policy.
    pub fn policy(self) -> RetryPolicy {
        match self {
            Profile::Database => RetryPolicy::database(),
            Profile::ExternalApi => RetryPolicy::external_api(),
            Profile::Llm => RetryPolicy::llm(),
        }
    }

    /// The preset's configuration name.
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Database => "database",
            Profile::ExternalApi => "external_api",
            Profile::Llm => "llm",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names match [`Profile::as_str`] exactly, the same spelling serde accepts.
impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownProfile(s.to_string()))
    }
}

impl From<Profile> for RetryPolicy {
    fn from(profile: Profile) -> Self {
        profile.policy()
    }
}
