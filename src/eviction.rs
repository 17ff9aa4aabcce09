//! Eviction policies for idle pool objects

use std::time::Duration;
use tokio::time::Instant;

/// What makes an idle object eligible for eviction by the lifetime sweep
///
/// The sweep only runs when a lifetime is configured, so neither policy
/// evicts anything in a pool with unlimited lifetime.
///
/// # Examples
///
/// ```
/// use esox_managedpool::{EvictionPolicy, PoolConfiguration};
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_lifetime(Duration::from_secs(60), Duration::from_secs(5))
///     .with_eviction_policy(EvictionPolicy::LifetimeOnly);
///
/// assert_eq!(config.eviction_policy, EvictionPolicy::LifetimeOnly);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvictionPolicy {
    /// Evict when the idle lifetime has expired or the object reports itself inactive
    #[default]
    LifetimeAndLiveness,

    /// Evict only when the idle lifetime has expired
    LifetimeOnly,
}

impl EvictionPolicy {
    pub(crate) fn checks_liveness(self) -> bool {
        matches!(self, EvictionPolicy::LifetimeAndLiveness)
    }
}

/// Idle-time bookkeeping for a single object
#[derive(Debug, Clone, Copy)]
pub(crate) struct IdleClock {
    pub released_at: Instant,
}

impl IdleClock {
    pub fn new() -> Self {
        Self {
            released_at: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.released_at = Instant::now();
    }

    /// `None` lifetime never expires. Measures elapsed idle time rather than
    /// a deadline, so huge lifetimes cannot overflow `Instant`.
    pub fn is_expired(&self, lifetime: Option<Duration>, now: Instant) -> bool {
        match lifetime {
            None => false,
            Some(lifetime) => now.saturating_duration_since(self.released_at) >= lifetime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_lifetime_never_expires() {
        let clock = IdleClock::new();
        let far_future = clock.released_at + Duration::from_secs(86_400);
        assert!(!clock.is_expired(None, far_future));
    }

    #[test]
    fn expires_once_lifetime_has_passed() {
        let clock = IdleClock::new();
        let lifetime = Some(Duration::from_millis(10));
        assert!(!clock.is_expired(lifetime, clock.released_at + Duration::from_millis(9)));
        assert!(clock.is_expired(lifetime, clock.released_at + Duration::from_millis(10)));
    }

    #[test]
    fn maximal_lifetime_never_expires() {
        let clock = IdleClock::new();
        let lifetime = Some(Duration::MAX);
        assert!(!clock.is_expired(lifetime, clock.released_at + Duration::from_secs(86_400)));
    }

    #[test]
    fn now_before_release_is_not_expired() {
        let clock = IdleClock::new();
        let earlier = clock.released_at - Duration::from_millis(1);
        assert!(!clock.is_expired(Some(Duration::from_millis(1)), earlier));
    }

    #[test]
    fn touch_restarts_the_clock() {
        let mut clock = IdleClock::new();
        let before = clock.released_at;
        std::thread::sleep(Duration::from_millis(2));
        clock.touch();
        assert!(clock.released_at > before);
    }

    #[test]
    fn default_policy_checks_liveness() {
        assert!(EvictionPolicy::default().checks_liveness());
        assert!(!EvictionPolicy::LifetimeOnly.checks_liveness());
    }
}
