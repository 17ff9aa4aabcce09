//! Pool configuration options

use crate::errors::{PoolError, PoolResult};
use crate::eviction::EvictionPolicy;
use std::time::Duration;

/// Configuration for pool behavior
///
/// The configuration is validated once by [`ObjectPool::new`](crate::ObjectPool::new)
/// and stays immutable for the lifetime of the pool.
///
/// # Examples
///
/// ```
/// use esox_managedpool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_capacity(20)
///     .with_min_capacity(5)
///     .with_timeout(Duration::from_secs(3))
///     .with_lifetime(Duration::from_secs(300), Duration::from_secs(10));
///
/// assert_eq!(config.capacity, 20);
/// assert_eq!(config.lifetime, Some(Duration::from_secs(300)));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfiguration {
    /// Hard ceiling on the number of objects the pool holds
    pub capacity: usize,

    /// Number of objects the pool keeps created and ready for use
    pub min_capacity: usize,

    /// How long an object may stay idle before it is evicted; `None` means unlimited
    pub lifetime: Option<Duration>,

    /// How often idle objects are checked for eviction
    pub lifetime_check_period: Option<Duration>,

    /// Maximum time `get` waits for an object
    pub timeout: Duration,

    /// How often the pool tops itself up to `min_capacity`
    pub min_capacity_check_period: Duration,

    /// What makes an idle object eligible for eviction
    pub eviction_policy: EvictionPolicy,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            capacity: 10,
            min_capacity: 0,
            lifetime: None,
            lifetime_check_period: None,
            timeout: Duration::from_secs(30),
            min_capacity_check_period: Duration::from_secs(10),
            eviction_policy: EvictionPolicy::default(),
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of pooled objects
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the number of objects kept ready
    pub fn with_min_capacity(mut self, min_capacity: usize) -> Self {
        self.min_capacity = min_capacity;
        self
    }

    /// Set the idle lifetime and how often it is checked
    ///
    /// A zero lifetime means objects never expire.
    ///
    /// ```
    /// use esox_managedpool::PoolConfiguration;
    /// use std::time::Duration;
    ///
    /// let config = PoolConfiguration::new().with_lifetime(Duration::ZERO, Duration::from_secs(1));
    /// assert_eq!(config.lifetime, None);
    /// ```
    pub fn with_lifetime(mut self, lifetime: Duration, check_period: Duration) -> Self {
        self.lifetime = (!lifetime.is_zero()).then_some(lifetime);
        self.lifetime_check_period = Some(check_period);
        self
    }

    /// Set the acquire timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how often the minimum capacity is re-checked
    pub fn with_min_capacity_check_period(mut self, period: Duration) -> Self {
        self.min_capacity_check_period = period;
        self
    }

    /// Set the eviction policy
    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    /// Check the configuration for values the pool cannot run with
    pub fn validate(&self) -> PoolResult<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidConfiguration(
                "pool capacity must be greater than 0",
            ));
        }
        if self.min_capacity > self.capacity {
            return Err(PoolError::InvalidConfiguration(
                "pool capacity cannot be less than min capacity",
            ));
        }
        if self.lifetime.is_some() {
            match self.lifetime_check_period {
                None => {
                    return Err(PoolError::InvalidConfiguration(
                        "lifetime check period is required when a lifetime is set",
                    ));
                }
                Some(period) if period.is_zero() => {
                    return Err(PoolError::InvalidConfiguration(
                        "lifetime check period must be greater than 0",
                    ));
                }
                Some(_) => {}
            }
        }
        if self.min_capacity_check_period.is_zero() {
            return Err(PoolError::InvalidConfiguration(
                "min capacity check period must be greater than 0",
            ));
        }
        Ok(())
    }
}
