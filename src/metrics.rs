//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot of pool counters and occupancy
///
/// # Examples
///
/// ```
/// use esox_managedpool::PoolMetrics;
///
/// let metrics = PoolMetrics::default();
/// assert_eq!(metrics.export()["objects_total"], "0");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Objects created by the factory
    pub created: usize,

    /// Objects destroyed, for any reason
    pub destroyed: usize,

    /// Destroy calls that reported failure or returned an error
    pub destroy_failures: usize,

    /// Factory calls that failed or produced an inactive object
    pub creation_failures: usize,

    /// Successful `get` calls
    pub acquired: usize,

    /// Objects returned to the idle set
    pub released: usize,

    /// `get` calls that gave up waiting
    pub timeouts: usize,

    /// Objects removed by the lifetime sweep
    pub evicted: usize,

    /// Objects currently in the pool
    pub total_objects: usize,

    /// Objects currently idle
    pub idle_objects: usize,

    /// Objects currently checked out
    pub checked_out_objects: usize,

    /// Configured capacity
    pub capacity: usize,

    /// Checked-out share of capacity (0.0 to 1.0)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("created".to_string(), self.created.to_string());
        metrics.insert("destroyed".to_string(), self.destroyed.to_string());
        metrics.insert("destroy_failures".to_string(), self.destroy_failures.to_string());
        metrics.insert("creation_failures".to_string(), self.creation_failures.to_string());
        metrics.insert("acquired".to_string(), self.acquired.to_string());
        metrics.insert("released".to_string(), self.released.to_string());
        metrics.insert("timeouts".to_string(), self.timeouts.to_string());
        metrics.insert("evicted".to_string(), self.evicted.to_string());
        metrics.insert("objects_total".to_string(), self.total_objects.to_string());
        metrics.insert("objects_idle".to_string(), self.idle_objects.to_string());
        metrics.insert("objects_checked_out".to_string(), self.checked_out_objects.to_string());
        metrics.insert("capacity".to_string(), self.capacity.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Render a snapshot in the Prometheus text exposition format
    ///
    /// Every series carries a `pool` label plus the given tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use esox_managedpool::{MetricsExporter, PoolMetrics};
    /// use std::collections::HashMap;
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = MetricsExporter::export_prometheus(&PoolMetrics::default(), "db", Some(&tags)).unwrap();
    /// assert!(output.contains("objectpool_objects_checked_out"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> prometheus::Result<String> {
        use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};

        let mut labels = HashMap::new();
        labels.insert("pool".to_string(), pool_name.to_string());
        if let Some(tags) = tags {
            labels.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let registry = Registry::new_custom(Some("objectpool".to_string()), Some(labels))?;

        let gauges = [
            ("objects_total", "Objects currently in the pool", metrics.total_objects),
            ("objects_idle", "Objects currently idle", metrics.idle_objects),
            ("objects_checked_out", "Objects currently checked out", metrics.checked_out_objects),
            ("capacity", "Configured pool capacity", metrics.capacity),
        ];
        for (name, help, value) in gauges {
            let gauge = IntGauge::new(name, help)?;
            gauge.set(value as i64);
            registry.register(Box::new(gauge))?;
        }

        let utilization = Gauge::new("utilization", "Checked-out share of capacity")?;
        utilization.set(metrics.utilization);
        registry.register(Box::new(utilization))?;

        let counters = [
            ("objects_created_total", "Objects created by the factory", metrics.created),
            ("objects_destroyed_total", "Objects destroyed", metrics.destroyed),
            ("objects_evicted_total", "Objects evicted by the lifetime sweep", metrics.evicted),
            ("objects_acquired_total", "Successful get calls", metrics.acquired),
            ("objects_released_total", "Objects returned to the pool", metrics.released),
            ("destroy_failures_total", "Failed object teardowns", metrics.destroy_failures),
            ("creation_failures_total", "Failed object creations", metrics.creation_failures),
            ("timeouts_total", "Get calls that timed out", metrics.timeouts),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::new(name, help)?;
            counter.inc_by(value as u64);
            registry.register(Box::new(counter))?;
        }

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub destroy_failures: AtomicUsize,
    pub creation_failures: AtomicUsize,
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub timeouts: AtomicUsize,
    pub evicted: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the outcome of one destroy call.
    pub fn record_destroy<E>(&self, outcome: &Result<bool, E>) {
        Self::increment(&self.destroyed);
        if !matches!(outcome, Ok(true)) {
            Self::increment(&self.destroy_failures);
        }
    }

    pub fn get_metrics(&self, total: usize, idle: usize, capacity: usize) -> PoolMetrics {
        let checked_out = total.saturating_sub(idle);
        let utilization = if capacity > 0 {
            checked_out as f64 / capacity as f64
        } else {
            0.0
        };

        PoolMetrics {
            created: self.created.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
            destroy_failures: self.destroy_failures.load(Ordering::Relaxed),
            creation_failures: self.creation_failures.load(Ordering::Relaxed),
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            total_objects: total,
            idle_objects: idle,
            checked_out_objects: checked_out,
            capacity,
            utilization,
        }
    }
}
