//! Execution counters for folds.
//!
//! Attach a [`MetricsCollector`] to a [`Runner`](crate::runner::Runner) and every
//! fold it runs adds to these counters:
//!
//! - `fold_leaves` -- partitions a leaf fold was started on
//! - `fold_combines` -- join-point combine calls
//! - `fold_elements` -- source elements handed to the reducing step, before any filter
//! - `fold_runs` -- completed folds over a non-empty source
//! - `fold_aborts` -- folds stopped by a failing or panicking user function
//!
//! An aborted fold still reports the leaves, combines and elements that ran
//! before it stopped. Leaves skipped because of the abort are not counted.
//!
//! Custom metrics can be registered next to them through the [`Metric`] trait.
//!
//! # Example
//!
//! ```
//! use ironfold::config::FoldConfig;
//! use ironfold::metrics::MetricsCollector;
//! use ironfold::runner::Runner;
//!
//! # fn main() -> anyhow::Result<()> {
//! let metrics = MetricsCollector::new();
//! let runner = Runner::new(FoldConfig::new().with_leaf_threshold(10))?
//!     .with_metrics(metrics.clone());
//!
//! let data: Vec<u64> = (0..100).collect();
//! let total = runner.fold(&data[..], |a: u64, x: u64| a + x, |a: u64, b: u64| a + b, 0)?;
//! assert_eq!(total, 4950);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot["fold_elements"], serde_json::json!(100));
//! # Ok(())
//! # }
//! ```

use serde_json::{Value, json};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const LEAVES: &str = "fold_leaves";
pub const COMBINES: &str = "fold_combines";
pub const ELEMENTS: &str = "fold_elements";
pub const RUNS: &str = "fold_runs";
pub const ABORTS: &str = "fold_aborts";

/// A named value reported by a [`MetricsCollector`].
pub trait Metric: Send + Sync + Any {
    fn name(&self) -> &str;

    /// The current value as JSON.
    fn value(&self) -> Value;

    fn description(&self) -> Option<&str> {
        None
    }

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Thread-safe registry of metrics.
///
/// Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsCollectorInner>>,
}

#[derive(Default)]
struct MetricsCollectorInner {
    metrics: HashMap<String, Box<dyn Metric>>,
    start_time: Option<Instant>,
    end_time: Option<Instant>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsCollectorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a metric, replacing any metric with the same name.
    pub fn register(&self, metric: Box<dyn Metric>) {
        self.lock().metrics.insert(metric.name().to_string(), metric);
    }

    pub fn record_start(&self) {
        self.lock().start_time = Some(Instant::now());
    }

    pub fn record_end(&self) {
        self.lock().end_time = Some(Instant::now());
    }

    /// Time between the last `record_start` and `record_end`, if both happened.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        let inner = self.lock();
        match (inner.start_time, inner.end_time) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }

    /// Add `value` to the counter `name`, creating it if needed.
    ///
    /// A non-counter metric registered under `name` is replaced.
    pub fn increment_counter(&self, name: &str, value: u64) {
        let mut inner = self.lock();
        if let Some(counter) = inner
            .metrics
            .get_mut(name)
            .and_then(|m| m.as_any_mut().downcast_mut::<CounterMetric>())
        {
            counter.count += value;
            return;
        }
        inner
            .metrics
            .insert(name.to_string(), Box::new(CounterMetric::with_value(name, value)));
    }

    pub fn set_counter(&self, name: &str, value: u64) {
        self.lock()
            .metrics
            .insert(name.to_string(), Box::new(CounterMetric::with_value(name, value)));
    }

    /// All metric names mapped to their current values.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock()
            .metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric.value()))
            .collect()
    }

    /// Metrics as a JSON object, including `execution_time_ms` when timing was recorded.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let inner = self.lock();
        let mut out = serde_json::Map::new();
        for (name, metric) in &inner.metrics {
            let mut obj = serde_json::Map::new();
            obj.insert("value".to_string(), metric.value());
            if let Some(desc) = metric.description() {
                obj.insert("description".to_string(), json!(desc));
            }
            out.insert(name.clone(), Value::Object(obj));
        }
        if let (Some(start), Some(end)) = (inner.start_time, inner.end_time) {
            out.insert(
                "execution_time_ms".to_string(),
                json!({ "value": end.saturating_duration_since(start).as_millis() }),
            );
        }
        Value::Object(out)
    }
}

impl Display for MetricsCollector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let inner = self.lock();
        if let (Some(start), Some(end)) = (inner.start_time, inner.end_time) {
            writeln!(f, "execution_time_ms: {}", end.saturating_duration_since(start).as_millis())?;
        }
        let mut sorted: Vec<_> = inner.metrics.iter().collect();
        sorted.sort_by_key(|(name, _)| *name);
        for (name, metric) in sorted {
            match metric.description() {
                Some(desc) => writeln!(f, "{name}: {} ({desc})", metric.value())?,
                None => writeln!(f, "{name}: {}", metric.value())?,
            }
        }
        Ok(())
    }
}

/// A monotonically increasing count.
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, 0)
    }

    pub fn with_value(name: impl Into<String>, count: u64) -> Self {
        Self { name: name.into(), count }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.count)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A single numeric reading.
pub struct GaugeMetric {
    name: String,
    value: f64,
    description: Option<String>,
}

impl GaugeMetric {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self { name: name.into(), value, description: None }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Metric for GaugeMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.value)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lock-free counts gathered while a single fold runs, flushed into a collector afterwards.
#[derive(Debug, Default)]
pub(crate) struct FoldCounters {
    leaves: AtomicU64,
    combines: AtomicU64,
    elements: AtomicU64,
}

impl FoldCounters {
    #[inline]
    pub(crate) fn leaf(&self, elements: usize) {
        self.leaves.fetch_add(1, Ordering::Relaxed);
        self.elements.fetch_add(elements as u64, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn combine(&self) {
        self.combines.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn flush(&self, collector: &MetricsCollector, completed: bool) {
        collector.increment_counter(LEAVES, self.leaves.load(Ordering::Relaxed));
        collector.increment_counter(COMBINES, self.combines.load(Ordering::Relaxed));
        collector.increment_counter(ELEMENTS, self.elements.load(Ordering::Relaxed));
        collector.increment_counter(RUNS, u64::from(completed));
        collector.increment_counter(ABORTS, u64::from(!completed));
    }
}
