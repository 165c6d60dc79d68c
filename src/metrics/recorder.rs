//! Metrics recording implementation using Prometheus.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};
use tracing::warn;

use super::families::{MetricDesc, MetricKind};

/// Destination for the samples of one scrape.
pub trait MetricsRecorder {
    /// Records `value` for `metric`; `labels` are given in the order of
    /// `metric.labels`.
    fn record(&mut self, metric: &MetricDesc, labels: &[&str], value: f64);
}

/// Records into a fresh Prometheus registry.
///
/// A family is registered the first time a sample is recorded for it, so a
/// family nobody records into is absent from the output.
pub struct RegistryRecorder {
    registry: Registry,
    gauges: HashMap<&'static str, GaugeVec>,
    counters: HashMap<&'static str, CounterVec>,
}

impl Default for RegistryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryRecorder {
    pub fn new() -> Self {
        RegistryRecorder {
            registry: Registry::new(),
            gauges: HashMap::new(),
            counters: HashMap::new(),
        }
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    fn gauge(&mut self, metric: &MetricDesc) -> prometheus::Result<&GaugeVec> {
        match self.gauges.entry(metric.name) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let gauge = GaugeVec::new(Opts::new(metric.name, metric.help), metric.labels)?;
                self.registry.register(Box::new(gauge.clone()))?;
                Ok(entry.insert(gauge))
            }
        }
    }

    fn counter(&mut self, metric: &MetricDesc) -> prometheus::Result<&CounterVec> {
        match self.counters.entry(metric.name) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let counter = CounterVec::new(Opts::new(metric.name, metric.help), metric.labels)?;
                self.registry.register(Box::new(counter.clone()))?;
                Ok(entry.insert(counter))
            }
        }
    }
}

impl MetricsRecorder for RegistryRecorder {
    fn record(&mut self, metric: &MetricDesc, labels: &[&str], value: f64) {
        let result = match metric.kind {
            MetricKind::Gauge => self
                .gauge(metric)
                .and_then(|vec| vec.get_metric_with_label_values(labels))
                .map(|gauge| gauge.set(value)),
            MetricKind::Counter => self
                .counter(metric)
                .and_then(|vec| vec.get_metric_with_label_values(labels))
                .map(|counter| counter.inc_by(value)),
        };

        if let Err(e) = result {
            warn!(
                event_name = "metrics.record.failed",
                event_domain = "metrics",
                metric = metric.name,
                error = %e,
                "failed to record sample"
            );
        }
    }
}

/// Keeps samples in memory, in recording order.
#[cfg(test)]
#[derive(Default, Debug)]
pub(crate) struct MemoryRecorder {
    pub(crate) samples: Vec<(&'static str, Vec<String>, f64)>,
}

#[cfg(test)]
impl MemoryRecorder {
    /// Values recorded for `metric`, with their labels.
    pub(crate) fn values(&self, metric: &MetricDesc) -> Vec<(Vec<String>, f64)> {
        self.samples
            .iter()
            .filter(|(name, _, _)| *name == metric.name)
            .map(|(_, labels, value)| (labels.clone(), *value))
            .collect()
    }

    /// The single unlabeled value recorded for `metric`, if any.
    pub(crate) fn value(&self, metric: &MetricDesc) -> Option<f64> {
        self.values(metric).first().map(|(_, value)| *value)
    }

    pub(crate) fn has(&self, metric: &MetricDesc) -> bool {
        self.samples.iter().any(|(name, _, _)| *name == metric.name)
    }
}

#[cfg(test)]
impl MetricsRecorder for MemoryRecorder {
    fn record(&mut self, metric: &MetricDesc, labels: &[&str], value: f64) {
        self.samples.push((
            metric.name,
            labels.iter().map(|label| label.to_string()).collect(),
            value,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::families::{COLLECTION_DOCUMENTS_COUNT, SCRAPE_ERRORS_TOTAL, UP, USERS_TOTAL};

    #[test]
    fn renders_recorded_families_only() {
        let mut recorder = RegistryRecorder::new();
        recorder.record(&UP, &[], 1.0);
        recorder.record(&COLLECTION_DOCUMENTS_COUNT, &["c1", "Engineering"], 4.0);
        recorder.record(&SCRAPE_ERRORS_TOTAL, &[], 2.0);

        let text = recorder.render().unwrap();

        assert!(text.contains("# HELP outline_up Was the last Outline scrape successful"));
        assert!(text.contains("# TYPE outline_up gauge"));
        assert!(text.contains("outline_up 1"));
        assert!(text.contains(
            r#"outline_collection_documents_count{collection_id="c1",collection_name="Engineering"} 4"#
        ));
        assert!(text.contains("# TYPE outline_scrape_errors_total counter"));
        assert!(text.contains("outline_scrape_errors_total 2"));
        assert!(!text.contains(USERS_TOTAL.name));
    }

    #[test]
    fn label_mismatch_is_skipped() {
        let mut recorder = RegistryRecorder::new();
        recorder.record(&COLLECTION_DOCUMENTS_COUNT, &["only-one"], 1.0);

        let text = recorder.render().unwrap();
        assert!(!text.contains("outline_collection_documents_count{"));
    }
}
