//! Metrics collection and exposition for Prometheus.
//!
//! Each scrape records into its own registry; the families it may contain
//! are declared in [`families`].

pub mod families;
mod recorder;

pub use families::{MetricDesc, MetricKind};
#[cfg(test)]
pub(crate) use recorder::MemoryRecorder;
pub use recorder::{MetricsRecorder, RegistryRecorder};
