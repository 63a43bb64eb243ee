// src/pipeline/mod.rs

pub mod event_bus;
pub mod metrics;

pub use event_bus::{AbortReason, DesireEvent, EventBus};
pub use metrics::{DesireMetrics, MetricsSummary};
