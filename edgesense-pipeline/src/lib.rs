//! EdgeSense pipeline - edge-resident telemetry decision module
//!
//! Receives temperature/humidity readings from the broker, classifies each
//! one statistically (z-score against operator-supplied mean/std-dev),
//! decides against the configured threshold band whether to forward it to
//! the downstream collector, and notifies the machine gateway over HTTP for
//! escalations. Thresholds, classifier parameters and the gateway endpoint
//! are reconfigurable at runtime through desired-configuration pushes; the
//! adopted configuration is echoed back on the reported topic.

pub mod actuation;
pub mod classifier;
pub mod decision;
pub mod models;
pub mod mqtt;
pub mod pipeline;
pub mod settings;
pub mod store;
pub mod sync;
