//! `lidarmark-runtime` – the nodes that run the detector on the event bus.
//!
//! # Modules
//!
//! - [`detector_node`] – [`DetectorNode`][detector_node::DetectorNode]:
//!   caches odometry, runs cylinder detection on each scan and publishes the
//!   world-frame marker.
//! - [`decimator`] – [`DecimatorNode`][decimator::DecimatorNode]:
//!   republishes each scan keeping only every n-th reading.
//! - [`convert`] – bus payload ↔ perception type conversions.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable trace export.

pub mod convert;
pub mod decimator;
pub mod detector_node;
pub mod telemetry;

pub use decimator::{DEFAULT_DECIMATION_STEP, DecimatorNode};
pub use detector_node::{DetectorNode, locate_cylinder};
pub use telemetry::{TracerProviderGuard, init_tracing};
