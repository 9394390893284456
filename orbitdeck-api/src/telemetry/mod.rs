//! Orbitdeck Telemetry - Observability Infrastructure
//!
//! Structured logging via tracing-subscriber and Prometheus metrics for the
//! HTTP layer, upstream calls and the response cache.

pub mod instrumented;
pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use instrumented::{InstrumentedUpstream, MetricsCacheObserver};
pub use metrics::{metrics, metrics_handler, OrbitdeckMetrics, METRICS};
pub use middleware::observability_middleware;
pub use tracer::{init_tracing, TelemetryConfig};
