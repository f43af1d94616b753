//! Observability setup for Protoforge: structured logging via `tracing`
//! with optional OpenTelemetry span export.

pub mod tracing_setup;
