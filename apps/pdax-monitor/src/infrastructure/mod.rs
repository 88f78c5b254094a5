//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// PDAX login, WebSocket session and frame codec.
pub mod pdax;

/// Repository adapters (CSV, log).
pub mod persistence;

/// Configuration and auxiliary file loading.
pub mod config;

/// Tracing subscriber and OpenTelemetry export.
pub mod telemetry;
