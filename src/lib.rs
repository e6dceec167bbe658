//! Dell Unity Unisphere Prometheus Exporter
//!
//! A Prometheus metrics exporter for Dell Unity storage arrays, polling the
//! Unisphere management REST API.
//!
//! # Overview
//!
//! This exporter keeps one authenticated REST session per configured array
//! endpoint and runs a set of per-resource collector modules on a fixed poll
//! interval. Fixed-schema modules (system capacity, storage processors) map
//! response fields straight onto gauges; the realtime metric module discovers
//! the array's metric catalog at runtime, matches it against configured path
//! patterns, and maintains a server-side realtime query whose results are
//! pulled on every Prometheus scrape. Array alerts and events are republished
//! as structured log records.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐       REST/JSON      ┌──────────────┐
//! │   Unity     │ ◄─────────────────►  │   Exporter   │
//! │ (Unisphere) │   cookies + CSRF     │              │
//! └─────────────┘                      │  ┌────────┐  │      HTTP      ┌────────────┐
//!                                      │  │ Client │  │ ◄────────────► │ Prometheus │
//!                                      │  └────────┘  │   /metrics     └────────────┘
//!                                      │  ┌────────┐  │
//!                                      │  │Modules │  │
//!                                      │  └────────┘  │
//!                                      └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`unisphere`] - REST session client, request builder, and API types
//! - [`collectors`] - per-endpoint poll loop and collector modules
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - HTTP server and module supervision
//! - [`config`] - Configuration management
//! - [`error`] - Error types

pub mod collectors;
pub mod config;
pub mod error;
pub mod metrics;
pub mod server;
pub mod unisphere;
