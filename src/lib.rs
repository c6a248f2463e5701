//! JSON Exporter - Prometheus exporter for arbitrary JSON endpoints
//!
//! This library fetches JSON documents from one or more URLs, flattens every
//! numeric and boolean leaf into a gauge named after its path, and serves the
//! result in the Prometheus text exposition format.

pub mod cli;
pub mod config;
pub mod error;
pub mod exporter;
pub mod fetch;
pub mod filter;
pub mod handlers;
pub mod labels;
pub mod middleware;
pub mod naming;
pub mod sink;
pub mod telemetry;
pub mod walker;
