//! Client runtime for the Reachard monitoring service.
//!
//! A persistent credential store and session cache, a path router with
//! history integration, the incident/latency time-series transforms, and
//! the views that tie them to the backend API.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod render;
pub mod router;
pub mod store;
pub mod timeseries;
