//! # Blogicum API Server
//!
//! Routes, extractors and error mapping around the `blogicum-core` services.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod telemetry;
