//! Jenkins provider implementation for jenkins-mcp.
//!
//! This crate talks to the Jenkins remote access API (`/api/json`,
//! `/build`, `/buildWithParameters`, queue items and console text).

mod client;
mod trigger;
mod types;

pub use client::JenkinsClient;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("jenkins-mcp/", env!("CARGO_PKG_VERSION"));
