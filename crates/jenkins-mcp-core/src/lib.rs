//! Core traits, types, and error handling for jenkins-mcp.
//!
//! This crate provides the foundational abstractions shared by the Jenkins
//! client, the MCP server and the CLI.

pub mod config;
pub mod credentials;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{Config, JenkinsConfig, PollingConfig};
pub use credentials::{Credentials, EnvSource, ProcessEnv};
pub use error::{Error, Result};
pub use provider::JenkinsProvider;
pub use types::{
    Credential, JobInfo, JobList, JobParameter, JobSummary, ServerStatus, ServerTarget,
    TriggerRequest, TriggerResult,
};
