//! Provider trait for Jenkins servers.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{JobInfo, JobList, ServerStatus, ServerTarget, TriggerRequest, TriggerResult};

/// Operations the MCP tools expose, one method per tool.
///
/// Implementations hold no per-server state: the target travels with every
/// call, so each invocation is independent.
#[async_trait]
pub trait JenkinsProvider: Send + Sync {
    /// Get the provider name (e.g., "jenkins")
    fn provider_name(&self) -> &'static str;

    /// Check that the server answers and summarize its state.
    async fn get_status(&self, target: &ServerTarget) -> Result<ServerStatus>;

    /// List top-level jobs, keeping only names that contain `filter`.
    async fn list_jobs(&self, target: &ServerTarget, filter: Option<&str>) -> Result<JobList>;

    /// Get details of a single job.
    async fn get_job_info(&self, target: &ServerTarget, job_name: &str) -> Result<JobInfo>;

    /// Start a build and follow it as far as the polling bounds allow.
    ///
    /// Only a transport failure of the submit request is an error; every
    /// later stage reports its outcome through the result.
    async fn trigger_job(&self, request: &TriggerRequest) -> Result<TriggerResult>;
}
