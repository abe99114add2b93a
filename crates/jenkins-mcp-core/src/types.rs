//! Common types returned by Jenkins providers and exposed through MCP tools.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Connection
// =============================================================================

/// Username + API token pair sent as HTTP basic auth.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub api_token: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_token: api_token.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// A Jenkins server to talk to, with the credential to use (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub base_url: String,
    pub credential: Option<Credential>,
}

impl ServerTarget {
    /// Create a target without credentials. Trailing slashes are dropped.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }
}

// =============================================================================
// Read operations
// =============================================================================

/// Reshaped answer of `GET {base}/api/json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerStatus {
    pub jenkins_url: String,
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_executors: Option<u32>,
    #[serde(default)]
    pub quieting_down: bool,
    #[serde(default)]
    pub job_count: usize,
}

/// One entry of a job listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub status: String,
}

/// Result of `list_jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobList {
    pub jenkins_url: String,
    pub jobs: Vec<JobSummary>,
    pub total: usize,
    pub filter_applied: String,
}

/// Build parameter declared by a parameterized job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobParameter {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Result of `get_job_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct JobInfo {
    pub jenkins_url: String,
    pub job_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub buildable: bool,
    pub in_queue: bool,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_build_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_build: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_build_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_build: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failed_build: Option<u64>,
    #[serde(default)]
    pub parameters: Vec<JobParameter>,
}

// =============================================================================
// Trigger
// =============================================================================

/// Everything needed to start and track one build.
#[derive(Debug, Clone)]
pub struct TriggerRequest {
    pub server: ServerTarget,
    pub job_name: String,
    pub parameters: BTreeMap<String, String>,
}

impl TriggerRequest {
    pub fn new(server: ServerTarget, job_name: impl Into<String>) -> Self {
        Self {
            server,
            job_name: job_name.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: BTreeMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Parameterized requests go to `buildWithParameters` instead of `build`.
    pub fn is_parameterized(&self) -> bool {
        !self.parameters.is_empty()
    }
}

/// Outcome of the trigger-and-track flow.
///
/// Every stage after the submit call is best-effort, so most fields stay
/// `None` (or empty) when a stage failed or ran out of attempts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TriggerResult {
    pub jenkins_url: String,
    pub job_name: String,
    pub parameters_sent: BTreeMap<String, String>,
    pub triggered: bool,
    pub status_code: Option<u16>,
    /// Parsed submit response, or `{"error": ...}` when the body was not JSON.
    pub api_response: Value,
    pub api_response_text: String,
    pub queue_url: Option<String>,
    pub queue_item: Option<Value>,
    pub build_number: Option<u64>,
    pub build_url: Option<String>,
    /// Last observed `building` flag of the build.
    pub building: Option<bool>,
    /// Last observed `result` of the build (`SUCCESS`, `FAILURE`, ...).
    pub build_result: Option<String>,
    pub console_output: String,
}

impl TriggerResult {
    /// Empty result for the given request; nothing has happened yet.
    pub fn for_request(request: &TriggerRequest) -> Self {
        Self {
            jenkins_url: request.server.base_url.clone(),
            job_name: request.job_name.clone(),
            parameters_sent: request.parameters.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_target_trims_slash() {
        let target = ServerTarget::new("http://localhost:8081/");
        assert_eq!(target.base_url, "http://localhost:8081");
        assert!(target.credential.is_none());
    }

    #[test]
    fn test_credential_debug_redacts_token() {
        let credential = Credential::new("admin", "s3cret");
        let printed = format!("{:?}", credential);
        assert!(printed.contains("admin"));
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn test_trigger_request_parameterized() {
        let target = ServerTarget::new("http://localhost:8081");
        let plain = TriggerRequest::new(target.clone(), "demo");
        assert!(!plain.is_parameterized());

        let mut params = BTreeMap::new();
        params.insert("BRANCH".to_string(), "main".to_string());
        let with_params = TriggerRequest::new(target, "demo").with_parameters(params);
        assert!(with_params.is_parameterized());
    }

    #[test]
    fn test_trigger_result_defaults() {
        let request = TriggerRequest::new(ServerTarget::new("http://ci"), "demo");
        let result = TriggerResult::for_request(&request);

        assert_eq!(result.jenkins_url, "http://ci");
        assert_eq!(result.job_name, "demo");
        assert!(!result.triggered);
        assert!(result.build_number.is_none());
        assert!(result.console_output.is_empty());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["queue_url"], Value::Null);
        assert_eq!(json["console_output"], "");
    }
}
