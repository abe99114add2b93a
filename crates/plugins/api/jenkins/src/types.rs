//! Jenkins API response types.
//!
//! These types represent the raw JSON responses from the Jenkins remote
//! access API. They are deserialized and then mapped to unified types.
//! Every field Jenkins may omit (or hide behind a `tree` query) is optional.

use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// Server
// =============================================================================

/// `GET {base}/crumbIssuer/api/json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsCrumb {
    pub crumb: String,
    pub crumb_request_field: String,
}

/// `GET {base}/api/json`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsRoot {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub node_description: Option<String>,
    #[serde(default)]
    pub num_executors: Option<u32>,
    #[serde(default)]
    pub quieting_down: bool,
    #[serde(default)]
    pub jobs: Vec<JenkinsJob>,
}

// =============================================================================
// Jobs
// =============================================================================

/// Entry of the `jobs` array.
#[derive(Debug, Clone, Deserialize)]
pub struct JenkinsJob {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// `GET {base}/job/{job}/api/json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsJobDetail {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub buildable: bool,
    #[serde(default)]
    pub in_queue: bool,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub next_build_number: Option<u64>,
    #[serde(default)]
    pub last_build: Option<JenkinsBuildRef>,
    #[serde(default)]
    pub last_successful_build: Option<JenkinsBuildRef>,
    #[serde(default)]
    pub last_failed_build: Option<JenkinsBuildRef>,
    #[serde(default)]
    pub property: Vec<JenkinsJobProperty>,
}

/// Build reference embedded in a job (`lastBuild`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct JenkinsBuildRef {
    pub number: u64,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub building: Option<bool>,
}

/// Job property; only `ParametersDefinitionProperty` carries definitions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsJobProperty {
    #[serde(default)]
    pub parameter_definitions: Vec<JenkinsParameterDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JenkinsParameterDefinition {
    pub name: String,
    #[serde(default, rename = "type")]
    pub param_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_parameter_value: Option<JenkinsParameterValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JenkinsParameterValue {
    #[serde(default)]
    pub value: Option<Value>,
}

// =============================================================================
// Queue and builds
// =============================================================================

/// `GET {queue_url}/api/json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JenkinsQueueItem {
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub executable: Option<JenkinsExecutable>,
}

/// Build assigned to a queue item once it leaves the queue.
#[derive(Debug, Clone, Deserialize)]
pub struct JenkinsExecutable {
    pub number: u64,
    #[serde(default)]
    pub url: Option<String>,
}

/// `GET {build_url}/api/json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JenkinsBuild {
    #[serde(default)]
    pub building: Option<bool>,
    #[serde(default)]
    pub result: Option<String>,
}
