//! Tool handlers for the MCP server.
//!
//! Validates tool arguments, resolves the per-call credential and calls the
//! [`JenkinsProvider`]. Every call produces a [`ToolResponse`] envelope:
//! `{"success": true, "result": ...}` or `{"success": false, "error": ...}`.
//!
//! Only dispatch problems (unknown tool, bad arguments) produce
//! `success: false`. Jenkins failures are reported inside `result`.

use std::collections::BTreeMap;
use std::sync::Arc;

use jenkins_mcp_core::{Credentials, Error, JenkinsProvider, ServerTarget, TriggerRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::protocol::{ToolCallResult, ToolDefinition};

type Arguments = Map<String, Value>;

/// Dispatch envelope returned for every tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Known tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    GetJenkinsStatus,
    ListJobs,
    GetJobInfo,
    TriggerJob,
}

impl Tool {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "get_jenkins_status" => Some(Self::GetJenkinsStatus),
            "list_jobs" => Some(Self::ListJobs),
            "get_job_info" => Some(Self::GetJobInfo),
            "trigger_job" => Some(Self::TriggerJob),
            _ => None,
        }
    }
}

/// Tool handler that executes tools using a Jenkins provider.
pub struct ToolHandler {
    provider: Arc<dyn JenkinsProvider>,
    credentials: Credentials,
    default_url: Option<String>,
}

impl ToolHandler {
    pub fn new(provider: Arc<dyn JenkinsProvider>, credentials: Credentials) -> Self {
        Self {
            provider,
            credentials,
            default_url: None,
        }
    }

    /// Server used when a call omits `jenkins_url`.
    pub fn with_default_url(mut self, url: Option<String>) -> Self {
        self.default_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    /// Get available tool definitions.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "get_jenkins_status".to_string(),
                description: "Get the current status of a Jenkins server".to_string(),
                input_schema: tool_schema(json!({}), &[]),
            },
            ToolDefinition {
                name: "list_jobs".to_string(),
                description: "List all jobs on a Jenkins server".to_string(),
                input_schema: tool_schema(
                    json!({
                        "filter": {
                            "type": "string",
                            "description": "Optional filter pattern for job names (case-sensitive substring)"
                        }
                    }),
                    &[],
                ),
            },
            ToolDefinition {
                name: "get_job_info".to_string(),
                description: "Get detailed information about a Jenkins job".to_string(),
                input_schema: tool_schema(
                    json!({
                        "job_name": {
                            "type": "string",
                            "description": "The name of the job (use 'folder/job' for jobs in folders)"
                        }
                    }),
                    &["job_name"],
                ),
            },
            ToolDefinition {
                name: "trigger_job".to_string(),
                description: "Trigger a Jenkins job build and track it until it finishes"
                    .to_string(),
                input_schema: tool_schema(
                    json!({
                        "job_name": {
                            "type": "string",
                            "description": "The name of the job to trigger"
                        },
                        "parameters": {
                            "type": "object",
                            "description": "Optional job parameters",
                            "additionalProperties": true
                        }
                    }),
                    &["job_name"],
                ),
            },
        ]
    }

    /// Execute a tool and wrap the envelope into an MCP tool result.
    pub async fn execute(&self, name: &str, arguments: Option<Value>) -> ToolCallResult {
        let response = self.process_tool_call(name, arguments).await;
        let text = match serde_json::to_string(&response) {
            Ok(text) => text,
            Err(e) => return ToolCallResult::error(format!("Serialization error: {}", e)),
        };

        if response.success {
            ToolCallResult::text(text)
        } else {
            ToolCallResult::error(text)
        }
    }

    /// Validate arguments and run one tool.
    pub async fn process_tool_call(&self, name: &str, arguments: Option<Value>) -> ToolResponse {
        let Some(tool) = Tool::from_name(name) else {
            tracing::warn!(tool = name, "Unknown tool");
            return ToolResponse::failure(format!("Unknown tool: {}", name));
        };

        let args = match arguments {
            None | Some(Value::Null) => Arguments::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return ToolResponse::failure("Tool arguments must be a JSON object"),
        };

        let result = match tool {
            Tool::GetJenkinsStatus => self.get_jenkins_status(&args).await,
            Tool::ListJobs => self.list_jobs(&args).await,
            Tool::GetJobInfo => self.get_job_info(&args).await,
            Tool::TriggerJob => self.trigger_job(&args).await,
        };

        match result {
            Ok(value) => ToolResponse::ok(value),
            Err(message) => {
                tracing::warn!(tool = name, error = %message, "Rejected tool call");
                ToolResponse::failure(message)
            }
        }
    }

    async fn get_jenkins_status(&self, args: &Arguments) -> Result<Value, String> {
        let target = self.target(args)?;
        let outcome = self.provider.get_status(&target).await;
        payload(&target, outcome)
    }

    async fn list_jobs(&self, args: &Arguments) -> Result<Value, String> {
        let target = self.target(args)?;
        let filter = optional_str(args, "filter")?;
        let outcome = self.provider.list_jobs(&target, filter).await;
        payload(&target, outcome)
    }

    async fn get_job_info(&self, args: &Arguments) -> Result<Value, String> {
        let target = self.target(args)?;
        let job_name = required_str(args, "job_name")?;
        let outcome = self.provider.get_job_info(&target, job_name).await;
        payload(&target, outcome)
    }

    async fn trigger_job(&self, args: &Arguments) -> Result<Value, String> {
        let target = self.target(args)?;
        let job_name = required_str(args, "job_name")?;
        let parameters = parameters(args)?;

        let request = TriggerRequest::new(target, job_name).with_parameters(parameters);
        let outcome = self.provider.trigger_job(&request).await;
        match outcome.and_then(|result| Ok(serde_json::to_value(result)?)) {
            Ok(value) => Ok(value),
            Err(e) => {
                let mut value = error_payload(&request.server, &e);
                value["job_name"] = json!(request.job_name);
                value["triggered"] = json!(false);
                Ok(value)
            }
        }
    }

    /// Server target from `jenkins_url` plus the resolved credential.
    fn target(&self, args: &Arguments) -> Result<ServerTarget, String> {
        let url = match required_str(args, "jenkins_url") {
            Ok(url) => url,
            Err(missing) => self.default_url.as_deref().ok_or(missing)?,
        };
        let credential = self.credentials.resolve(
            optional_str(args, "username")?,
            optional_str(args, "api_token")?,
        );
        Ok(ServerTarget::new(url).with_credential(credential))
    }
}

/// Object schema with the common `jenkins_url`/`username`/`api_token`
/// properties merged in.
fn tool_schema(extra: Value, required: &[&str]) -> Value {
    let mut properties = json!({
        "jenkins_url": {
            "type": "string",
            "description": "The URL of the Jenkins server"
        },
        "username": {
            "type": "string",
            "description": "Jenkins username (defaults to JENKINS_USERNAME)"
        },
        "api_token": {
            "type": "string",
            "description": "Jenkins API token (defaults to JENKINS_API_TOKEN)"
        }
    });
    if let (Some(properties), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        properties.extend(extra);
    }

    let mut required_fields = vec!["jenkins_url"];
    required_fields.extend_from_slice(required);

    json!({
        "type": "object",
        "properties": properties,
        "required": required_fields
    })
}

fn required_str<'a>(args: &'a Arguments, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required argument: {}", key))
}

fn optional_str<'a>(args: &'a Arguments, key: &str) -> Result<Option<&'a str>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str()).filter(|s| !s.is_empty())),
        Some(_) => Err(format!("Argument '{}' must be a string", key)),
    }
}

/// Build parameters as strings. Non-string values use their JSON text.
fn parameters(args: &Arguments) -> Result<BTreeMap<String, String>, String> {
    match args.get("parameters") {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => Ok(map
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect()),
        Some(_) => Err("Argument 'parameters' must be an object".to_string()),
    }
}

/// Result payload of a read operation; Jenkins errors become an error object.
fn payload<T: Serialize>(
    target: &ServerTarget,
    outcome: jenkins_mcp_core::Result<T>,
) -> Result<Value, String> {
    match outcome.and_then(|value| Ok(serde_json::to_value(value)?)) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(jenkins_url = %target.base_url, error = %e, "Jenkins request failed");
            Ok(error_payload(target, &e))
        }
    }
}

fn error_payload(target: &ServerTarget, error: &Error) -> Value {
    let mut value = json!({
        "jenkins_url": target.base_url,
        "error": error.to_string(),
    });
    if let Some(status) = error.status_code() {
        value["status_code"] = json!(status);
    }
    value
}
