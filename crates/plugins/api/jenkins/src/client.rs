//! Jenkins API client implementation.

use async_trait::async_trait;
use jenkins_mcp_core::{
    Error, JenkinsProvider, JobInfo, JobList, JobParameter, JobSummary, PollingConfig, Result,
    ServerStatus, ServerTarget, TriggerRequest, TriggerResult,
};
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{JenkinsJob, JenkinsJobDetail, JenkinsRoot};
use crate::USER_AGENT;

/// Fields requested for `list_jobs`.
const JOB_LIST_TREE: &str = "jobs[name,url,color]";

/// Fields requested for `get_job_info`, including last build results and
/// parameter definitions so a single request is enough.
const JOB_INFO_TREE: &str = "name,displayName,url,description,buildable,inQueue,color,\
nextBuildNumber,lastBuild[number,result,building],lastSuccessfulBuild[number],\
lastFailedBuild[number],property[parameterDefinitions[name,type,description,\
defaultParameterValue[value]]]";

/// Jenkins API client.
///
/// Holds only settings. Every operation opens its own [`JenkinsSession`], so
/// nothing (connections, cookies, crumbs) leaks between invocations.
#[derive(Debug, Clone, Default)]
pub struct JenkinsClient {
    polling: PollingConfig,
}

impl JenkinsClient {
    /// Create a client with default polling bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with custom polling bounds.
    pub fn with_polling(polling: PollingConfig) -> Self {
        Self { polling }
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    fn session<'a>(&self, target: &'a ServerTarget) -> Result<JenkinsSession<'a>> {
        JenkinsSession::open(target, &self.polling)
    }
}

// =============================================================================
// Session: one HTTP client per invocation
// =============================================================================

/// HTTP state for a single tool invocation against one server.
pub(crate) struct JenkinsSession<'a> {
    target: &'a ServerTarget,
    base: Url,
    client: reqwest::Client,
}

impl<'a> JenkinsSession<'a> {
    pub(crate) fn open(target: &'a ServerTarget, polling: &PollingConfig) -> Result<Self> {
        let base = Url::parse(&target.base_url).map_err(|e| {
            Error::InvalidData(format!("Invalid Jenkins URL '{}': {}", target.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidData(format!(
                "Invalid Jenkins URL '{}'",
                target.base_url
            )));
        }

        // Redirects are not followed so the trigger status code is reported as
        // Jenkins sent it. The cookie store keeps the crumb's session cookie.
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(polling.request_timeout())
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            target,
            base,
            client,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.target.base_url
    }

    pub(crate) fn has_credential(&self) -> bool {
        self.target.credential.is_some()
    }

    /// URL below the server base, one path segment per element.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidData(format!("Invalid Jenkins URL '{}'", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL below a job. Folder jobs (`team/app`) become `job/team/job/app`.
    pub(crate) fn job_url(&self, job_name: &str, rest: &[&str]) -> Result<Url> {
        let mut segments: Vec<&str> = Vec::new();
        for part in job_name.split('/').filter(|p| !p.is_empty()) {
            segments.push("job");
            segments.push(part);
        }
        if segments.is_empty() {
            return Err(Error::InvalidData(format!("Invalid job name '{}'", job_name)));
        }
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    /// Turn a `Location` value into an absolute URL string.
    pub(crate) fn absolute(&self, location: &str) -> String {
        if Url::parse(location).is_ok() {
            return location.to_string();
        }
        self.base
            .join(location)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| location.to_string())
    }

    /// Build request with credential attached.
    pub(crate) fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.target.credential {
            Some(credential) => {
                builder.basic_auth(&credential.username, Some(&credential.api_token))
            }
            None => builder,
        }
    }

    /// Send a request and deserialize a successful JSON body.
    pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }

    /// Make an authenticated GET request with typed deserialization.
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "Jenkins GET request");
        self.send_json(self.request(Method::GET, url)).await
    }

    /// Send a request, mapping transport failures and non-2xx statuses.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Jenkins API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        Ok(response)
    }

    /// GET an absolute URL and return its JSON body, or `None` on any failure.
    ///
    /// Used by the polling loops, where a failed attempt just means "not yet".
    pub(crate) async fn get_json_lenient(&self, url: &str) -> Option<Value> {
        let url = match Url::parse(url) {
            Ok(url) => url,
            Err(e) => {
                warn!(url = url, error = %e, "Unparseable polling URL");
                return None;
            }
        };

        match self.get_json::<Value>(url).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, "Polling attempt failed");
                None
            }
        }
    }
}

/// `{url}/api/json` for a queue item or build URL.
pub(crate) fn api_json_url(url: &str) -> String {
    format!("{}/api/json", url.trim_end_matches('/'))
}

// =============================================================================
// Mapping functions: Jenkins types -> Unified types
// =============================================================================

/// Human-readable state of a job's ball color.
fn status_from_color(color: Option<&str>) -> String {
    let Some(color) = color else {
        return "unknown".to_string();
    };
    if color.ends_with("_anime") {
        return "building".to_string();
    }
    match color {
        "blue" | "green" => "stable",
        "red" => "failing",
        "yellow" => "unstable",
        "aborted" => "aborted",
        "notbuilt" => "not_built",
        "disabled" => "disabled",
        _ => "unknown",
    }
    .to_string()
}

fn map_job(job: &JenkinsJob) -> JobSummary {
    JobSummary {
        name: job.name.clone(),
        url: job.url.clone(),
        color: job.color.clone(),
        status: status_from_color(job.color.as_deref()),
    }
}

fn map_server_status(base_url: &str, root: &JenkinsRoot, version: Option<String>) -> ServerStatus {
    let message = if root.quieting_down {
        "Jenkins server is quieting down"
    } else {
        "Jenkins server is operational"
    };

    ServerStatus {
        jenkins_url: base_url.to_string(),
        status: "healthy".to_string(),
        message: message.to_string(),
        version,
        mode: root.mode.clone(),
        node_description: root.node_description.clone(),
        num_executors: root.num_executors,
        quieting_down: root.quieting_down,
        job_count: root.jobs.len(),
    }
}

fn map_job_list(base_url: &str, jobs: &[JenkinsJob], filter: Option<&str>) -> JobList {
    let filter = filter.filter(|f| !f.is_empty());
    let jobs: Vec<JobSummary> = jobs
        .iter()
        .filter(|job| filter.map_or(true, |f| job.name.contains(f)))
        .map(map_job)
        .collect();

    JobList {
        jenkins_url: base_url.to_string(),
        total: jobs.len(),
        jobs,
        filter_applied: filter.unwrap_or_default().to_string(),
    }
}

fn map_job_info(base_url: &str, job_name: &str, detail: &JenkinsJobDetail) -> JobInfo {
    let parameters = detail
        .property
        .iter()
        .flat_map(|p| p.parameter_definitions.iter())
        .map(|def| JobParameter {
            name: def.name.clone(),
            param_type: def.param_type.clone(),
            default_value: def
                .default_parameter_value
                .as_ref()
                .and_then(|d| d.value.clone()),
            description: def.description.clone().filter(|d| !d.is_empty()),
        })
        .collect();

    let last_build_status = detail.last_build.as_ref().and_then(|b| {
        if b.building == Some(true) {
            Some("BUILDING".to_string())
        } else {
            b.result.clone()
        }
    });

    JobInfo {
        jenkins_url: base_url.to_string(),
        job_name: job_name.to_string(),
        display_name: detail.display_name.clone(),
        url: detail.url.clone(),
        description: detail.description.clone().filter(|d| !d.is_empty()),
        buildable: detail.buildable,
        in_queue: detail.in_queue,
        status: status_from_color(detail.color.as_deref()),
        next_build_number: detail.next_build_number,
        last_build: detail.last_build.as_ref().map(|b| b.number),
        last_build_status,
        last_successful_build: detail.last_successful_build.as_ref().map(|b| b.number),
        last_failed_build: detail.last_failed_build.as_ref().map(|b| b.number),
        parameters,
    }
}

// =============================================================================
// Trait implementation
// =============================================================================

#[async_trait]
impl JenkinsProvider for JenkinsClient {
    fn provider_name(&self) -> &'static str {
        "jenkins"
    }

    async fn get_status(&self, target: &ServerTarget) -> Result<ServerStatus> {
        let session = self.session(target)?;
        let url = session.url(&["api", "json"])?;
        debug!(url = %url, "Jenkins status request");

        let response = session.send(session.request(Method::GET, url)).await?;
        let version = response
            .headers()
            .get("X-Jenkins")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let root: JenkinsRoot = response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))?;

        Ok(map_server_status(session.base_url(), &root, version))
    }

    async fn list_jobs(&self, target: &ServerTarget, filter: Option<&str>) -> Result<JobList> {
        let session = self.session(target)?;
        let url = session.url(&["api", "json"])?;
        debug!(url = %url, filter = ?filter, "Jenkins list jobs request");

        let root: JenkinsRoot = session
            .send_json(
                session
                    .request(Method::GET, url)
                    .query(&[("tree", JOB_LIST_TREE)]),
            )
            .await?;

        Ok(map_job_list(session.base_url(), &root.jobs, filter))
    }

    async fn get_job_info(&self, target: &ServerTarget, job_name: &str) -> Result<JobInfo> {
        let session = self.session(target)?;
        let url = session.job_url(job_name, &["api", "json"])?;
        debug!(url = %url, "Jenkins job info request");

        let detail: JenkinsJobDetail = session
            .send_json(
                session
                    .request(Method::GET, url)
                    .query(&[("tree", JOB_INFO_TREE)]),
            )
            .await?;

        Ok(map_job_info(session.base_url(), job_name, &detail))
    }

    async fn trigger_job(&self, request: &TriggerRequest) -> Result<TriggerResult> {
        let session = self.session(&request.server)?;
        crate::trigger::run(&session, request, &self.polling).await
    }
}
