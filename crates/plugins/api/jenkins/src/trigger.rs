//! Trigger-and-track flow for `trigger_job`.
//!
//! crumb -> submit -> queue item -> build number -> build completion -> console
//!
//! Only a transport failure of the submit request is returned as an error.
//! Every later stage is best-effort: when it fails or runs out of attempts the
//! flow stops there and returns what it has.

use std::time::Duration;

use jenkins_mcp_core::{Error, PollingConfig, Result, TriggerRequest, TriggerResult};
use reqwest::header::{HeaderName, HeaderValue, LOCATION};
use reqwest::{Method, Url};
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::client::{api_json_url, JenkinsSession};
use crate::types::{JenkinsBuild, JenkinsCrumb, JenkinsQueueItem};

/// CSRF crumb header for the submit request.
struct Crumb {
    field: HeaderName,
    value: HeaderValue,
}

#[derive(Debug, Clone, Copy)]
struct PollBounds {
    interval: Duration,
    max_attempts: u32,
    max_wait: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    Ready,
    Pending,
    /// Will never become ready (cancelled queue item).
    Abandoned,
}

pub(crate) async fn run(
    session: &JenkinsSession<'_>,
    request: &TriggerRequest,
    polling: &PollingConfig,
) -> Result<TriggerResult> {
    let mut result = TriggerResult::for_request(request);

    let crumb = if session.has_credential() {
        fetch_crumb(session).await
    } else {
        debug!("No credential, skipping crumb request");
        None
    };

    let location = submit(session, request, crumb.as_ref(), &mut result).await?;

    let Some(location) = location else {
        info!(job = %request.job_name, "No Location header, build cannot be tracked");
        return Ok(result);
    };
    let queue_url = session.absolute(&location);
    result.queue_url = Some(queue_url.clone());

    // A redirect (login page, ...) is not a queue item
    if !result.triggered {
        return Ok(result);
    }

    // Queue item -> build number

    let queue_bounds = PollBounds {
        interval: polling.queue_poll_interval(),
        max_attempts: polling.queue_max_attempts,
        max_wait: polling.queue_max_wait(),
    };
    let (queue_item, state) = poll(
        session,
        &api_json_url(&queue_url),
        queue_bounds,
        "queue item",
        queue_state,
    )
    .await;

    let executable = match state {
        PollState::Ready => queue_item.as_ref().and_then(started_build),
        PollState::Abandoned => {
            warn!(queue_url = %queue_url, "Queue item was cancelled");
            None
        }
        PollState::Pending => {
            info!(queue_url = %queue_url, "Build did not leave the queue within the polling bounds");
            None
        }
    };
    result.queue_item = queue_item;

    let Some((number, executable_url)) = executable else {
        return Ok(result);
    };
    let build_url = executable_url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| compose_build_url(session, &request.job_name, number));
    info!(build_number = number, build_url = %build_url, "Build started");
    result.build_number = Some(number);
    result.build_url = Some(build_url.clone());

    // Build completion
    let build_bounds = PollBounds {
        interval: polling.build_poll_interval(),
        max_attempts: polling.build_max_attempts,
        max_wait: polling.build_max_wait(),
    };
    let (build, state) = poll(
        session,
        &api_json_url(&build_url),
        build_bounds,
        "build",
        build_state,
    )
    .await;

    if let Some(build) = build.and_then(|b| serde_json::from_value::<JenkinsBuild>(b).ok()) {
        result.building = build.building;
        result.build_result = build.result;
    }
    if state != PollState::Ready {
        info!(build_url = %build_url, "Build still running after the polling bounds");
    }

    result.console_output = fetch_console(session, &build_url, polling.max_console_chars).await;

    Ok(result)
}

/// Ask the crumb issuer for an anti-forgery token. Never fails the flow.
async fn fetch_crumb(session: &JenkinsSession<'_>) -> Option<Crumb> {
    let url = session.url(&["crumbIssuer", "api", "json"]).ok()?;

    let crumb: JenkinsCrumb = match session.get_json(url).await {
        Ok(crumb) => crumb,
        Err(e) => {
            info!(error = %e, "Could not fetch CSRF crumb, continuing without it");
            return None;
        }
    };

    let field = HeaderName::from_bytes(crumb.crumb_request_field.as_bytes()).ok();
    let value = HeaderValue::from_str(&crumb.crumb).ok();
    match (field, value) {
        (Some(field), Some(value)) => {
            debug!(field = %field, "Using CSRF crumb");
            Some(Crumb { field, value })
        }
        _ => {
            warn!("Crumb issuer returned an unusable header, continuing without it");
            None
        }
    }
}

/// POST the build request and record its outcome. Returns the `Location`
/// header, if any.
async fn submit(
    session: &JenkinsSession<'_>,
    request: &TriggerRequest,
    crumb: Option<&Crumb>,
    result: &mut TriggerResult,
) -> Result<Option<String>> {
    let endpoint = if request.is_parameterized() {
        "buildWithParameters"
    } else {
        "build"
    };
    let url = session.job_url(&request.job_name, &[endpoint])?;
    info!(
        url = %url,
        parameters = request.parameters.len(),
        "Triggering Jenkins build"
    );

    let mut builder = session.request(Method::POST, url);
    if request.is_parameterized() {
        builder = builder.query(&request.parameters);
    }
    if let Some(crumb) = crumb {
        builder = builder.header(crumb.field.clone(), crumb.value.clone());
    }

    let response = builder
        .send()
        .await
        .map_err(|e| Error::Http(e.to_string()))?;

    let status = response.status();
    result.status_code = Some(status.as_u16());
    result.triggered = status.is_success();
    if !result.triggered {
        warn!(status = status.as_u16(), "Jenkins did not accept the build request");
    }

    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from);

    result.api_response = match response.text().await {
        Ok(body) => parse_api_response(&body),
        Err(e) => json!({ "error": e.to_string() }),
    };
    result.api_response_text = result.api_response.to_string();

    Ok(location)
}

/// Parsed body, or `{"error": ...}` with the raw body (or the parse error
/// when the body is empty).
fn parse_api_response(body: &str) -> Value {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(e) if body.trim().is_empty() => json!({ "error": e.to_string() }),
        Err(_) => json!({ "error": body }),
    }
}

/// Poll `url` until `check` says ready or abandoned, or the bounds run out.
///
/// Returns the last JSON body seen and the final state. Failed requests and
/// non-JSON bodies count as pending.
async fn poll<F>(
    session: &JenkinsSession<'_>,
    url: &str,
    bounds: PollBounds,
    what: &str,
    check: F,
) -> (Option<Value>, PollState)
where
    F: Fn(&Value) -> PollState,
{
    // None: the ceiling is too far away to matter
    let deadline = Instant::now().checked_add(bounds.max_wait);
    let mut last = None;

    for attempt in 1..=bounds.max_attempts {
        if attempt > 1 {
            let next = Instant::now().checked_add(bounds.interval);
            let exhausted = match (next, deadline) {
                (None, _) => true,
                (Some(next), Some(deadline)) => next > deadline,
                (Some(_), None) => false,
            };
            if exhausted {
                debug!(what = what, attempt = attempt, "Polling time budget exhausted");
                break;
            }
            sleep(bounds.interval).await;
        }

        debug!(what = what, attempt = attempt, url = url, "Polling");
        let Some(value) = session.get_json_lenient(url).await else {
            continue;
        };

        let state = check(&value);
        last = Some(value);
        if state != PollState::Pending {
            return (last, state);
        }
    }

    (last, PollState::Pending)
}

fn queue_state(value: &Value) -> PollState {
    match serde_json::from_value::<JenkinsQueueItem>(value.clone()) {
        Ok(item) if item.executable.is_some() => PollState::Ready,
        Ok(item) if item.cancelled => PollState::Abandoned,
        _ => PollState::Pending,
    }
}

fn build_state(value: &Value) -> PollState {
    match value.get("building").and_then(Value::as_bool) {
        Some(false) => PollState::Ready,
        _ => PollState::Pending,
    }
}

/// Build number and URL of a started queue item.
fn started_build(value: &Value) -> Option<(u64, Option<String>)> {
    let item = serde_json::from_value::<JenkinsQueueItem>(value.clone()).ok()?;
    item.executable.map(|e| (e.number, e.url))
}

/// `{base}/job/{job}/{number}/` when Jenkins did not report a build URL.
fn compose_build_url(session: &JenkinsSession<'_>, job_name: &str, number: u64) -> String {
    let number = number.to_string();
    session
        .job_url(job_name, &[number.as_str(), ""])
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}/job/{}/{}/", session.base_url(), job_name, number))
}

/// Fetch `{build_url}/consoleText`. Failures become a short diagnostic.
async fn fetch_console(session: &JenkinsSession<'_>, build_url: &str, max_chars: usize) -> String {
    let url = format!("{}/consoleText", build_url.trim_end_matches('/'));
    let url = match Url::parse(&url) {
        Ok(url) => url,
        Err(e) => return format!("Console output unavailable: {}", e),
    };
    debug!(url = %url, "Fetching console output");

    let response = match session.request(Method::GET, url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Console request failed");
            return format!("Console output unavailable: {}", e);
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(status = status.as_u16(), "Console request rejected");
        return format!("Console output unavailable: HTTP {}", status.as_u16());
    }

    match response.text().await {
        Ok(text) => truncate_tail(&text, max_chars),
        Err(e) => format!("Console output unavailable: {}", e),
    }
}

/// Keep the last `max_chars` characters; 0 keeps everything.
fn truncate_tail(text: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return text.to_string();
    }
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let skipped = total - max_chars;
    let start = text
        .char_indices()
        .nth(skipped)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    format!(
        "[... {} earlier characters truncated ...]\n{}",
        skipped,
        &text[start..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_response() {
        assert_eq!(parse_api_response(r#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(
            parse_api_response("<html>denied</html>"),
            json!({"error": "<html>denied</html>"})
        );

        let empty = parse_api_response("");
        assert!(empty["error"].as_str().is_some_and(|e| !e.is_empty()));
    }

    #[test]
    fn test_queue_state() {
        assert_eq!(queue_state(&json!({"why": "waiting"})), PollState::Pending);
        assert_eq!(
            queue_state(&json!({"executable": {"number": 3}})),
            PollState::Ready
        );
        assert_eq!(
            queue_state(&json!({"cancelled": true, "executable": null})),
            PollState::Abandoned
        );
        assert_eq!(
            queue_state(&json!({"executable": {"number": "3"}})),
            PollState::Pending
        );
        assert_eq!(queue_state(&json!("text")), PollState::Pending);
    }

    #[test]
    fn test_build_state() {
        assert_eq!(build_state(&json!({"building": false})), PollState::Ready);
        assert_eq!(build_state(&json!({"building": true})), PollState::Pending);
        assert_eq!(build_state(&json!({})), PollState::Pending);
    }

    #[test]
    fn test_truncate_tail() {
        assert_eq!(truncate_tail("short", 0), "short");
        assert_eq!(truncate_tail("short", 10), "short");

        let truncated = truncate_tail("line1\nline2\nFinished: SUCCESS", 17);
        assert!(truncated.ends_with("Finished: SUCCESS"));
        assert!(truncated.starts_with("[... 12 earlier characters truncated ...]"));

        // Multi-byte characters are cut on a char boundary
        let truncated = truncate_tail("ééééé", 2);
        assert!(truncated.ends_with("éé"));
    }

    // =========================================================================
    // Integration tests with httpmock
    // =========================================================================

    mod integration {
        use std::collections::BTreeMap;

        use super::*;
        use crate::JenkinsClient;
        use httpmock::prelude::*;
        use jenkins_mcp_core::{Credential, JenkinsProvider, ServerTarget};

        fn fast_polling() -> PollingConfig {
            PollingConfig {
                queue_poll_interval_ms: 10,
                queue_max_attempts: 3,
                queue_max_wait_secs: 5,
                build_poll_interval_ms: 10,
                build_max_attempts: 3,
                build_max_wait_secs: 5,
                request_timeout_secs: 5,
                max_console_chars: 0,
            }
        }

        fn client() -> JenkinsClient {
            JenkinsClient::with_polling(fast_polling())
        }

        fn request(server: &MockServer) -> TriggerRequest {
            TriggerRequest::new(ServerTarget::new(server.base_url()), "demo")
        }

        fn authenticated_request(server: &MockServer) -> TriggerRequest {
            TriggerRequest::new(
                ServerTarget::new(server.base_url())
                    .with_credential(Some(Credential::new("admin", "s3cret"))),
                "demo",
            )
        }

        #[tokio::test]
        async fn test_full_flow() {
            let server = MockServer::start();
            let location = server.url("/queue/item/42/");
            let build_url = server.url("/job/demo/7/");

            let trigger = server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(201).header("Location", location.as_str());
            });
            let queue = server.mock(|when, then| {
                when.method(GET).path("/queue/item/42/api/json");
                then.status(200).json_body(serde_json::json!({
                    "id": 42,
                    "executable": {"number": 7, "url": build_url}
                }));
            });
            let build = server.mock(|when, then| {
                when.method(GET).path("/job/demo/7/api/json");
                then.status(200).json_body(serde_json::json!({
                    "number": 7,
                    "building": false,
                    "result": "SUCCESS"
                }));
            });
            let console = server.mock(|when, then| {
                when.method(GET).path("/job/demo/7/consoleText");
                then.status(200).body("Started by user admin\nFinished: SUCCESS\n");
            });

            let result = client().trigger_job(&request(&server)).await.unwrap();

            trigger.assert();
            queue.assert_hits(1);
            build.assert_hits(1);
            console.assert();

            assert!(result.triggered);
            assert_eq!(result.status_code, Some(201));
            assert_eq!(result.queue_url.as_deref(), Some(location.as_str()));
            assert_eq!(result.build_number, Some(7));
            assert_eq!(result.build_url.as_deref(), Some(build_url.as_str()));
            assert_eq!(result.building, Some(false));
            assert_eq!(result.build_result.as_deref(), Some("SUCCESS"));
            assert!(result.console_output.contains("Finished: SUCCESS"));
            assert_eq!(result.queue_item.unwrap()["id"], 42);
            // Jenkins answers 201 with an empty body
            assert!(result.api_response["error"].is_string());
            assert_eq!(result.api_response_text, result.api_response.to_string());
        }

        #[tokio::test]
        async fn test_queue_never_resolves() {
            let server = MockServer::start();
            let location = server.url("/queue/item/42/");

            server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(201).header("Location", location.as_str());
            });
            let queue = server.mock(|when, then| {
                when.method(GET).path("/queue/item/42/api/json");
                then.status(200).json_body(serde_json::json!({
                    "id": 42,
                    "why": "Waiting for next available executor",
                    "executable": null
                }));
            });

            let started = std::time::Instant::now();
            let result = client().trigger_job(&request(&server)).await.unwrap();
            let elapsed = started.elapsed();

            queue.assert_hits(3);
            assert!(result.triggered);
            assert_eq!(result.queue_url.as_deref(), Some(location.as_str()));
            assert!(result.build_number.is_none());
            assert!(result.build_url.is_none());
            assert_eq!(result.console_output, "");
            assert!(elapsed < Duration::from_secs(3), "took {:?}", elapsed);
        }

        #[tokio::test]
        async fn test_queue_non_json_is_pending() {
            let server = MockServer::start();
            let location = server.url("/queue/item/42/");

            server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(201).header("Location", location.as_str());
            });
            let queue = server.mock(|when, then| {
                when.method(GET).path("/queue/item/42/api/json");
                then.status(200).body("<html>busy</html>");
            });

            let result = client().trigger_job(&request(&server)).await.unwrap();

            queue.assert_hits(3);
            assert!(result.queue_item.is_none());
            assert!(result.build_number.is_none());
        }

        #[tokio::test]
        async fn test_cancelled_queue_item_stops_polling() {
            let server = MockServer::start();
            let location = server.url("/queue/item/42/");

            server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(201).header("Location", location.as_str());
            });
            let queue = server.mock(|when, then| {
                when.method(GET).path("/queue/item/42/api/json");
                then.status(200)
                    .json_body(serde_json::json!({"id": 42, "cancelled": true}));
            });

            let result = client().trigger_job(&request(&server)).await.unwrap();

            queue.assert_hits(1);
            assert!(result.build_number.is_none());
            assert_eq!(result.queue_item.unwrap()["cancelled"], true);
        }

        #[tokio::test]
        async fn test_build_still_running_after_bounds() {
            let server = MockServer::start();
            let location = server.url("/queue/item/42/");

            server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(201).header("Location", location.as_str());
            });
            server.mock(|when, then| {
                when.method(GET).path("/queue/item/42/api/json");
                then.status(200)
                    .json_body(serde_json::json!({"executable": {"number": 8}}));
            });
            let build = server.mock(|when, then| {
                when.method(GET).path("/job/demo/8/api/json");
                then.status(200)
                    .json_body(serde_json::json!({"building": true, "result": null}));
            });
            let console = server.mock(|when, then| {
                when.method(GET).path("/job/demo/8/consoleText");
                then.status(200).body("Still going");
            });

            let result = client().trigger_job(&request(&server)).await.unwrap();

            build.assert_hits(3);
            console.assert();
            assert_eq!(result.build_number, Some(8));
            // No executable URL: composed from base, job and number
            assert_eq!(
                result.build_url.as_deref(),
                Some(server.url("/job/demo/8/").as_str())
            );
            assert_eq!(result.building, Some(true));
            assert!(result.build_result.is_none());
            assert_eq!(result.console_output, "Still going");
        }

        #[tokio::test]
        async fn test_no_parameters_uses_build_endpoint() {
            let server = MockServer::start();

            let build = server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(201);
            });
            let with_params = server.mock(|when, then| {
                when.method(POST).path("/job/demo/buildWithParameters");
                then.status(201);
            });

            let result = client().trigger_job(&request(&server)).await.unwrap();

            build.assert();
            with_params.assert_hits(0);
            assert!(result.triggered);
            assert!(result.queue_url.is_none());
            assert!(result.queue_item.is_none());
        }

        #[tokio::test]
        async fn test_parameters_use_build_with_parameters() {
            let server = MockServer::start();

            let mock = server.mock(|when, then| {
                when.method(POST)
                    .path("/job/demo/buildWithParameters")
                    .query_param("BRANCH", "main");
                then.status(201);
            });

            let mut params = BTreeMap::new();
            params.insert("BRANCH".to_string(), "main".to_string());
            let request = request(&server).with_parameters(params);

            let result = client().trigger_job(&request).await.unwrap();

            mock.assert();
            assert!(result.triggered);
            assert_eq!(result.parameters_sent.get("BRANCH").unwrap(), "main");
        }

        #[tokio::test]
        async fn test_crumb_attached_when_authenticated() {
            let server = MockServer::start();

            let crumb = server.mock(|when, then| {
                when.method(GET)
                    .path("/crumbIssuer/api/json")
                    .header("Authorization", "Basic YWRtaW46czNjcmV0");
                then.status(200).json_body(serde_json::json!({
                    "crumb": "abc123",
                    "crumbRequestField": "Jenkins-Crumb"
                }));
            });
            let trigger = server.mock(|when, then| {
                when.method(POST)
                    .path("/job/demo/build")
                    .header("Jenkins-Crumb", "abc123")
                    .header("Authorization", "Basic YWRtaW46czNjcmV0");
                then.status(201);
            });

            let result = client()
                .trigger_job(&authenticated_request(&server))
                .await
                .unwrap();

            crumb.assert();
            trigger.assert();
            assert!(result.triggered);
        }

        #[tokio::test]
        async fn test_crumb_failure_does_not_block_trigger() {
            let server = MockServer::start();

            let crumb = server.mock(|when, then| {
                when.method(GET).path("/crumbIssuer/api/json");
                then.status(500).body("Internal Server Error");
            });
            let trigger = server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(201);
            });

            let result = client()
                .trigger_job(&authenticated_request(&server))
                .await
                .unwrap();

            crumb.assert();
            trigger.assert();
            assert!(result.triggered);
        }

        #[tokio::test]
        async fn test_malformed_crumb_is_skipped() {
            let server = MockServer::start();

            let crumb = server.mock(|when, then| {
                when.method(GET).path("/crumbIssuer/api/json");
                then.status(200).body("<html>not a crumb</html>");
            });
            let trigger = server.mock(|when, then| {
                when.method(POST)
                    .path("/job/demo/build")
                    .header_missing("Jenkins-Crumb");
                then.status(201);
            });

            let result = client()
                .trigger_job(&authenticated_request(&server))
                .await
                .unwrap();

            crumb.assert();
            trigger.assert();
            assert!(result.triggered);
        }

        #[tokio::test]
        async fn test_redirect_keeps_location_without_polling() {
            let server = MockServer::start();
            let location = server.url("/queue/item/42/");

            server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(302).header("Location", location.as_str());
            });
            let queue = server.mock(|when, then| {
                when.method(GET).path("/queue/item/42/api/json");
                then.status(200)
                    .json_body(serde_json::json!({"executable": {"number": 1}}));
            });

            let result = client().trigger_job(&request(&server)).await.unwrap();

            queue.assert_hits(0);
            assert!(!result.triggered);
            assert_eq!(result.status_code, Some(302));
            assert_eq!(result.queue_url.as_deref(), Some(location.as_str()));
            assert!(result.build_number.is_none());
        }

        #[tokio::test]
        async fn test_huge_polling_bounds_do_not_overflow() {
            let server = MockServer::start();
            let location = server.url("/queue/item/42/");

            server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(201).header("Location", location.as_str());
            });
            let queue = server.mock(|when, then| {
                when.method(GET).path("/queue/item/42/api/json");
                then.status(200).json_body(serde_json::json!({"executable": null}));
            });

            // Unbounded wall-clock ceiling: the attempt count still ends polling
            let polling = PollingConfig {
                queue_max_wait_secs: u64::MAX,
                ..fast_polling()
            };
            let result = JenkinsClient::with_polling(polling)
                .trigger_job(&request(&server))
                .await
                .unwrap();
            queue.assert_hits(3);
            assert!(result.build_number.is_none());

            // An interval that cannot be scheduled stops after the first attempt
            let polling = PollingConfig {
                queue_poll_interval_ms: u64::MAX,
                ..fast_polling()
            };
            JenkinsClient::with_polling(polling)
                .trigger_job(&request(&server))
                .await
                .unwrap();
            queue.assert_hits(4);
        }

        #[tokio::test]
        async fn test_no_credential_skips_crumb_and_reports_rejection() {
            let server = MockServer::start();

            let crumb = server.mock(|when, then| {
                when.method(GET).path("/crumbIssuer/api/json");
                then.status(200).json_body(serde_json::json!({
                    "crumb": "abc123",
                    "crumbRequestField": "Jenkins-Crumb"
                }));
            });
            let trigger = server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(403).body("Authentication required");
            });

            let result = client().trigger_job(&request(&server)).await.unwrap();

            crumb.assert_hits(0);
            trigger.assert();
            assert!(!result.triggered);
            assert_eq!(result.status_code, Some(403));
            assert_eq!(
                result.api_response,
                serde_json::json!({"error": "Authentication required"})
            );
            assert!(result.queue_url.is_none());
        }

        #[tokio::test]
        async fn test_json_api_response_is_kept() {
            let server = MockServer::start();

            server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(200).json_body(serde_json::json!({"queued": true}));
            });

            let result = client().trigger_job(&request(&server)).await.unwrap();

            assert_eq!(result.api_response, serde_json::json!({"queued": true}));
            assert_eq!(result.api_response_text, r#"{"queued":true}"#);
        }

        #[tokio::test]
        async fn test_console_failure_is_diagnostic() {
            let server = MockServer::start();
            let location = server.url("/queue/item/1/");

            server.mock(|when, then| {
                when.method(POST).path("/job/demo/build");
                then.status(201).header("Location", location.as_str());
            });
            server.mock(|when, then| {
                when.method(GET).path("/queue/item/1/api/json");
                then.status(200)
                    .json_body(serde_json::json!({"executable": {"number": 2}}));
            });
            server.mock(|when, then| {
                when.method(GET).path("/job/demo/2/api/json");
                then.status(200).json_body(serde_json::json!({"building": false}));
            });
            server.mock(|when, then| {
                when.method(GET).path("/job/demo/2/consoleText");
                then.status(404);
            });

            let result = client().trigger_job(&request(&server)).await.unwrap();

            assert_eq!(result.build_number, Some(2));
            assert_eq!(result.console_output, "Console output unavailable: HTTP 404");
        }

        #[tokio::test]
        async fn test_submit_transport_failure_is_error() {
            let request = TriggerRequest::new(ServerTarget::new("http://127.0.0.1:1"), "demo");
            let result = client().trigger_job(&request).await;
            assert!(matches!(result, Err(Error::Http(_))));
        }
    }
}
