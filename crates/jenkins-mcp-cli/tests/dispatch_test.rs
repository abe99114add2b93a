//! End-to-end dispatch tests: tool call envelope -> Jenkins client -> mock Jenkins.

use std::sync::Arc;

use httpmock::prelude::*;
use jenkins_mcp_core::{Credentials, PollingConfig};
use jenkins_mcp_jenkins::JenkinsClient;
use jenkins_mcp_server::{McpServer, ToolHandler};
use serde_json::json;

fn handler() -> ToolHandler {
    let polling = PollingConfig {
        queue_poll_interval_ms: 10,
        queue_max_attempts: 3,
        build_poll_interval_ms: 10,
        build_max_attempts: 3,
        ..Default::default()
    };
    ToolHandler::new(
        Arc::new(JenkinsClient::with_polling(polling)),
        Credentials::new(Some("admin".to_string()), Some("token".to_string())),
    )
}

#[tokio::test]
async fn test_list_jobs_filter_is_case_sensitive() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/json")
            .query_param("tree", "jobs[name,url,color]");
        then.status(200).json_body(json!({
            "jobs": [
                {"name": "foo-api", "color": "blue"},
                {"name": "Foo-web", "color": "red"},
                {"name": "bar", "color": "notbuilt"}
            ]
        }));
    });

    let response = handler()
        .process_tool_call(
            "list_jobs",
            Some(json!({"jenkins_url": server.base_url(), "filter": "foo"})),
        )
        .await;

    assert!(response.success);
    let result = response.result.unwrap();
    assert_eq!(result["total"], 1);
    assert_eq!(result["jobs"][0]["name"], "foo-api");
    assert_eq!(result["jobs"][0]["status"], "stable");
    assert_eq!(result["filter_applied"], "foo");
}

#[tokio::test]
async fn test_get_job_info_error_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/job/missing/api/json");
        then.status(404).body("Not Found");
    });

    let response = handler()
        .process_tool_call(
            "get_job_info",
            Some(json!({"jenkins_url": server.base_url(), "job_name": "missing"})),
        )
        .await;

    assert!(response.success);
    let result = response.result.unwrap();
    assert_eq!(result["status_code"], 404);
    assert_eq!(result["jenkins_url"], server.base_url());
}

#[tokio::test]
async fn test_trigger_job_with_parameters() {
    let server = MockServer::start();
    let location = server.url("/queue/item/5/");

    let crumb = server.mock(|when, then| {
        when.method(GET).path("/crumbIssuer/api/json");
        then.status(200).json_body(json!({
            "crumb": "c0ffee",
            "crumbRequestField": "Jenkins-Crumb"
        }));
    });
    let trigger = server.mock(|when, then| {
        when.method(POST)
            .path("/job/demo/buildWithParameters")
            .query_param("BRANCH", "main")
            .query_param("RETRIES", "2")
            .header("Jenkins-Crumb", "c0ffee");
        then.status(201).header("Location", location.as_str());
    });
    let queue = server.mock(|when, then| {
        when.method(GET).path("/queue/item/5/api/json");
        then.status(200)
            .json_body(json!({"executable": {"number": 12}}));
    });
    let build = server.mock(|when, then| {
        when.method(GET).path("/job/demo/12/api/json");
        then.status(200)
            .json_body(json!({"building": false, "result": "FAILURE"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/job/demo/12/consoleText");
        then.status(200).body("Finished: FAILURE\n");
    });

    let response = handler()
        .process_tool_call(
            "trigger_job",
            Some(json!({
                "jenkins_url": server.base_url(),
                "job_name": "demo",
                "parameters": {"BRANCH": "main", "RETRIES": 2}
            })),
        )
        .await;

    crumb.assert();
    trigger.assert();
    queue.assert_hits(1);
    build.assert_hits(1);

    assert!(response.success);
    let result = response.result.unwrap();
    assert_eq!(result["triggered"], true);
    assert_eq!(result["status_code"], 201);
    assert_eq!(result["queue_url"], location);
    assert_eq!(result["build_number"], 12);
    assert_eq!(result["build_result"], "FAILURE");
    assert_eq!(result["parameters_sent"]["RETRIES"], "2");
    assert_eq!(result["console_output"], "Finished: FAILURE\n");
}

#[tokio::test]
async fn test_unknown_tool_and_missing_argument() {
    let handler = handler();

    let response = handler.process_tool_call("restart_jenkins", None).await;
    assert!(!response.success);
    assert_eq!(response.error.as_deref(), Some("Unknown tool: restart_jenkins"));

    let response = handler
        .process_tool_call("trigger_job", Some(json!({"job_name": "demo"})))
        .await;
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("Missing required argument: jenkins_url")
    );
}

#[tokio::test]
async fn test_server_lists_four_tools() {
    let server = McpServer::new(handler());
    let names: Vec<_> = server
        .handler()
        .available_tools()
        .into_iter()
        .map(|t| t.name)
        .collect();

    assert_eq!(
        names,
        ["get_jenkins_status", "list_jobs", "get_job_info", "trigger_job"]
    );
}
