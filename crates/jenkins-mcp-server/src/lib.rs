//! MCP (Model Context Protocol) server for Jenkins.
//!
//! Exposes `get_jenkins_status`, `list_jobs`, `get_job_info` and
//! `trigger_job` as MCP tools over newline-delimited JSON-RPC on stdio.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod transport;

pub use handlers::{ToolHandler, ToolResponse};
pub use server::McpServer;

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "jenkins-mcp-server";
