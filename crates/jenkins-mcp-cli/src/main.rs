//! jenkins-mcp - Jenkins tools for AI assistants over MCP.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use jenkins_mcp_core::{Config, Credentials, ProcessEnv};
use jenkins_mcp_jenkins::JenkinsClient;
use jenkins_mcp_server::{McpServer, ToolHandler};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jenkins-mcp")]
#[command(author, version, about = "Jenkins tools for AI assistants (MCP server)", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Local credentials file (defaults to ./.env when present)
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Serve,

    /// List the available tools
    Tools,

    /// Call a tool once and print the result envelope
    Call {
        /// Tool name, e.g. `trigger_job`
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// Inspect or edit the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a value, e.g. `jenkins.url http://localhost:8081`
    Set { key: String, value: String },

    /// Get a value, e.g. `polling.queue_max_attempts`
    Get { key: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout is the MCP channel, so logs go to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    debug!(path = %config_path.display(), "Using config file");
    let mut config = Config::load_from(&config_path)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let handler = build_handler(&config, cli.env_file.as_deref())?;
            info!(
                default_url = config.default_url().unwrap_or("(none)"),
                "Serving MCP on stdio"
            );
            McpServer::new(handler).run().await?;
        }
        Commands::Tools => {
            let handler = build_handler(&config, cli.env_file.as_deref())?;
            for tool in handler.available_tools() {
                println!("{:<20} {}", tool.name, tool.description);
            }
        }
        Commands::Call { tool, args } => {
            let arguments: Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            let handler = build_handler(&config, cli.env_file.as_deref())?;

            let response = handler.process_tool_call(&tool, Some(arguments)).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.success {
                std::process::exit(1);
            }
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                println!("# {}", config_path.display());
                print!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigCommands::Path => {
                println!("{}", config_path.display());
            }
            ConfigCommands::Set { key, value } => {
                config.set(&key, &value)?;
                config.save_to(&config_path)?;
                println!("Set {} = {}", key, value);
            }
            ConfigCommands::Get { key } => match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => println!("(not set)"),
            },
        },
    }

    Ok(())
}

/// Tool handler backed by the reqwest Jenkins client.
fn build_handler(config: &Config, env_file: Option<&Path>) -> anyhow::Result<ToolHandler> {
    let credentials = Credentials::load(&ProcessEnv, env_file, config)
        .context("Failed to load Jenkins credentials")?;
    let client = JenkinsClient::with_polling(config.polling.clone());

    Ok(ToolHandler::new(Arc::new(client), credentials)
        .with_default_url(config.default_url().map(String::from)))
}
