//! Credential resolution.
//!
//! The Jenkins username and API token are looked up once at startup, in order:
//!
//! 1. process environment (`JENKINS_USERNAME` / `JENKINS_API_TOKEN`, or the
//!    shorter `JENKINS_USER` / `JENKINS_TOKEN`)
//! 2. a local `KEY=VALUE` file (`.env` in the working directory, or an
//!    explicit path) meant for local development only
//! 3. `jenkins.username` from the config file (username only)
//!
//! Tool arguments can still override either half per call, see
//! [`Credentials::resolve`].

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::config::Config;
use crate::types::Credential;
use crate::{Error, Result};

/// Default local credentials file, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

const USERNAME_KEYS: [&str; 2] = ["JENKINS_USERNAME", "JENKINS_USER"];
const TOKEN_KEYS: [&str; 2] = ["JENKINS_API_TOKEN", "JENKINS_TOKEN"];

/// Source of environment variables.
#[cfg_attr(test, mockall::automock)]
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Credentials known at startup.
#[derive(Clone, Default)]
pub struct Credentials {
    username: Option<String>,
    api_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// No startup credentials; only tool arguments can authenticate.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(username: Option<String>, api_token: Option<String>) -> Self {
        Self {
            username,
            api_token,
        }
    }

    /// Resolve startup credentials.
    ///
    /// `env_file` is an explicit local file; when `None`, `.env` in the
    /// working directory is used if it exists. An explicit file that cannot
    /// be read is an error, a missing default file is not.
    pub fn load(env: &dyn EnvSource, env_file: Option<&Path>, config: &Config) -> Result<Self> {
        let file_vars = match env_file {
            Some(path) => read_env_file(path)?,
            None => {
                let path = Path::new(DEFAULT_ENV_FILE);
                if path.is_file() {
                    read_env_file(path)?
                } else {
                    HashMap::new()
                }
            }
        };

        let lookup = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .find_map(|key| env.var(key))
                .or_else(|| {
                    keys.iter()
                        .find_map(|key| file_vars.get(*key).filter(|v| !v.is_empty()).cloned())
                })
        };

        let username =
            lookup(&USERNAME_KEYS[..]).or_else(|| config.default_username().map(String::from));
        let api_token = lookup(&TOKEN_KEYS[..]);

        debug!(
            username = ?username,
            has_token = api_token.is_some(),
            "Resolved startup credentials"
        );

        Ok(Self {
            username,
            api_token,
        })
    }

    /// Credential to use when the caller passes none.
    pub fn default_credential(&self) -> Option<Credential> {
        self.resolve(None, None)
    }

    /// Combine per-call overrides with startup values.
    ///
    /// Both halves must be known, otherwise requests go out unauthenticated.
    pub fn resolve(&self, username: Option<&str>, api_token: Option<&str>) -> Option<Credential> {
        let username = username
            .filter(|u| !u.is_empty())
            .map(String::from)
            .or_else(|| self.username.clone())?;
        let api_token = api_token
            .filter(|t| !t.is_empty())
            .map(String::from)
            .or_else(|| self.api_token.clone())?;
        Some(Credential::new(username, api_token))
    }
}

/// Read a `KEY=VALUE` file.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read credentials file {}: {}",
            path.display(),
            e
        ))
    })?;
    debug!(path = ?path, "Loaded local credentials file");
    Ok(parse_env_file(&contents))
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// `export ` prefix is allowed and matching quotes around values are removed.
/// Unquoted values end at a `#` preceded by whitespace.
pub fn parse_env_file(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), env_value(value).to_string()))
        })
        .collect()
}

fn env_value(raw: &str) -> &str {
    let value = raw.trim();
    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return &rest[..end];
            }
        }
    }

    let comment = raw
        .char_indices()
        .find(|&(i, c)| c == '#' && raw[..i].ends_with(char::is_whitespace))
        .map(|(i, _)| i);
    match comment {
        Some(i) => raw[..i].trim(),
        None => value,
    }
}
