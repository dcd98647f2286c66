//! Run request built from command-line input

use std::fmt;
use std::time::Duration;

use clap::ValueEnum;
use tracing::info;

use crate::github::client::{api_base_url, PUBLIC_API_HOST};

/// Enterprise host targeted by default
pub const ENTERPRISE_API_HOST: &str = "github.ibm.com";

/// Known GitHub API hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ApiHost {
    /// GitHub Enterprise
    #[default]
    #[value(name = "github.ibm.com")]
    Enterprise,
    /// Public GitHub
    #[value(name = "api.github.com")]
    Public,
}

impl ApiHost {
    pub fn hostname(&self) -> &'static str {
        match self {
            ApiHost::Enterprise => ENTERPRISE_API_HOST,
            ApiHost::Public => PUBLIC_API_HOST,
        }
    }

    pub fn api_base_url(&self) -> String {
        api_base_url(self.hostname())
    }
}

impl fmt::Display for ApiHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hostname())
    }
}

/// Everything one invocation was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Target API host
    pub host: ApiHost,
    /// Explicit API base URL, overriding the one derived from `host`
    pub api_url: Option<String>,
    /// Repository identifier (`owner/name`)
    pub repository: String,
    /// Title of a milestone to create
    pub milestone_name: Option<String>,
    /// Due date for the new milestone (ISO 8601)
    pub milestone_due_date: Option<String>,
    /// Whether to close overdue milestones
    pub close_milestones: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl RunRequest {
    /// Minimal request for `repository` with every optional action off
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            host: ApiHost::default(),
            api_url: None,
            repository: repository.into(),
            milestone_name: None,
            milestone_due_date: None,
            close_milestones: false,
            timeout: crate::github::DEFAULT_TIMEOUT,
        }
    }

    /// API base URL this run talks to
    pub fn api_base_url(&self) -> String {
        match &self.api_url {
            Some(url) => url.clone(),
            None => self.host.api_base_url(),
        }
    }

    /// Log the request the way the operator specified it
    pub fn log_summary(&self) {
        info!(
            "Command-line arguments:\nHostname: {}.\nAPI URL: {}.\nRepository: {}.\nNew Milestone Name: {}.\nNew Milestone Due Date: {}.\nClose Milestones: {}.\nTimeout: {}s.",
            self.host,
            self.api_base_url(),
            self.repository,
            self.milestone_name.as_deref().unwrap_or("none"),
            self.milestone_due_date.as_deref().unwrap_or("none"),
            self.close_milestones,
            self.timeout.as_secs(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_base_urls() {
        assert_eq!(
            ApiHost::Enterprise.api_base_url(),
            "https://github.ibm.com/api/v3"
        );
        assert_eq!(ApiHost::Public.api_base_url(), "https://api.github.com");
    }

    #[test]
    fn test_api_url_override_wins() {
        let mut request = RunRequest::new("octo/widgets");
        request.api_url = Some("http://127.0.0.1:9000".to_string());
        assert_eq!(request.api_base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_new_defaults() {
        let request = RunRequest::new("octo/widgets");
        assert_eq!(request.host, ApiHost::Enterprise);
        assert!(!request.close_milestones);
        assert!(request.milestone_name.is_none());
        assert_eq!(request.timeout, crate::github::DEFAULT_TIMEOUT);
    }
}
