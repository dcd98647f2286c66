//! Async client for the GitHub REST API (v3)
//!
//! Wraps a `reqwest::Client` configured with the access token, the v3 media
//! type, and a per-request timeout. Every call is a single awaited
//! request/response; nothing is retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use github_milestones::github::{GitHubClient, MilestoneService, DEFAULT_TIMEOUT};
//! use github_milestones::types::MilestoneState;
//!
//! let client = GitHubClient::connect("https://api.github.com", &token, DEFAULT_TIMEOUT)?;
//! let repo = client.get_repository("owner/repo").await?;
//! let open = client.list_milestones(&repo, MilestoneState::Open).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::error::{ServiceError, ServiceResult};
use super::MilestoneService;
use crate::types::{CreateMilestone, EditMilestone, Milestone, MilestoneState, Repository};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path prefix of the REST API on GitHub Enterprise hosts
pub const ENTERPRISE_API_PATH: &str = "/api/v3";

/// Host serving the public GitHub REST API
pub const PUBLIC_API_HOST: &str = "api.github.com";

const MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("github-milestones/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: u32 = 100;
const BODY_PREVIEW_LEN: usize = 200;

/// Upper bound on pages fetched by one listing
pub const MAX_PAGES: usize = 50;

/// Base URL of the REST API served for `hostname`
///
/// The public API lives at the host root; Enterprise hosts serve it under
/// [`ENTERPRISE_API_PATH`].
pub fn api_base_url(hostname: &str) -> String {
    if hostname == PUBLIC_API_HOST {
        format!("https://{}", hostname)
    } else {
        format!("https://{}{}", hostname, ENTERPRISE_API_PATH)
    }
}

/// GitHub REST API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Build a client for `api_base_url` authenticating with `token`
    ///
    /// No request is made; authentication problems surface on the first call.
    #[instrument(skip(token))]
    pub fn connect(api_base_url: &str, token: &str, timeout: Duration) -> ServiceResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("token {}", token))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// API base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn milestones_url(&self, repository: &Repository) -> String {
        format!("{}/repos/{}/milestones", self.base_url, repository.full_name)
    }

    /// Send a request and deserialize a successful response body
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        expected: &'static str,
    ) -> ServiceResult<T> {
        let (value, _) = self.send_with_headers(request, expected).await?;
        Ok(value)
    }

    /// Like [`send`](Self::send), also returning the response headers
    async fn send_with_headers<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        expected: &'static str,
    ) -> ServiceResult<(T, HeaderMap)> {
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body: Value = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| status.canonical_reason())
                .unwrap_or("unknown error")
                .to_string();

            debug!(status = status.as_u16(), message = %message, "GitHub API request failed");
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
                body,
            });
        }

        let value = serde_json::from_slice(&bytes).map_err(|source| {
            ServiceError::MalformedResponse {
                expected,
                actual: preview(&bytes),
                source,
            }
        })?;

        Ok((value, headers))
    }

    /// `rel="next"` target of the `Link` header, if it stays on this API
    fn next_page_url(&self, headers: &HeaderMap) -> Option<String> {
        let url = next_link(headers)?;
        if url.starts_with(&self.base_url) {
            Some(url)
        } else {
            warn!(url = %url, "Ignoring pagination link outside the API base URL");
            None
        }
    }
}

/// Parse the `rel="next"` URL out of a `Link` header
fn next_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;

    link.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params.split(';').any(|p| p.trim() == r#"rel="next""#);
        if !is_next {
            return None;
        }
        let url = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(url.to_string())
    })
}

fn preview(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.into_owned(),
    }
}

/// Due date in the UTC form the API stores
fn format_due_on(due_on: &DateTime<FixedOffset>) -> String {
    due_on
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl MilestoneService for GitHubClient {
    #[instrument(skip(self))]
    async fn get_repository(&self, full_name: &str) -> ServiceResult<Repository> {
        let url = format!("{}/repos/{}", self.base_url, full_name);
        debug!("GET {}", url);

        self.send(self.http.get(&url), "repository object").await
    }

    #[instrument(skip(self, repository), fields(repository = %repository.full_name))]
    async fn list_milestones(
        &self,
        repository: &Repository,
        state: MilestoneState,
    ) -> ServiceResult<Vec<Milestone>> {
        let url = self.milestones_url(repository);
        let mut request = self
            .http
            .get(&url)
            .query(&[("state", state.as_str())])
            .query(&[("per_page", PAGE_SIZE), ("page", 1)]);
        let mut milestones = Vec::new();

        for page in 1..=MAX_PAGES {
            debug!(page, "GET {}", url);

            let (batch, headers): (Vec<Milestone>, _) = self
                .send_with_headers(request, "array of milestones")
                .await?;
            milestones.extend(batch);

            match self.next_page_url(&headers) {
                Some(next) => request = self.http.get(next),
                None => return Ok(milestones),
            }
        }

        warn!(
            pages = MAX_PAGES,
            count = milestones.len(),
            "Stopped listing milestones at the page limit"
        );
        Ok(milestones)
    }

    #[instrument(skip(self, repository, milestone), fields(repository = %repository.full_name, number = milestone.number))]
    async fn edit_milestone_state(
        &self,
        repository: &Repository,
        milestone: &Milestone,
        state: MilestoneState,
    ) -> ServiceResult<()> {
        let url = format!("{}/{}", self.milestones_url(repository), milestone.number);
        debug!("PATCH {}", url);

        let body = EditMilestone {
            title: &milestone.title,
            state,
        };
        let _: Milestone = self
            .send(self.http.patch(&url).json(&body), "milestone object")
            .await?;

        Ok(())
    }

    #[instrument(skip(self, repository), fields(repository = %repository.full_name))]
    async fn create_milestone(
        &self,
        repository: &Repository,
        title: &str,
        state: MilestoneState,
        due_on: Option<DateTime<FixedOffset>>,
    ) -> ServiceResult<Milestone> {
        let url = self.milestones_url(repository);
        debug!("POST {}", url);

        let body = CreateMilestone {
            title,
            state,
            due_on: due_on.as_ref().map(format_due_on),
        };

        self.send(self.http.post(&url).json(&body), "milestone object")
            .await
    }
}
