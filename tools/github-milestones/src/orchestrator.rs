//! Milestone run sequencing
//!
//! A run is a fixed sequence of steps:
//!
//! 1. Check that an access token is available
//! 2. Check the due date layout (when one was given)
//! 3. Connect to the API
//! 4. Resolve the repository
//! 5. List open milestones
//! 6. Close overdue milestones (when requested)
//! 7. Create a milestone (when requested)
//!
//! Failures in steps 1-5 end the run with a [`RunError`]. Failures while
//! closing or creating milestones are logged and the run carries on; the
//! [`RunReport`] records how many succeeded.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, enabled, error, info, trace, warn, Level};

use crate::due_date::{self, DueDateError};
use crate::github::{MilestoneService, ServiceError, ServiceResult};
use crate::policy::select_overdue;
use crate::request::RunRequest;
use crate::types::{Milestone, MilestoneState, Repository};

/// Environment variable holding the GitHub access token
pub const ACCESS_TOKEN_VAR: &str = "GITHUB_ACCESS_TOKEN";

/// Conditions that end a run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("environment variable not defined: {0}")]
    MissingToken(&'static str),

    #[error("the specified GitHub milestone due date is invalid: {0}")]
    InvalidDueDate(#[source] DueDateError),

    #[error("failed to connect to GitHub API v3: {url}")]
    Connect {
        url: String,
        #[source]
        source: ServiceError,
    },

    #[error("failed to retrieve GitHub repository: {repository}")]
    Repository {
        repository: String,
        #[source]
        source: ServiceError,
    },

    #[error("failed to retrieve all open GitHub milestones")]
    Milestones(#[source] ServiceError),
}

impl RunError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Underlying API error, if the failure came from the API
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            RunError::Connect { source, .. } | RunError::Repository { source, .. } => Some(source),
            RunError::Milestones(source) => Some(source),
            RunError::MissingToken(_) | RunError::InvalidDueDate(_) => None,
        }
    }

    /// Log this error with all available diagnostic context
    pub fn log(&self) {
        error!("{}", self);

        if let Some(source) = self.service_error() {
            source.log_diagnostics();
        }
    }
}

/// Result of the milestone creation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// No milestone name was given
    NotRequested,
    /// The milestone was created with this number
    Created { number: u64 },
    /// Creation was attempted and failed
    Failed,
}

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Open milestones found
    pub open_milestones: usize,
    /// Open milestones that were past due
    pub overdue: usize,
    /// Overdue milestones closed successfully
    pub closed: usize,
    /// Overdue milestones that could not be closed
    pub close_failures: usize,
    /// Outcome of milestone creation
    pub created: CreateOutcome,
}

impl RunReport {
    fn new(open_milestones: usize) -> Self {
        Self {
            open_milestones,
            overdue: 0,
            closed: 0,
            close_failures: 0,
            created: CreateOutcome::NotRequested,
        }
    }
}

/// Sequences one run for a [`RunRequest`]
pub struct MilestoneOrchestrator<'a> {
    request: &'a RunRequest,
}

impl<'a> MilestoneOrchestrator<'a> {
    pub fn new(request: &'a RunRequest) -> Self {
        Self { request }
    }

    /// Check preconditions that need no network access
    ///
    /// Returns the access token to connect with.
    pub fn validate(&self, token: Option<String>) -> Result<String, RunError> {
        trace!(
            tool_version = env!("CARGO_PKG_VERSION"),
            "Validating environment"
        );

        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(RunError::MissingToken(ACCESS_TOKEN_VAR))?;

        if let Some(date) = &self.request.milestone_due_date {
            due_date::validate(date).map_err(RunError::InvalidDueDate)?;
        }

        Ok(token)
    }

    /// Validate, connect with `connect`, then [`execute`](Self::execute)
    pub async fn run<S, F>(&self, token: Option<String>, connect: F) -> Result<RunReport, RunError>
    where
        S: MilestoneService,
        F: FnOnce(&str, &str, Duration) -> ServiceResult<S>,
    {
        let token = self.validate(token)?;

        let url = self.request.api_base_url();
        info!("Connecting to GitHub API v3: {}...", url);

        let service = match connect(&url, &token, self.request.timeout) {
            Ok(service) => service,
            Err(source) => return Err(RunError::Connect { url, source }),
        };

        info!("Successfully connected to GitHub API v3: {}.", url);

        self.execute(&service, Utc::now()).await
    }

    /// Run the remote steps against `service`, judging due dates at `now`
    pub async fn execute<S>(&self, service: &S, now: DateTime<Utc>) -> Result<RunReport, RunError>
    where
        S: MilestoneService + ?Sized,
    {
        let repository = self.fetch_repository(service).await?;
        let open = fetch_open_milestones(service, &repository).await?;

        let mut report = RunReport::new(open.len());

        if self.request.close_milestones && !open.is_empty() {
            let summary = close_overdue(service, &repository, &open, now).await;
            report.overdue = summary.overdue;
            report.closed = summary.closed;
            report.close_failures = summary.failed;
        }

        if let Some(name) = &self.request.milestone_name {
            report.created = self.create_milestone(service, &repository, name).await;
        }

        Ok(report)
    }

    async fn fetch_repository<S>(&self, service: &S) -> Result<Repository, RunError>
    where
        S: MilestoneService + ?Sized,
    {
        let name = &self.request.repository;
        info!("Retrieving GitHub repository: {}...", name);

        let repository = service
            .get_repository(name)
            .await
            .map_err(|source| RunError::Repository {
                repository: name.clone(),
                source,
            })?;

        info!("Successfully retrieved GitHub repository: {}.", name);
        Ok(repository)
    }

    async fn create_milestone<S>(
        &self,
        service: &S,
        repository: &Repository,
        name: &str,
    ) -> CreateOutcome
    where
        S: MilestoneService + ?Sized,
    {
        let due_date = self.request.milestone_due_date.as_deref();
        let content = format!(
            "Name: {}.\nDue Date: {}.",
            name,
            due_date.unwrap_or("none")
        );

        info!("Creating new GitHub milestone...\n{}", content);

        let due_on = match due_date.map(due_date::parse).transpose() {
            Ok(due_on) => due_on,
            Err(e) => {
                error!(error = %e, "Failed to parse ISO 8601 date");
                error!("Failed to create GitHub milestone.\n{}", content);
                return CreateOutcome::Failed;
            }
        };

        match service
            .create_milestone(repository, name, MilestoneState::Open, due_on)
            .await
        {
            Ok(milestone) => {
                info!(
                    number = milestone.number,
                    "Successfully created new GitHub milestone.\n{}", content
                );
                CreateOutcome::Created {
                    number: milestone.number,
                }
            }
            Err(e) => {
                error!("Failed to create GitHub milestone.\n{}", content);
                e.log_diagnostics();
                CreateOutcome::Failed
            }
        }
    }
}

async fn fetch_open_milestones<S>(
    service: &S,
    repository: &Repository,
) -> Result<Vec<Milestone>, RunError>
where
    S: MilestoneService + ?Sized,
{
    info!("Retrieving all open GitHub milestones...");

    let milestones = service
        .list_milestones(repository, MilestoneState::Open)
        .await
        .map_err(RunError::Milestones)?;

    info!(
        "Successfully retrieved all open GitHub milestones: {}.",
        milestones.len()
    );

    if enabled!(Level::DEBUG) {
        for milestone in &milestones {
            debug!("{}", milestone.details());
        }
    }

    Ok(milestones)
}

/// Counts from one closing pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseSummary {
    pub overdue: usize,
    pub closed: usize,
    pub failed: usize,
}

/// Close every overdue milestone, continuing past individual failures
pub async fn close_overdue<S>(
    service: &S,
    repository: &Repository,
    milestones: &[Milestone],
    now: DateTime<Utc>,
) -> CloseSummary
where
    S: MilestoneService + ?Sized,
{
    info!("Closing overdue GitHub milestones ({})...", now);

    let overdue = select_overdue(milestones, now);
    let mut summary = CloseSummary {
        overdue: overdue.len(),
        ..CloseSummary::default()
    };

    for milestone in overdue {
        let content = milestone.summary();
        info!("Closing GitHub milestone...\n{}", content);

        match service
            .edit_milestone_state(repository, milestone, MilestoneState::Closed)
            .await
        {
            Ok(()) => {
                summary.closed += 1;
                info!("Successfully closed GitHub milestone.\n{}", content);
            }
            Err(e) => {
                summary.failed += 1;
                error!(
                    number = milestone.number,
                    url = milestone.html_url.as_deref().unwrap_or("none"),
                    "Failed to close GitHub milestone.\n{}",
                    content
                );
                e.log_diagnostics();
            }
        }
    }

    if summary.overdue == 0 {
        info!("No overdue GitHub milestones found.");
    } else {
        info!(
            "Successfully closed overdue GitHub milestones: {}.",
            summary.closed
        );
        if summary.failed > 0 {
            warn!(
                "Failed to close overdue GitHub milestones: {}.",
                summary.failed
            );
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::milestone::test_milestone;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use crate::test_logs::CapturedLogs;
    use std::sync::Mutex;

    fn api_error(status: u16) -> ServiceError {
        ServiceError::Api {
            status,
            message: "boom".to_string(),
            body: serde_json::json!({"message": "boom"}),
        }
    }

    fn malformed() -> ServiceError {
        ServiceError::MalformedResponse {
            expected: "array of milestones",
            actual: "{}".to_string(),
            source: serde_json::from_str::<Vec<u32>>("{}").unwrap_err(),
        }
    }

    #[derive(Default)]
    struct FakeService {
        milestones: Vec<Milestone>,
        fail_repository: bool,
        fail_list: bool,
        malformed_list: bool,
        fail_close: Vec<u64>,
        fail_create: bool,
        calls: Mutex<Vec<String>>,
        created: Mutex<Vec<(String, Option<DateTime<FixedOffset>>)>>,
    }

    impl FakeService {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl MilestoneService for FakeService {
        async fn get_repository(&self, full_name: &str) -> ServiceResult<Repository> {
            self.record(format!("get_repository {}", full_name));
            if self.fail_repository {
                return Err(api_error(404));
            }
            Ok(serde_json::from_value(serde_json::json!({
                "id": 1,
                "name": "widgets",
                "full_name": full_name,
                "owner": {"login": "octo"}
            }))
            .unwrap())
        }

        async fn list_milestones(
            &self,
            _repository: &Repository,
            state: MilestoneState,
        ) -> ServiceResult<Vec<Milestone>> {
            self.record(format!("list_milestones {}", state));
            if self.fail_list {
                return Err(api_error(500));
            }
            if self.malformed_list {
                return Err(malformed());
            }
            Ok(self.milestones.clone())
        }

        async fn edit_milestone_state(
            &self,
            _repository: &Repository,
            milestone: &Milestone,
            state: MilestoneState,
        ) -> ServiceResult<()> {
            self.record(format!("edit {} {}", milestone.number, state));
            if self.fail_close.contains(&milestone.number) {
                return Err(api_error(422));
            }
            Ok(())
        }

        async fn create_milestone(
            &self,
            _repository: &Repository,
            title: &str,
            state: MilestoneState,
            due_on: Option<DateTime<FixedOffset>>,
        ) -> ServiceResult<Milestone> {
            self.record(format!("create {} {}", title, state));
            if self.fail_create {
                return Err(api_error(422));
            }
            self.created
                .lock()
                .unwrap()
                .push((title.to_string(), due_on));
            Ok(test_milestone(42, None))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn closing_request() -> RunRequest {
        let mut request = RunRequest::new("octo/widgets");
        request.close_milestones = true;
        request
    }

    fn token() -> Option<String> {
        Some("secret".to_string())
    }

    #[tokio::test]
    async fn test_closes_overdue_only() {
        let service = FakeService {
            milestones: vec![
                test_milestone(1, Some("2019-01-01T00:00:00Z")),
                test_milestone(2, Some("2030-01-01T00:00:00Z")),
                test_milestone(3, None),
            ],
            ..Default::default()
        };
        let request = closing_request();

        let report = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap();

        assert_eq!(report.open_milestones, 3);
        assert_eq!(report.overdue, 1);
        assert_eq!(report.closed, 1);
        assert_eq!(report.close_failures, 0);
        assert_eq!(
            service.calls(),
            vec![
                "get_repository octo/widgets",
                "list_milestones open",
                "edit 1 closed"
            ]
        );
    }

    #[tokio::test]
    async fn test_close_failure_does_not_stop_remaining() {
        let service = FakeService {
            milestones: vec![
                test_milestone(1, Some("2019-01-01T00:00:00Z")),
                test_milestone(2, Some("2019-02-01T00:00:00Z")),
                test_milestone(3, Some("2019-03-01T00:00:00Z")),
            ],
            fail_close: vec![2],
            ..Default::default()
        };
        let request = closing_request();

        let report = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap();

        assert_eq!(report.overdue, 3);
        assert_eq!(report.closed, 2);
        assert_eq!(report.close_failures, 1);
        let edits: Vec<String> = service
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("edit"))
            .collect();
        assert_eq!(edits, vec!["edit 1 closed", "edit 2 closed", "edit 3 closed"]);
    }

    #[tokio::test]
    async fn test_no_closing_without_flag() {
        let service = FakeService {
            milestones: vec![test_milestone(1, Some("2019-01-01T00:00:00Z"))],
            ..Default::default()
        };
        let request = RunRequest::new("octo/widgets");

        let report = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap();

        assert_eq!(report.closed, 0);
        assert!(!service.calls().iter().any(|c| c.starts_with("edit")));
    }

    #[tokio::test]
    async fn test_no_open_milestones_is_success() {
        let service = FakeService::default();
        let request = closing_request();

        let report = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap();

        assert_eq!(report.open_milestones, 0);
        assert_eq!(report.overdue, 0);
        assert_eq!(report.created, CreateOutcome::NotRequested);
    }

    #[tokio::test]
    async fn test_repository_failure_is_fatal() {
        let service = FakeService {
            fail_repository: true,
            ..Default::default()
        };
        let request = closing_request();

        let err = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Repository { .. }));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.service_error().and_then(|e| e.status()), Some(404));
        assert_eq!(service.calls(), vec!["get_repository octo/widgets"]);
    }

    #[tokio::test]
    async fn test_list_failure_is_fatal() {
        let service = FakeService {
            fail_list: true,
            ..Default::default()
        };
        let mut request = closing_request();
        request.milestone_name = Some("Sprint 1".to_string());

        let err = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Milestones(_)));
        assert!(!service.calls().iter().any(|c| c.starts_with("create")));
    }

    #[tokio::test]
    async fn test_malformed_list_is_fatal() {
        let service = FakeService {
            malformed_list: true,
            ..Default::default()
        };
        let request = closing_request();

        let err = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Milestones(_)));
    }

    #[tokio::test]
    async fn test_creates_milestone_with_due_date() {
        let service = FakeService::default();
        let mut request = RunRequest::new("octo/widgets");
        request.milestone_name = Some("MVP 3.0".to_string());
        request.milestone_due_date = Some("2019-07-31T23:59:59-04:00".to_string());

        let report = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap();

        assert_eq!(report.created, CreateOutcome::Created { number: 42 });
        let created = service.created.lock().unwrap().clone();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, "MVP 3.0");
        let due_on = created[0].1.unwrap();
        assert_eq!(
            due_on.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2019, 8, 1, 3, 59, 59).unwrap()
        );
    }

    #[tokio::test]
    async fn test_creates_milestone_without_due_date() {
        let service = FakeService::default();
        let mut request = RunRequest::new("octo/widgets");
        request.milestone_name = Some("Backlog".to_string());

        let report = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap();

        assert_eq!(report.created, CreateOutcome::Created { number: 42 });
        assert_eq!(service.created.lock().unwrap()[0].1, None);
    }

    #[tokio::test]
    async fn test_create_failure_is_not_fatal() {
        let service = FakeService {
            fail_create: true,
            ..Default::default()
        };
        let mut request = RunRequest::new("octo/widgets");
        request.milestone_name = Some("MVP 3.0".to_string());

        let report = MilestoneOrchestrator::new(&request)
            .execute(&service, now())
            .await
            .unwrap();

        assert_eq!(report.created, CreateOutcome::Failed);
    }

    #[tokio::test]
    async fn test_unparseable_due_date_skips_create_call() {
        let service = FakeService::default();
        let mut request = RunRequest::new("octo/widgets");
        request.milestone_name = Some("MVP 3.0".to_string());
        request.milestone_due_date = Some("2019-13-31T23:59:59-04:00".to_string());

        let orchestrator = MilestoneOrchestrator::new(&request);
        assert!(orchestrator.validate(token()).is_ok());

        let report = orchestrator.execute(&service, now()).await.unwrap();
        assert_eq!(report.created, CreateOutcome::Failed);
        assert!(!service.calls().iter().any(|c| c.starts_with("create")));
    }

    #[tokio::test]
    async fn test_missing_token_stops_before_connect() {
        let request = closing_request();
        let mut connected = false;

        let err = MilestoneOrchestrator::new(&request)
            .run(None, |_, _, _| {
                connected = true;
                Ok(FakeService::default())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::MissingToken(ACCESS_TOKEN_VAR)));
        assert!(!connected);
    }

    #[tokio::test]
    async fn test_blank_token_is_missing() {
        let request = closing_request();

        let err = MilestoneOrchestrator::new(&request)
            .run(Some("  ".to_string()), |_, _, _| Ok(FakeService::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::MissingToken(_)));
    }

    #[tokio::test]
    async fn test_bad_due_date_layout_stops_before_connect() {
        let mut request = closing_request();
        request.milestone_due_date = Some("2019-07-31 23:59:59".to_string());
        let mut connected = false;

        let err = MilestoneOrchestrator::new(&request)
            .run(token(), |_, _, _| {
                connected = true;
                Ok(FakeService::default())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::InvalidDueDate(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(!connected);
    }

    #[tokio::test]
    async fn test_connect_failure_is_fatal() {
        let request = closing_request();

        let err = MilestoneOrchestrator::new(&request)
            .run(token(), |_, _, _| -> ServiceResult<FakeService> {
                Err(api_error(401))
            })
            .await
            .unwrap_err();

        match err {
            RunError::Connect { url, source } => {
                assert_eq!(url, "https://github.ibm.com/api/v3");
                assert_eq!(source.status(), Some(401));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_passes_url_token_and_timeout() {
        let mut request = RunRequest::new("octo/widgets");
        request.host = crate::request::ApiHost::Public;
        request.timeout = Duration::from_secs(7);
        let mut seen = None;

        let report = MilestoneOrchestrator::new(&request)
            .run(token(), |url, token, timeout| {
                seen = Some((url.to_string(), token.to_string(), timeout));
                Ok(FakeService::default())
            })
            .await
            .unwrap();

        assert_eq!(report.open_milestones, 0);
        assert_eq!(
            seen,
            Some((
                "https://api.github.com".to_string(),
                "secret".to_string(),
                Duration::from_secs(7)
            ))
        );
    }

    #[test]
    fn test_validation_logs_tool_version() {
        let logs = CapturedLogs::default();
        let _guard = logs.install(Level::TRACE);

        let request = RunRequest::new("octo/widgets");
        MilestoneOrchestrator::new(&request)
            .validate(Some("token".to_string()))
            .unwrap();

        let output = logs.contents();
        assert!(output.contains("tool_version="), "{}", output);
        assert!(output.contains(env!("CARGO_PKG_VERSION")), "{}", output);
    }
}
