//! GitHub Milestones Library
//!
//! Creates GitHub milestones and closes overdue ones through the GitHub REST
//! API (public GitHub or GitHub Enterprise).
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use github_milestones::{GitHubClient, MilestoneOrchestrator, RunRequest};
//!
//! let mut request = RunRequest::new("owner/repo");
//! request.close_milestones = true;
//!
//! let report = MilestoneOrchestrator::new(&request)
//!     .run(std::env::var("GITHUB_ACCESS_TOKEN").ok(), GitHubClient::connect)
//!     .await?;
//! println!("closed {} milestones", report.closed);
//! ```
//!
//! # Features
//! - Due dates: strict ISO 8601 layout check before any network call
//! - Closing: every open milestone strictly past its due date
//! - Creating: one milestone per run, with optional due date
//!
//! # Requirements
//! - `GITHUB_ACCESS_TOKEN` set to a token with write access to the repository

pub mod cli;
pub mod due_date;
pub mod github;
pub mod orchestrator;
pub mod policy;
pub mod request;
pub mod types;

#[cfg(test)]
mod test_logs;

pub use github::{GitHubClient, MilestoneService, ServiceError, ServiceErrorKind};
pub use orchestrator::{
    CreateOutcome, MilestoneOrchestrator, RunError, RunReport, ACCESS_TOKEN_VAR,
};
pub use request::{ApiHost, RunRequest};
