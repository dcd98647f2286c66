//! GitHub repository service
//!
//! The [`MilestoneService`] trait is the seam between the orchestrator and the
//! remote issue tracker; [`GitHubClient`] implements it over the REST API.

pub mod client;
pub mod error;

pub use client::{api_base_url, GitHubClient, DEFAULT_TIMEOUT};
pub use error::{ServiceError, ServiceErrorKind, ServiceResult};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::types::{Milestone, MilestoneState, Repository};

/// Milestone operations against a remote repository
#[async_trait]
pub trait MilestoneService: Send + Sync {
    /// Resolve an `owner/name` repository identifier
    async fn get_repository(&self, full_name: &str) -> ServiceResult<Repository>;

    /// List every milestone in the given state
    async fn list_milestones(
        &self,
        repository: &Repository,
        state: MilestoneState,
    ) -> ServiceResult<Vec<Milestone>>;

    /// Move a milestone to a new state
    async fn edit_milestone_state(
        &self,
        repository: &Repository,
        milestone: &Milestone,
        state: MilestoneState,
    ) -> ServiceResult<()>;

    /// Create a milestone
    async fn create_milestone(
        &self,
        repository: &Repository,
        title: &str,
        state: MilestoneState,
        due_on: Option<DateTime<FixedOffset>>,
    ) -> ServiceResult<Milestone>;
}
