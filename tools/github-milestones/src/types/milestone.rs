//! Milestone type definitions
//!
//! Structs representing GitHub milestone data as returned by
//! `GET /repos/{owner}/{repo}/milestones`, plus the request bodies used to
//! create and edit milestones.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::User;

/// Milestone state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    Open,
    Closed,
}

impl MilestoneState {
    /// Value used in query strings and request bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneState::Open => "open",
            MilestoneState::Closed => "closed",
        }
    }
}

impl fmt::Display for MilestoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a GitHub milestone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone ID
    pub id: u64,

    /// Milestone number (unique within repository)
    pub number: u64,

    /// Milestone title
    pub title: String,

    /// Milestone description
    #[serde(default)]
    pub description: Option<String>,

    /// Milestone state (open/closed)
    pub state: MilestoneState,

    /// API URL
    #[serde(default)]
    pub url: Option<String>,

    /// Milestone URL on GitHub
    #[serde(default)]
    pub html_url: Option<String>,

    /// Milestone creator
    #[serde(default)]
    pub creator: Option<User>,

    /// Number of open issues
    #[serde(default)]
    pub open_issues: u32,

    /// Number of closed issues
    #[serde(default)]
    pub closed_issues: u32,

    /// Creation timestamp (ISO 8601)
    pub created_at: String,

    /// Last update timestamp (ISO 8601)
    pub updated_at: String,

    /// Due timestamp (ISO 8601), if set
    #[serde(default)]
    pub due_on: Option<String>,
}

impl Milestone {
    /// Due timestamp, if present and well-formed
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        let due_on = self.due_on.as_deref()?;
        DateTime::parse_from_rfc3339(due_on)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// Short multi-line description used when closing a milestone
    pub fn summary(&self) -> String {
        [
            format!("Title: {}.", self.title),
            format!("Number: {}.", self.number),
            format!("ID: {}.", self.id),
            format!("Due On: {}.", self.due_on.as_deref().unwrap_or("none")),
        ]
        .join("\n")
    }

    /// Full multi-line description used for debug display
    pub fn details(&self) -> String {
        let creator = match &self.creator {
            Some(User {
                login,
                name: Some(name),
            }) => format!("{} ({})", login, name),
            Some(User { login, name: None }) => login.clone(),
            None => "unknown".to_string(),
        };

        [
            "Milestone:".to_string(),
            format!("Title: {}.", self.title),
            format!("Number: {}.", self.number),
            format!("State: {}.", self.state),
            format!("ID: {}.", self.id),
            format!("URL: {}.", self.html_url.as_deref().unwrap_or("none")),
            format!("Creator: {}.", creator),
            format!("Due On: {}.", self.due_on.as_deref().unwrap_or("none")),
            format!("Created At: {}.", self.created_at),
            format!("Updated At: {}.", self.updated_at),
            format!("Open Issues: {}.", self.open_issues),
            format!("Closed Issues: {}.", self.closed_issues),
        ]
        .join("\n")
    }
}

/// Request body for `POST /repos/{owner}/{repo}/milestones`
#[derive(Debug, Serialize)]
pub struct CreateMilestone<'a> {
    pub title: &'a str,
    pub state: MilestoneState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
}

/// Request body for `PATCH /repos/{owner}/{repo}/milestones/{number}`
#[derive(Debug, Serialize)]
pub struct EditMilestone<'a> {
    pub title: &'a str,
    pub state: MilestoneState,
}

#[cfg(test)]
pub(crate) fn test_milestone(number: u64, due_on: Option<&str>) -> Milestone {
    Milestone {
        id: 1000 + number,
        number,
        title: format!("Milestone {}", number),
        description: None,
        state: MilestoneState::Open,
        url: None,
        html_url: None,
        creator: None,
        open_issues: 0,
        closed_issues: 0,
        created_at: "2019-01-01T00:00:00Z".to_string(),
        updated_at: "2019-01-01T00:00:00Z".to_string(),
        due_on: due_on.map(str::to_string),
    }
}
