//! Repository type definitions
//!
//! Structs representing GitHub repository data as returned by
//! `GET /repos/{owner}/{repo}`.

use serde::{Deserialize, Serialize};

use super::common::User;

/// Represents a GitHub repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Repository ID
    pub id: u64,

    /// Repository name (without owner)
    pub name: String,

    /// Full repository name with owner (e.g., "owner/repo")
    pub full_name: String,

    /// Repository owner
    pub owner: User,

    /// Repository description
    #[serde(default)]
    pub description: Option<String>,

    /// Repository URL on GitHub
    #[serde(default)]
    pub html_url: Option<String>,

    /// Whether repository is private
    #[serde(default)]
    pub private: bool,

    /// Whether repository is archived
    #[serde(default)]
    pub archived: bool,
}
