//! Common types shared across GitHub entities

use serde::{Deserialize, Serialize};

/// Represents a GitHub user (repository owner, milestone creator)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// GitHub login/username
    pub login: String,

    /// User's display name (may be empty)
    #[serde(default)]
    pub name: Option<String>,
}
