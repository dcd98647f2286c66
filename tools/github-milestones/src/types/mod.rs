//! Type definitions for GitHub entities
//!
//! This module contains Rust structs that represent GitHub entities
//! as returned by the GitHub REST API in JSON format.

pub mod common;
pub mod milestone;
pub mod repo;

pub use common::User;
pub use milestone::{CreateMilestone, EditMilestone, Milestone, MilestoneState};
pub use repo::Repository;
