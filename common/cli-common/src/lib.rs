//! CLI Common - Shared utilities for command-line tools
//!
//! This crate provides functionality shared by the workspace's tools:
//!
//! - **Initialization**: [`init_tracing`] for standardized logging setup
//! - **Levels**: [`LogLevel`], the fixed set of log level names accepted on
//!   the command line
//!
//! # Example
//!
//! ```rust,ignore
//! use cli_common::{init_tracing, LogLevel};
//!
//! init_tracing("my_tool", LogLevel::Debug)?;
//! tracing::debug!("logging ready");
//! ```

pub mod init;
pub mod level;

pub use init::init_tracing;
pub use level::LogLevel;
