//! CLI argument definitions

use std::time::Duration;

use clap::Parser;
use cli_common::LogLevel;

use crate::request::{ApiHost, RunRequest};

const AFTER_HELP: &str = "\
=== Environment Variables ===

GITHUB_ACCESS_TOKEN : GitHub access token (required).
GITHUB_API_URL      : Override the API base URL derived from --hostname.
LOG_FORMAT          : Set to 'json' for structured log output.
RUST_LOG            : Additional tracing filter directives.

=== Examples ===

export GITHUB_ACCESS_TOKEN=<token>

github-milestones -c -o github.ibm.com -r owner/repo -m \"MVP 3.0 - July 2019\" -t 2019-07-31T23:59:59-04:00
";

#[derive(Parser, Debug)]
#[command(name = "github-milestones")]
#[command(version, about = "Create GitHub milestones and close overdue ones")]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Target GitHub API domain
    #[arg(short = 'o', long, value_enum, default_value_t = ApiHost::Enterprise)]
    pub hostname: ApiHost,

    /// Target GitHub repository (owner/name)
    #[arg(short, long, value_parser = parse_repository)]
    pub repository: String,

    /// Create a new GitHub milestone with the specified name
    #[arg(short, long)]
    pub milestone_name: Option<String>,

    /// Due date for the new milestone. Format: ISO 8601, e.g. 2019-07-31T23:59:59-04:00
    #[arg(short = 't', long)]
    pub milestone_due_date: Option<String>,

    /// Close all GitHub milestones that are overdue
    #[arg(short, long)]
    pub close_milestones: bool,

    /// Target logging level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Override the API base URL derived from --hostname
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "GITHUB_MILESTONES_TIMEOUT", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
}

impl Cli {
    /// Build the run request described by these arguments
    pub fn run_request(&self) -> RunRequest {
        RunRequest {
            host: self.hostname,
            api_url: self.api_url.clone(),
            repository: self.repository.clone(),
            milestone_name: self.milestone_name.clone(),
            milestone_due_date: self.milestone_due_date.clone(),
            close_milestones: self.close_milestones,
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

/// Print a clap parse failure and return the exit status for it
///
/// Help and version requests exit 0; every argument error exits 1.
pub fn report_parse_error(e: &clap::Error) -> u8 {
    if e.print().is_err() {
        eprintln!("{}", e);
    }
    if e.use_stderr() {
        1
    } else {
        0
    }
}

fn parse_repository(value: &str) -> Result<String, String> {
    match value.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(value.to_string())
        }
        _ => Err(format!("expected owner/name, got '{}'", value)),
    }
}
