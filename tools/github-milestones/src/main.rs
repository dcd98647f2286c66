//! GitHub Milestones
//!
//! Creates a GitHub milestone and/or closes overdue milestones in one
//! repository.
//!
//! # Usage
//!
//! ```bash
//! export GITHUB_ACCESS_TOKEN=<token>
//! github-milestones -c -o api.github.com -r owner/repo -m "Sprint 12" -t 2019-07-31T23:59:59-04:00
//! ```
//!
//! Exit status is 0 when the run completes (even if some milestones could not
//! be closed or created) and 1 on any fatal error.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use github_milestones::cli::{self, Cli};
use github_milestones::{GitHubClient, MilestoneOrchestrator, ACCESS_TOKEN_VAR};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return ExitCode::from(cli::report_parse_error(&e)),
    };

    if let Err(e) = cli_common::init_tracing("github_milestones", cli.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("[-- GITHUB MILESTONE GENERATOR ------------------------------------------------");

    let request = cli.run_request();
    request.log_summary();
    info!("Logging Level: {}.", cli.log_level);

    let token = std::env::var(ACCESS_TOKEN_VAR).ok();

    match MilestoneOrchestrator::new(&request)
        .run(token, GitHubClient::connect)
        .await
    {
        Ok(report) => {
            info!(
                open = report.open_milestones,
                overdue = report.overdue,
                closed = report.closed,
                close_failures = report.close_failures,
                created = ?report.created,
                "Run complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            e.log();
            let status = e.exit_code();
            error!("Fatal error encountered. Exit status: {}", status);
            ExitCode::from(status)
        }
    }
}
