//! Coachdesk Server: operator entry point.
//!
//! ```text
//! coachdesk-server                                  run the attendance sweep until Ctrl-C
//! coachdesk-server issue-invite [note]              print a new coach invite token
//! coachdesk-server backfill <email> <weeks> <per>   seed attended history for a learner
//! ```

mod config;

use std::process::ExitCode;

use coachdesk_booking::{
    AttendanceTracker, BookingError, ScheduleLocks, HistoryBackfill, InviteRegistry,
};
use coachdesk_db::repository::{
    SurrealAvailabilityRepository, SurrealBookingRepository, SurrealCoachRepository,
    SurrealInviteTokenRepository, SurrealLearnerRepository,
};
use coachdesk_db::{DbError, DbManager};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ServerConfig};

#[derive(Debug, Error)]
enum ServerError {
    #[error("usage: {0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("signal handling failed: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Serve,
    IssueInvite { note: Option<String> },
    Backfill { email: String, weeks: u32, per_week: u32 },
}

impl Command {
    fn parse(args: &[String]) -> Result<Self, ServerError> {
        match args {
            [] => Ok(Command::Serve),
            [cmd, rest @ ..] if cmd == "issue-invite" => Ok(Command::IssueInvite {
                note: (!rest.is_empty()).then(|| rest.join(" ")),
            }),
            [cmd, email, weeks, per_week] if cmd == "backfill" => Ok(Command::Backfill {
                email: email.clone(),
                weeks: count("weeks", weeks)?,
                per_week: count("per_week", per_week)?,
            }),
            _ => Err(ServerError::Usage(
                "coachdesk-server [issue-invite [note] | backfill <email> <weeks> <per_week>]"
                    .into(),
            )),
        }
    }
}

fn count(name: &str, raw: &str) -> Result<u32, ServerError> {
    raw.parse()
        .map_err(|_| ServerError::Usage(format!("{name} must be a non-negative number, got {raw:?}")))
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coachdesk=info")),
        )
        .json()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "coachdesk-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<(), ServerError> {
    let command = Command::parse(args)?;
    let config = ServerConfig::from_env()?;
    let db = DbManager::connect(&config.db).await?;

    match command {
        Command::Serve => serve(&db, &config).await,
        Command::IssueInvite { note } => {
            let invites = InviteRegistry::new(
                SurrealInviteTokenRepository::new(db.handle()),
                config.scheduling.clone(),
            );
            let issued = invites.issue(note).await?;
            println!("{}", issued.value);
            Ok(())
        }
        Command::Backfill {
            email,
            weeks,
            per_week,
        } => {
            let backfill = HistoryBackfill::new(
                SurrealLearnerRepository::new(db.handle()),
                SurrealCoachRepository::new(db.handle()),
                SurrealAvailabilityRepository::new(db.handle()),
                SurrealBookingRepository::new(db.handle()),
                ScheduleLocks::new(),
            );
            let report = backfill.backfill_history(&email, weeks, per_week).await?;
            info!(%email, created = report.created, skipped = report.skipped, "backfill report");
            Ok(())
        }
    }
}

/// Close out stale bookings and purge dead invites every sweep interval.
async fn serve(db: &DbManager, config: &ServerConfig) -> Result<(), ServerError> {
    let tracker = AttendanceTracker::new(
        SurrealBookingRepository::new(db.handle()),
        config.scheduling.clone(),
    );
    let invites = InviteRegistry::new(
        SurrealInviteTokenRepository::new(db.handle()),
        config.scheduling.clone(),
    );

    let mut ticker = tokio::time::interval(config.sweep_interval());
    info!(interval_secs = config.sweep_interval_secs, "Coachdesk sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = tracker.sweep().await {
                    warn!(error = %e, "attendance sweep failed");
                }
                if let Err(e) = invites.purge_expired().await {
                    warn!(error = %e, "invite purge failed");
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    info!("Coachdesk sweeper stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn no_arguments_serves() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Serve);
    }

    #[test]
    fn issue_invite_joins_the_note() {
        assert_eq!(
            Command::parse(&args(&["issue-invite"])).unwrap(),
            Command::IssueInvite { note: None }
        );
        assert_eq!(
            Command::parse(&args(&["issue-invite", "for", "Tom"])).unwrap(),
            Command::IssueInvite {
                note: Some("for Tom".into())
            }
        );
    }

    #[test]
    fn backfill_needs_three_arguments() {
        assert_eq!(
            Command::parse(&args(&["backfill", "mia@example.com", "4", "2"])).unwrap(),
            Command::Backfill {
                email: "mia@example.com".into(),
                weeks: 4,
                per_week: 2,
            }
        );
        assert!(Command::parse(&args(&["backfill", "mia@example.com", "4"])).is_err());
        assert!(Command::parse(&args(&["backfill", "mia@example.com", "four", "2"])).is_err());
        assert!(Command::parse(&args(&["reset-db"])).is_err());
    }
}
