use chrono::{Local, NaiveDate};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::db::models::{FocusSide, Sport};
use crate::odds::livesport::DEFAULT_API_URL;
use crate::odds::provider::DEFAULT_BOOKMAKER_ID;

/// Head-to-head dominance scanner
#[derive(Parser, Debug, Clone)]
#[command(name = "h2h-scout", version, about)]
pub struct Config {
    /// Event file: a JSON array or JSON lines of events with their H2H records
    #[arg(long, env = "H2H_INPUT")]
    pub input: PathBuf,

    /// Run date the reports are filed under (YYYY-MM-DD, default today)
    #[arg(long, env = "RUN_DATE")]
    pub date: Option<NaiveDate>,

    /// Evaluate the away side's H2H dominance instead of the home side's
    #[arg(long, env = "AWAY_TEAM_FOCUS", default_value = "false")]
    pub away_team_focus: bool,

    /// Only process these sports (comma-separated, default all)
    #[arg(long, env = "SPORTS", value_delimiter = ',')]
    pub sports: Vec<Sport>,

    /// Only keep qualifying events in the database
    #[arg(long, env = "ONLY_QUALIFYING", default_value = "false")]
    pub only_qualifying: bool,

    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "h2h_scout.db")]
    pub database_path: String,

    /// Do not query the odds API
    #[arg(long, env = "SKIP_ODDS", default_value = "false")]
    pub skip_odds: bool,

    /// LiveSport bookmaker id (165 = Nordic Bet)
    #[arg(long, env = "BOOKMAKER_ID", default_value = DEFAULT_BOOKMAKER_ID)]
    pub bookmaker_id: String,

    /// LiveSport odds GraphQL endpoint
    #[arg(long, env = "ODDS_API_URL", default_value = DEFAULT_API_URL)]
    pub odds_api_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "10")]
    pub request_timeout_secs: u64,

    /// Minimum pause between events when fetching odds (milliseconds)
    #[arg(long, env = "JITTER_MIN_MS", default_value = "300")]
    pub jitter_min_ms: u64,

    /// Maximum pause between events when fetching odds (milliseconds)
    #[arg(long, env = "JITTER_MAX_MS", default_value = "900")]
    pub jitter_max_ms: u64,

    /// Log per-event detail (H2H rows, forms, tennis sub-scores)
    #[arg(short, long, env = "VERBOSE", default_value = "false")]
    pub verbose: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jitter_min_ms > self.jitter_max_ms {
            anyhow::bail!("jitter_min_ms must not exceed jitter_max_ms");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be positive");
        }
        if self.bookmaker_id.is_empty() || !self.bookmaker_id.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("bookmaker_id must be numeric, got {:?}", self.bookmaker_id);
        }
        if !self.skip_odds {
            url::Url::parse(&self.odds_api_url)
                .map_err(|e| anyhow::anyhow!("invalid odds_api_url {:?}: {}", self.odds_api_url, e))?;
        }
        if !self.input.is_file() {
            anyhow::bail!("input file {} does not exist", self.input.display());
        }
        Ok(())
    }

    pub fn run_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn focus(&self) -> FocusSide {
        if self.away_team_focus {
            FocusSide::Away
        } else {
            FocusSide::Home
        }
    }

    pub fn wants_sport(&self, sport: Sport) -> bool {
        self.sports.is_empty() || self.sports.contains(&sport)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            focus: self.focus(),
            verbose: self.verbose,
            odds_enabled: !self.skip_odds,
        }
    }
}

/// Per-run settings handed to the scan engine at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub focus: FocusSide,
    pub verbose: bool,
    pub odds_enabled: bool,
}

/// Per-event detail lines: `info` in verbose runs, `debug` otherwise.
pub fn log_detail(verbose: bool, args: fmt::Arguments<'_>) {
    if verbose {
        info!("{}", args);
    } else {
        debug!("{}", args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["h2h-scout", "--input", "events.json"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let c = parse(&[]);
        assert_eq!(c.focus(), FocusSide::Home);
        assert_eq!(c.bookmaker_id, "165");
        assert_eq!(c.odds_api_url, DEFAULT_API_URL);
        assert!(c.wants_sport(Sport::Handball));
        assert!(c.engine_config().odds_enabled);
    }

    #[test]
    fn test_focus_sports_and_date() {
        let c = parse(&[
            "--away-team-focus",
            "--sports",
            "football,tennis",
            "--date",
            "2024-03-01",
            "--skip-odds",
        ]);
        assert_eq!(c.focus(), FocusSide::Away);
        assert!(c.wants_sport(Sport::Tennis));
        assert!(!c.wants_sport(Sport::Basketball));
        assert_eq!(c.run_date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(!c.engine_config().odds_enabled);
    }

    #[test]
    fn test_unknown_sport_rejected() {
        let argv = ["h2h-scout", "--input", "e.json", "--sports", "curling"];
        assert!(Config::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_jitter_and_missing_input() {
        let c = parse(&["--jitter-min-ms", "1000", "--jitter-max-ms", "10"]);
        assert!(c.validate().is_err());
        let c = parse(&[]);
        // events.json is not present in the test working directory
        assert!(c.validate().is_err());
    }
}
