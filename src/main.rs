use anyhow::Result;
use clap::Parser;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod config;
mod db;
mod odds;
mod qualifier;
mod scanner;
mod tennis;

use config::Config;
use db::Database;
use odds::{H2hTotalsAnalyzer, LiveSportOddsClient, OddsProvider};
use scanner::{EventSource, JsonFileSource, ScanEngine, ScanSummary};
use tennis::WeightedTennisAnalyzer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Initialise tracing / logging
    let default_filter = if config.verbose { "info,h2h_scout=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    config.validate()?;
    let run_date = config.run_date();
    info!(
        "Scanning for {} ({} focus, odds {})",
        run_date,
        config.focus(),
        if config.skip_odds { "off" } else { "on" }
    );

    // Open database
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    let odds: Option<Arc<dyn OddsProvider>> = if config.skip_odds {
        None
    } else {
        Some(Arc::new(LiveSportOddsClient::new(
            &config.odds_api_url,
            &config.bookmaker_id,
            config.request_timeout(),
        )?))
    };

    let engine = ScanEngine::new(
        config.engine_config(),
        odds,
        Arc::new(H2hTotalsAnalyzer),
        Arc::new(WeightedTennisAnalyzer),
    );

    let source = JsonFileSource::new(&config.input);
    let events = source.load().await?;
    let selected: Vec<_> = events
        .iter()
        .filter(|e| config.wants_sport(e.context.sport))
        .collect();
    info!(
        "Loaded {} event(s) from {}, {} selected",
        events.len(),
        source.name(),
        selected.len()
    );

    let mut summary = ScanSummary::default();
    for (i, event) in selected.iter().enumerate() {
        // Spread odds requests out a little between events.
        if i > 0 && !config.skip_odds {
            let pause = rand::thread_rng().gen_range(config.jitter_min_ms..=config.jitter_max_ms);
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }

        let report = engine.process(event, run_date).await;
        summary.record(&report);

        if config.only_qualifying && !report.qualifies() {
            continue;
        }
        if let Err(e) = db.insert_verdict(&report) {
            error!(
                "Failed to store verdict for {}: {:#}",
                report.context.match_url, e
            );
        }
    }

    info!(
        "Done: {} processed, {} qualifying ({} tennis), {} with odds, {} O/U picks",
        summary.processed,
        summary.qualifying,
        summary.tennis,
        summary.with_odds,
        summary.over_under_qualifying
    );

    let stored = db.count_qualifying(run_date)?;
    info!("{} qualifying event(s) stored for {}", stored, run_date);
    for report in db.list_verdicts(run_date)?.iter().filter(|r| r.qualifies()) {
        info!(
            "  ✅ {} {} vs {} {}",
            report.context.sport,
            report.context.home_team,
            report.context.away_team,
            report.context.match_url
        );
    }

    Ok(())
}
