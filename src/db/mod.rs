use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

pub mod models;
use models::*;

/// Thread-safe SQLite connection pool (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        self.conn()?.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    // ── Verdicts ─────────────────────────────────────────────────────────────

    /// Store a report, replacing any earlier one for the same event and run date.
    pub fn insert_verdict(&self, report: &EventReport) -> Result<()> {
        let row = VerdictColumns::from_report(report);
        let report_json = serde_json::to_string(report).context("Failed to encode report")?;
        let ctx = &report.context;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO verdicts (
                run_date, match_url, sport, home_team, away_team, match_time,
                kind, qualifies, focus, win_rate, wins, h2h_count, form_advantage,
                tennis_score, favorite, home_odds, draw_odds, away_odds,
                ou_line, ou_recommendation, ou_h2h_percentage, btts_qualifies,
                report_json, recorded_at
             ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21,?22,?23,?24)",
            params![
                report.run_date,
                ctx.match_url,
                ctx.sport.as_str(),
                ctx.home_team,
                ctx.away_team,
                ctx.match_time,
                row.kind,
                report.qualifies(),
                row.focus,
                row.win_rate,
                row.wins,
                row.h2h_count,
                row.form_advantage,
                row.tennis_score,
                row.favorite,
                report.odds.as_ref().map(|o| o.home_odds),
                report.odds.as_ref().and_then(|o| o.draw_odds),
                report.odds.as_ref().map(|o| o.away_odds),
                report.over_under.as_ref().map(|o| o.line),
                report
                    .over_under
                    .as_ref()
                    .and_then(|o| o.recommendation)
                    .map(|r| r.to_string()),
                report.over_under.as_ref().map(|o| o.h2h_over_percentage),
                report.over_under.as_ref().and_then(|o| o.btts_qualifies),
                report_json,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    /// All reports of one run date, qualifying first.
    pub fn list_verdicts(&self, run_date: NaiveDate) -> Result<Vec<EventReport>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT report_json FROM verdicts WHERE run_date = ?1
             ORDER BY qualifies DESC, match_time, id",
        )?;
        let rows = stmt
            .query_map(params![run_date], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.iter()
            .map(|json| serde_json::from_str(json).context("Corrupt report_json in verdicts"))
            .collect()
    }

    pub fn count_qualifying(&self, run_date: NaiveDate) -> Result<i64> {
        let conn = self.conn()?;
        let n = conn.query_row(
            "SELECT COUNT(*) FROM verdicts WHERE run_date = ?1 AND qualifies = 1",
            params![run_date],
            |r| r.get(0),
        )?;
        Ok(n)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

/// Flat queryable columns derived from the assessment.
struct VerdictColumns {
    kind: &'static str,
    focus: Option<String>,
    win_rate: Option<f64>,
    wins: Option<u32>,
    h2h_count: i64,
    form_advantage: Option<bool>,
    tennis_score: Option<f64>,
    favorite: Option<&'static str>,
}

impl VerdictColumns {
    fn from_report(report: &EventReport) -> Self {
        match &report.assessment {
            Assessment::Team(v) => VerdictColumns {
                kind: "team",
                focus: Some(v.focus.to_string()),
                win_rate: Some(v.win_rate),
                wins: Some(v.wins),
                h2h_count: v.h2h_count as i64,
                form_advantage: Some(v.form_advantage),
                tennis_score: None,
                favorite: None,
            },
            Assessment::Tennis(v) => VerdictColumns {
                kind: "tennis",
                focus: None,
                win_rate: None,
                wins: Some(v.player_a_wins),
                h2h_count: v.h2h_count as i64,
                form_advantage: None,
                tennis_score: Some(v.score),
                favorite: Some(match v.favorite {
                    TennisFavorite::PlayerA => "player_a",
                    TennisFavorite::PlayerB => "player_b",
                    TennisFavorite::Even => "even",
                }),
            },
        }
    }
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS verdicts (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    run_date           TEXT    NOT NULL,
    match_url          TEXT    NOT NULL,
    sport              TEXT    NOT NULL,
    home_team          TEXT    NOT NULL,
    away_team          TEXT    NOT NULL,
    match_time         TEXT,
    kind               TEXT    NOT NULL,
    qualifies          INTEGER NOT NULL,
    focus              TEXT,
    win_rate           REAL,
    wins               INTEGER,
    h2h_count          INTEGER NOT NULL,
    form_advantage     INTEGER,
    tennis_score       REAL,
    favorite           TEXT,
    home_odds          REAL,
    draw_odds          REAL,
    away_odds          REAL,
    ou_line            REAL,
    ou_recommendation  TEXT,
    ou_h2h_percentage  REAL,
    btts_qualifies     INTEGER,
    report_json        TEXT    NOT NULL,
    recorded_at        TEXT    NOT NULL,
    UNIQUE (run_date, match_url)
);

CREATE INDEX IF NOT EXISTS idx_verdicts_date ON verdicts(run_date, qualifies);
"#;
