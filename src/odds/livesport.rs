use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::provider::{bet_types_for, bookmaker_name, OddsProvider};
use crate::db::models::{BttsOdds, MatchOdds, OverUnderOdds, Sport};

pub const DEFAULT_API_URL: &str = "https://global.ds.lsapp.eu/odds/pq_graphql";

const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/141.0.0.0 Safari/537.36";

/// Pre-match odds from the LiveSport GraphQL endpoint for a single bookmaker.
pub struct LiveSportOddsClient {
    http: Client,
    api_url: String,
    bookmaker_id: String,
}

impl LiveSportOddsClient {
    pub fn new(api_url: &str, bookmaker_id: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("pl-PL,pl;q=0.9,en;q=0.8"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://www.livesport.com"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.livesport.com/"));

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(LiveSportOddsClient {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            bookmaker_id: bookmaker_id.to_string(),
        })
    }

    /// The `findPrematchOddsForBookmaker` object for one bet type, or `None`
    /// when the endpoint has nothing for it.
    async fn fetch(&self, event_id: &str, bet_type: &str) -> Result<Option<Value>> {
        debug!("Fetching {} odds for event {}", bet_type, event_id);
        let url = Url::parse_with_params(
            &self.api_url,
            &[
                ("_hash", "ope2"),
                ("eventId", event_id),
                ("bookmakerId", self.bookmaker_id.as_str()),
                ("betType", bet_type),
                ("betScope", "FULL_TIME"),
            ],
        )
        .context("Invalid LiveSport odds URL")?;
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("LiveSport odds request failed")?;

        if !resp.status().is_success() {
            debug!("LiveSport odds {} for {}: HTTP {}", bet_type, event_id, resp.status());
            return Ok(None);
        }

        let raw: Value = resp
            .json()
            .await
            .context("Failed to parse LiveSport odds response")?;
        Ok(prematch_odds(&raw).cloned())
    }
}

#[async_trait]
impl OddsProvider for LiveSportOddsClient {
    fn name(&self) -> &str {
        "LiveSport"
    }

    async fn match_odds(&self, event_id: &str, sport: Sport) -> Result<Option<MatchOdds>> {
        let bookmaker = bookmaker_name(&self.bookmaker_id);
        for bet_type in bet_types_for(sport) {
            // A bet type the bookmaker does not offer is routine; try the next one.
            match self.fetch(event_id, bet_type).await {
                Ok(Some(data)) => {
                    if let Some(odds) = parse_match_odds(&data, bookmaker, bet_type) {
                        return Ok(Some(odds));
                    }
                }
                Ok(None) => {}
                Err(e) => debug!("{} odds for {} failed: {:#}", bet_type, event_id, e),
            }
        }
        Ok(None)
    }

    async fn over_under_odds(&self, event_id: &str, sport: Sport) -> Result<Option<OverUnderOdds>> {
        Ok(self
            .fetch(event_id, "OVER_UNDER")
            .await?
            .and_then(|data| parse_over_under(&data, sport)))
    }

    async fn btts_odds(&self, event_id: &str) -> Result<Option<BttsOdds>> {
        Ok(self
            .fetch(event_id, "BOTH_TEAMS_SCORE")
            .await?
            .and_then(|data| parse_btts(&data)))
    }
}

fn prematch_odds(raw: &Value) -> Option<&Value> {
    let data = raw.get("data")?.get("findPrematchOddsForBookmaker")?;
    match data {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        _ => Some(data),
    }
}

/// Decimal price of an outcome object: `{"value": "1.85"}` or `{"value": 1.85}`.
/// Zero and unparseable values count as absent.
fn outcome_price(outcome: &Value) -> Option<f64> {
    let value = &outcome["value"];
    let price = value
        .as_str()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .or_else(|| value.as_f64())?;
    (price > 0.0).then_some(price)
}

fn first_price(data: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| outcome_price(&data[*k]))
}

pub fn parse_match_odds(data: &Value, bookmaker: &str, bet_type: &str) -> Option<MatchOdds> {
    let home_odds = first_price(data, &["home", "team1", "1"])?;
    let away_odds = first_price(data, &["away", "team2", "2"])?;
    Some(MatchOdds {
        bookmaker_name: bookmaker.to_string(),
        bet_type_used: bet_type.to_string(),
        home_odds,
        draw_odds: outcome_price(&data["draw"]),
        away_odds,
    })
}

pub fn parse_over_under(data: &Value, sport: Sport) -> Option<OverUnderOdds> {
    let over = &data["over"];
    let over_odds = outcome_price(over)?;
    let under_odds = outcome_price(&data["under"])?;
    let line = match &over["line"] {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => "2.5".to_string(),
    };
    Some(OverUnderOdds {
        line,
        line_type: sport.ou_line_type(),
        over_odds,
        under_odds,
    })
}

pub fn parse_btts(data: &Value) -> Option<BttsOdds> {
    Some(BttsOdds {
        yes_odds: outcome_price(&data["yes"])?,
        no_odds: outcome_price(&data["no"])?,
    })
}
