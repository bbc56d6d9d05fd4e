use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use crate::db::models::{BttsOdds, MatchOdds, OverUnderOdds, Sport};

/// Bet type for sports with a draw outcome.
pub const DEFAULT_BET_TYPE: &str = "HOME_DRAW_AWAY";

/// Bet types tried in order for sports without a draw, until one yields both
/// sides' prices.
pub const NO_DRAW_BET_TYPES: &[&str] = &["HOME_AWAY", "MATCH_WINNER", "HOME_DRAW_AWAY"];

pub const DEFAULT_BOOKMAKER_ID: &str = "165";

/// Trait that every pre-match odds source must implement.
///
/// `Ok(None)` means the market is not offered; `Err` is a transport or
/// payload failure. Callers degrade both to an empty field.
#[async_trait]
pub trait OddsProvider: Send + Sync {
    /// Match-winner prices (draw only where the sport has one).
    async fn match_odds(&self, event_id: &str, sport: Sport) -> Result<Option<MatchOdds>>;

    async fn over_under_odds(&self, event_id: &str, sport: Sport) -> Result<Option<OverUnderOdds>>;

    /// Both-teams-to-score prices. Only meaningful for football.
    async fn btts_odds(&self, event_id: &str) -> Result<Option<BttsOdds>>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

pub fn bet_types_for(sport: Sport) -> &'static [&'static str] {
    if sport.has_draw() {
        &[DEFAULT_BET_TYPE]
    } else {
        NO_DRAW_BET_TYPES
    }
}

pub fn bookmaker_name(bookmaker_id: &str) -> &'static str {
    match bookmaker_id {
        "16" => "bet365",
        "8" => "Unibet",
        "43" => "William Hill",
        "14" => "Bwin",
        "24" => "Betfair",
        _ => "Nordic Bet",
    }
}

/// Event id from a livesport match URL: the `mid` query parameter, or the
/// `#id/<id>` fragment used by older links.
pub fn extract_event_id(match_url: &str) -> Option<String> {
    let url = Url::parse(match_url).ok()?;

    let alnum_prefix = |s: &str| -> Option<String> {
        let id: String = s.chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
        (!id.is_empty()).then_some(id)
    };

    if let Some(id) = url
        .query_pairs()
        .find(|(k, _)| k == "mid")
        .and_then(|(_, v)| alnum_prefix(v.as_ref()))
    {
        return Some(id);
    }

    url.fragment()
        .and_then(|f| f.strip_prefix("id/"))
        .and_then(alnum_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_event_id_from_query() {
        assert_eq!(
            extract_event_id(
                "https://www.livesport.com/pl/mecz/pilka-nozna/team1/team2/?mid=KQAaF7d2"
            ),
            Some("KQAaF7d2".to_string())
        );
        assert_eq!(
            extract_event_id("https://www.livesport.com/pl/mecz/x/y/?lang=pl&mid=Zx9"),
            Some("Zx9".to_string())
        );
    }

    #[test]
    fn test_extract_event_id_from_fragment() {
        assert_eq!(
            extract_event_id("https://www.livesport.com/pl/mecz/x/#id/AbCd1234"),
            Some("AbCd1234".to_string())
        );
    }

    #[test]
    fn test_extract_event_id_missing() {
        assert_eq!(extract_event_id("https://www.livesport.com/pl/mecz/x/y/"), None);
        assert_eq!(extract_event_id("https://www.livesport.com/?mid="), None);
        assert_eq!(extract_event_id("not a url"), None);
    }

    #[test]
    fn test_bet_types_by_sport() {
        assert_eq!(bet_types_for(Sport::Football), &["HOME_DRAW_AWAY"]);
        assert_eq!(bet_types_for(Sport::Volleyball)[0], "HOME_AWAY");
        assert_eq!(bet_types_for(Sport::Tennis).len(), 3);
    }

    #[test]
    fn test_bookmaker_names() {
        assert_eq!(bookmaker_name("165"), "Nordic Bet");
        assert_eq!(bookmaker_name("16"), "bet365");
        assert_eq!(bookmaker_name("999"), "Nordic Bet");
    }
}
