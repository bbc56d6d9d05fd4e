use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Maximum number of head-to-head meetings (and form results) considered per event.
pub const MAX_H2H: usize = 5;

/// Malformed scoreline on a single historical record. Recoverable: the record
/// is skipped, the event is not.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable scoreline: {0:?}")]
pub struct ScoreParseError(pub String);

/// Contract violations in the event input itself. These fail loudly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown sport tag: {0:?}")]
    UnknownSport(String),
    #[error("unknown form symbol: {0:?}")]
    UnknownFormSymbol(String),
}

// ── Sport ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    #[serde(alias = "soccer")]
    Football,
    Basketball,
    Volleyball,
    Handball,
    Rugby,
    #[serde(alias = "ice-hockey", alias = "ice_hockey")]
    Hockey,
    Tennis,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Football => "football",
            Sport::Basketball => "basketball",
            Sport::Volleyball => "volleyball",
            Sport::Handball => "handball",
            Sport::Rugby => "rugby",
            Sport::Hockey => "hockey",
            Sport::Tennis => "tennis",
        }
    }

    /// Detect the sport from a livesport event URL. Polish and English path
    /// fragments are both recognised; anything else is football.
    pub fn from_url(url: &str) -> Sport {
        let u = url.to_lowercase();
        if u.contains("koszykowka") || u.contains("basketball") {
            Sport::Basketball
        } else if u.contains("siatkowka") || u.contains("volleyball") {
            Sport::Volleyball
        } else if u.contains("pilka-reczna") || u.contains("handball") {
            Sport::Handball
        } else if u.contains("hokej") || u.contains("hockey") {
            Sport::Hockey
        } else if u.contains("tenis") || u.contains("tennis") {
            Sport::Tennis
        } else if u.contains("rugby") {
            Sport::Rugby
        } else {
            Sport::Football
        }
    }

    /// Sports whose match-winner market has no draw outcome.
    pub fn has_draw(&self) -> bool {
        !matches!(
            self,
            Sport::Volleyball | Sport::Basketball | Sport::Handball | Sport::Hockey | Sport::Tennis
        )
    }

    /// Individual sports are scored by the tennis multi-factor path.
    pub fn is_individual(&self) -> bool {
        matches!(self, Sport::Tennis)
    }

    /// Over/under line used when the odds provider has no live line.
    pub fn default_ou_line(&self) -> f64 {
        match self {
            Sport::Football => 2.5,
            Sport::Basketball => 220.5,
            Sport::Handball => 55.5,
            Sport::Volleyball => 4.5,
            Sport::Hockey => 5.5,
            Sport::Tennis => 2.5,
            Sport::Rugby => 2.5,
        }
    }

    pub fn ou_line_type(&self) -> LineType {
        match self {
            Sport::Basketball | Sport::Volleyball => LineType::Points,
            Sport::Tennis => LineType::Sets,
            _ => LineType::Goals,
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "football" | "soccer" => Ok(Sport::Football),
            "basketball" => Ok(Sport::Basketball),
            "volleyball" => Ok(Sport::Volleyball),
            "handball" => Ok(Sport::Handball),
            "rugby" => Ok(Sport::Rugby),
            "hockey" | "ice-hockey" | "ice_hockey" => Ok(Sport::Hockey),
            "tennis" => Ok(Sport::Tennis),
            other => Err(InputError::UnknownSport(other.to_string())),
        }
    }
}

// ── Head-to-head records ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Home,
    Away,
    Draw,
    #[default]
    Unknown,
}

impl Winner {
    pub fn from_score(score: Score) -> Winner {
        use std::cmp::Ordering;
        match score.home.cmp(&score.away) {
            Ordering::Greater => Winner::Home,
            Ordering::Less => Winner::Away,
            Ordering::Equal => Winner::Draw,
        }
    }
}

/// A parsed scoreline (goals, points or sets depending on the sport).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    /// Find the first `<digits> [:-] <digits>` pair in `s`. Whitespace around
    /// the separator is allowed; a tennis line such as `"6-4, 7-5"` yields `6-4`.
    pub fn parse(s: &str) -> Result<Score, ScoreParseError> {
        let bytes = s.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i].is_ascii_digit() && (i == 0 || !bytes[i - 1].is_ascii_digit()) {
                if let Some(score) = Self::parse_at(bytes, i) {
                    return Ok(score);
                }
            }
            i += 1;
        }
        Err(ScoreParseError(s.to_string()))
    }

    fn parse_at(bytes: &[u8], start: usize) -> Option<Score> {
        let digits = |from: usize| -> usize {
            bytes[from..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count()
        };
        let spaces = |from: usize| -> usize {
            bytes[from..]
                .iter()
                .take_while(|b| b.is_ascii_whitespace())
                .count()
        };

        let home_len = digits(start);
        let mut pos = start + home_len;
        pos += spaces(pos);
        if !matches!(bytes.get(pos), Some(b':') | Some(b'-')) {
            return None;
        }
        pos += 1;
        pos += spaces(pos);
        let away_len = digits(pos);
        if away_len == 0 {
            return None;
        }

        let home = std::str::from_utf8(&bytes[start..start + home_len]).ok()?.parse().ok()?;
        let away = std::str::from_utf8(&bytes[pos..pos + away_len]).ok()?.parse().ok()?;
        Some(Score { home, away })
    }
}

/// One prior meeting between the two current participants, as delivered by
/// the upstream retrieval layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalMatch {
    #[serde(default)]
    pub date: String,
    #[serde(alias = "home_name")]
    pub home: String,
    #[serde(alias = "away_name")]
    pub away: String,
    /// Raw scoreline, e.g. "2-1" or "3:0"
    pub score: String,
    #[serde(default)]
    pub winner: Winner,
}

impl HistoricalMatch {
    #[cfg(test)]
    pub fn new(home: &str, away: &str, score: &str) -> Self {
        let winner = Score::parse(score)
            .map(Winner::from_score)
            .unwrap_or(Winner::Unknown);
        HistoricalMatch {
            date: String::new(),
            home: home.to_string(),
            away: away.to_string(),
            score: score.to_string(),
            winner,
        }
    }

    pub fn parsed_score(&self) -> Result<Score, ScoreParseError> {
        Score::parse(&self.score)
    }

    /// Recorded winner, or the one implied by the scoreline when upstream
    /// left it unknown.
    pub fn resolved_winner(&self) -> Winner {
        match self.winner {
            Winner::Unknown => self
                .parsed_score()
                .map(Winner::from_score)
                .unwrap_or(Winner::Unknown),
            w => w,
        }
    }

    /// Name of the side that won this meeting according to its scoreline,
    /// `None` on a tie.
    pub fn winning_name(&self) -> Result<Option<&str>, ScoreParseError> {
        let score = self.parsed_score()?;
        Ok(match Winner::from_score(score) {
            Winner::Home => Some(self.home.trim()),
            Winner::Away => Some(self.away.trim()),
            _ => None,
        })
    }
}

// ── Event context ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusSide {
    #[default]
    Home,
    Away,
}

impl fmt::Display for FocusSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FocusSide::Home => f.write_str("home"),
            FocusSide::Away => f.write_str("away"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub match_url: String,
    pub home_team: String,
    pub away_team: String,
    pub sport: Sport,
    #[serde(default)]
    pub match_time: Option<String>,
}

// ── Form ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormResult {
    #[serde(rename = "W", alias = "Z")]
    Win,
    #[serde(rename = "D", alias = "R")]
    Draw,
    #[serde(rename = "L", alias = "P")]
    Loss,
}

impl FormResult {
    pub fn symbol(&self) -> &'static str {
        match self {
            FormResult::Win => "W",
            FormResult::Draw => "D",
            FormResult::Loss => "L",
        }
    }
}

impl fmt::Display for FormResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for FormResult {
    type Err = InputError;

    /// Accepts W/D/L and the Polish badge letters Z (zwycięstwo), R (remis),
    /// P (porażka).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "W" | "Z" => Ok(FormResult::Win),
            "D" | "R" => Ok(FormResult::Draw),
            "L" | "P" => Ok(FormResult::Loss),
            other => Err(InputError::UnknownFormSymbol(other.to_string())),
        }
    }
}

/// Most-recent-first sequence of at most five results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FormResult>", into = "Vec<FormResult>")]
pub struct FormRecord(Vec<FormResult>);

impl FormRecord {
    pub fn new(mut results: Vec<FormResult>) -> Self {
        results.truncate(MAX_H2H);
        FormRecord(results)
    }

    /// Parse a compact symbol string such as `"WWLDW"` or `"W-W-L"`.
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let results = s
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_string().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FormRecord::new(results))
    }

    pub fn results(&self) -> &[FormResult] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<FormResult>> for FormRecord {
    fn from(results: Vec<FormResult>) -> Self {
        FormRecord::new(results)
    }
}

impl From<FormRecord> for Vec<FormResult> {
    fn from(record: FormRecord) -> Self {
        record.0
    }
}

impl fmt::Display for FormRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols: Vec<&str> = self.0.iter().map(FormResult::symbol).collect();
        f.write_str(&symbols.join("-"))
    }
}

/// The four form sequences tracked for a team-sport event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormProfile {
    #[serde(default)]
    pub home_overall: FormRecord,
    /// Home side's recent results at its own venue
    #[serde(default)]
    pub home_home: FormRecord,
    #[serde(default)]
    pub away_overall: FormRecord,
    /// Away side's recent results on the road
    #[serde(default)]
    pub away_away: FormRecord,
}

impl FormProfile {
    pub fn is_empty(&self) -> bool {
        self.home_overall.is_empty()
            && self.home_home.is_empty()
            && self.away_overall.is_empty()
            && self.away_away.is_empty()
    }
}

// ── Tennis ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Clay,
    Grass,
    Hard,
}

impl Surface {
    /// Order used by the name-hash specialisation index.
    pub const ALL: [Surface; 3] = [Surface::Clay, Surface::Grass, Surface::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Clay => "clay",
            Surface::Grass => "grass",
            Surface::Hard => "hard",
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthetic per-surface win-rate profile. Every value lies in [0.30, 0.98].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceProfile {
    pub clay: f64,
    pub grass: f64,
    pub hard: f64,
}

impl SurfaceProfile {
    pub fn uniform(rate: f64) -> Self {
        SurfaceProfile {
            clay: rate,
            grass: rate,
            hard: rate,
        }
    }

    pub fn get(&self, surface: Surface) -> f64 {
        match surface {
            Surface::Clay => self.clay,
            Surface::Grass => self.grass,
            Surface::Hard => self.hard,
        }
    }

    pub fn get_mut(&mut self, surface: Surface) -> &mut f64 {
        match surface {
            Surface::Clay => &mut self.clay,
            Surface::Grass => &mut self.grass,
            Surface::Hard => &mut self.hard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TennisFavorite {
    PlayerA,
    PlayerB,
    Even,
}

impl TennisFavorite {
    /// Favorite by raw head-to-head win counts; ties are `Even`.
    pub fn from_wins(a_wins: u32, b_wins: u32) -> Self {
        use std::cmp::Ordering;
        match a_wins.cmp(&b_wins) {
            Ordering::Greater => TennisFavorite::PlayerA,
            Ordering::Less => TennisFavorite::PlayerB,
            Ordering::Equal => TennisFavorite::Even,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub h2h_score: f64,
    pub ranking_score: f64,
    pub form_score: f64,
    pub surface_score: f64,
}

// ── Verdicts ─────────────────────────────────────────────────────────────────

/// Team-sport head-to-head verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationVerdict {
    pub focus: FocusSide,
    pub qualifies: bool,
    /// Focus side's share of the considered meetings (0.0 when none)
    pub win_rate: f64,
    /// Wins credited to the focus side
    pub wins: u32,
    pub wins_home: u32,
    pub wins_away: u32,
    pub h2h_count: usize,
    pub form_advantage: bool,
    pub forms: FormProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TennisVerdict {
    /// Absolute multi-factor score, 0–100
    pub score: f64,
    pub qualifies: bool,
    pub favorite: TennisFavorite,
    pub breakdown: Option<ScoreBreakdown>,
    pub player_a_wins: u32,
    pub player_b_wins: u32,
    pub h2h_count: usize,
    pub ranking_a: Option<u32>,
    pub ranking_b: Option<u32>,
    pub surface: Option<Surface>,
    pub form_a: FormRecord,
    pub form_b: FormRecord,
    /// True when the weighted analyzer failed and the H2H-count rule decided
    pub fallback: bool,
}

// ── Odds & over/under ────────────────────────────────────────────────────────

/// Match-winner prices (decimal odds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOdds {
    pub bookmaker_name: String,
    pub bet_type_used: String,
    pub home_odds: f64,
    pub draw_odds: Option<f64>,
    pub away_odds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverUnderOdds {
    /// Line as published by the bookmaker, e.g. "2.5"
    pub line: String,
    pub line_type: LineType,
    pub over_odds: f64,
    pub under_odds: f64,
}

impl OverUnderOdds {
    pub fn line_value(&self) -> Option<f64> {
        self.line.trim().parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BttsOdds {
    pub yes_odds: f64,
    pub no_odds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Goals,
    Points,
    Sets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OuRecommendation {
    Over,
    Under,
}

impl fmt::Display for OuRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OuRecommendation::Over => f.write_str("OVER"),
            OuRecommendation::Under => f.write_str("UNDER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverUnderAnalysis {
    pub qualifies: bool,
    pub recommendation: Option<OuRecommendation>,
    pub line: f64,
    pub line_type: LineType,
    /// Share of H2H meetings that finished over the line, 0–100
    pub h2h_over_percentage: f64,
    pub btts_qualifies: Option<bool>,
    pub btts_h2h_percentage: Option<f64>,
}

// ── Input & output records ───────────────────────────────────────────────────

/// One event as produced by the retrieval layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInput {
    #[serde(flatten)]
    pub context: EventContext,
    #[serde(default)]
    pub h2h: Vec<HistoricalMatch>,
    /// Team sports: overall and venue-specific form of both sides
    #[serde(default)]
    pub forms: Option<FormProfile>,
    /// Tennis: ATP/WTA ranking of player A (home) and B (away)
    #[serde(default)]
    pub ranking_a: Option<u32>,
    #[serde(default)]
    pub ranking_b: Option<u32>,
    #[serde(default)]
    pub surface: Option<Surface>,
    /// Tournament name or page text used for surface detection
    #[serde(default)]
    pub tournament: Option<String>,
    #[serde(default)]
    pub form_a: Option<FormRecord>,
    #[serde(default)]
    pub form_b: Option<FormRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Assessment {
    Team(QualificationVerdict),
    Tennis(TennisVerdict),
}

impl Assessment {
    pub fn qualifies(&self) -> bool {
        match self {
            Assessment::Team(v) => v.qualifies,
            Assessment::Tennis(v) => v.qualifies,
        }
    }
}

/// The record emitted per processed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    pub run_date: NaiveDate,
    pub context: EventContext,
    pub h2h: Vec<HistoricalMatch>,
    pub assessment: Assessment,
    pub odds: Option<MatchOdds>,
    pub ou_odds: Option<OverUnderOdds>,
    pub btts_odds: Option<BttsOdds>,
    pub over_under: Option<OverUnderAnalysis>,
}

impl EventReport {
    pub fn qualifies(&self) -> bool {
        self.assessment.qualifies()
    }
}
