//! Weighted multi-factor tennis analysis.
//!
//! The scorer hands a fully assembled [`TennisAnalysisInput`] to a
//! [`TennisAnalyzer`] strategy. Every sub-score is signed toward player A and
//! lies in [-100, 100]; the total is their weighted sum:
//!
//! | factor  | weight |
//! |---------|--------|
//! | H2H     | 50%    |
//! | ranking | 25%    |
//! | form    | 15%    |
//! | surface | 10%    |

use thiserror::Error;

use crate::db::models::{
    FormResult, ScoreBreakdown, Surface, SurfaceProfile, TennisFavorite,
};

pub const H2H_WEIGHT: f64 = 0.50;
pub const RANKING_WEIGHT: f64 = 0.25;
pub const FORM_WEIGHT: f64 = 0.15;
pub const SURFACE_WEIGHT: f64 = 0.10;

/// Absolute total score needed to qualify.
pub const QUALIFY_SCORE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzerError {
    #[error("no head-to-head, ranking or form data to analyze")]
    NoData,
    #[error("invalid analyzer input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TennisSide {
    PlayerA,
    PlayerB,
}

/// A head-to-head meeting expressed relative to the current players.
#[derive(Debug, Clone, PartialEq)]
pub struct TennisMeeting {
    pub date: String,
    /// `None` when the row carries no decisive result
    pub winner: Option<TennisSide>,
    pub score: String,
    pub surface: Option<Surface>,
}

/// One recent result with the metadata slots the analyzer understands.
/// Upstream only supplies the result; the rest stays empty.
#[derive(Debug, Clone, PartialEq)]
pub struct FormEntry {
    pub result: FormResult,
    pub date: String,
    pub opponent_rank: Option<u32>,
}

impl From<FormResult> for FormEntry {
    fn from(result: FormResult) -> Self {
        FormEntry {
            result,
            date: String::new(),
            opponent_rank: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TennisAnalysisInput {
    pub player_a: String,
    pub player_b: String,
    pub h2h: Vec<TennisMeeting>,
    pub form_a: Vec<FormEntry>,
    pub form_b: Vec<FormEntry>,
    pub surface: Option<Surface>,
    pub surface_stats_a: Option<SurfaceProfile>,
    pub surface_stats_b: Option<SurfaceProfile>,
    pub ranking_a: Option<u32>,
    pub ranking_b: Option<u32>,
    pub tournament_info: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TennisAnalysis {
    /// Signed total; positive favours player A
    pub total_score: f64,
    pub qualifies: bool,
    pub favorite: TennisFavorite,
    pub breakdown: ScoreBreakdown,
}

/// Strategy that blends the assembled inputs into a single score.
pub trait TennisAnalyzer: Send + Sync {
    fn analyze(&self, input: &TennisAnalysisInput) -> Result<TennisAnalysis, AnalyzerError>;

    fn name(&self) -> &str;
}

/// Default fixed-weight analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedTennisAnalyzer;

impl WeightedTennisAnalyzer {
    fn h2h_score(h2h: &[TennisMeeting]) -> f64 {
        let a = h2h.iter().filter(|m| m.winner == Some(TennisSide::PlayerA)).count() as f64;
        let b = h2h.iter().filter(|m| m.winner == Some(TennisSide::PlayerB)).count() as f64;
        if a + b == 0.0 {
            0.0
        } else {
            (a - b) / (a + b) * 100.0
        }
    }

    fn ranking_score(ranking_a: Option<u32>, ranking_b: Option<u32>) -> f64 {
        match (ranking_a, ranking_b) {
            (Some(ra), Some(rb)) if ra > 0 && rb > 0 => {
                let (ra, rb) = (f64::from(ra), f64::from(rb));
                (rb - ra) / (ra + rb) * 100.0
            }
            _ => 0.0,
        }
    }

    fn win_share(form: &[FormEntry]) -> Option<f64> {
        if form.is_empty() {
            return None;
        }
        let wins = form.iter().filter(|e| e.result == FormResult::Win).count();
        Some(wins as f64 / form.len() as f64)
    }

    fn form_score(form_a: &[FormEntry], form_b: &[FormEntry]) -> f64 {
        match (Self::win_share(form_a), Self::win_share(form_b)) {
            (Some(a), Some(b)) => (a - b) * 100.0,
            _ => 0.0,
        }
    }

    fn surface_score(
        surface: Option<Surface>,
        stats_a: Option<&SurfaceProfile>,
        stats_b: Option<&SurfaceProfile>,
    ) -> f64 {
        match (surface, stats_a, stats_b) {
            (Some(s), Some(a), Some(b)) => {
                let (a, b) = (a.get(s), b.get(s));
                if a + b <= 0.0 {
                    0.0
                } else {
                    (a - b) / (a + b) * 100.0
                }
            }
            _ => 0.0,
        }
    }
}

impl TennisAnalyzer for WeightedTennisAnalyzer {
    fn name(&self) -> &str {
        "weighted"
    }

    fn analyze(&self, input: &TennisAnalysisInput) -> Result<TennisAnalysis, AnalyzerError> {
        if input.player_a.trim().is_empty() || input.player_b.trim().is_empty() {
            return Err(AnalyzerError::InvalidInput("player name missing".into()));
        }
        let no_rankings = input.ranking_a.is_none() && input.ranking_b.is_none();
        let no_forms = input.form_a.is_empty() && input.form_b.is_empty();
        if input.h2h.is_empty() && no_rankings && no_forms {
            return Err(AnalyzerError::NoData);
        }

        let breakdown = ScoreBreakdown {
            h2h_score: Self::h2h_score(&input.h2h),
            ranking_score: Self::ranking_score(input.ranking_a, input.ranking_b),
            form_score: Self::form_score(&input.form_a, &input.form_b),
            surface_score: Self::surface_score(
                input.surface,
                input.surface_stats_a.as_ref(),
                input.surface_stats_b.as_ref(),
            ),
        };

        let total_score = H2H_WEIGHT * breakdown.h2h_score
            + RANKING_WEIGHT * breakdown.ranking_score
            + FORM_WEIGHT * breakdown.form_score
            + SURFACE_WEIGHT * breakdown.surface_score;

        let favorite = if total_score > 0.0 {
            TennisFavorite::PlayerA
        } else if total_score < 0.0 {
            TennisFavorite::PlayerB
        } else {
            TennisFavorite::Even
        };

        Ok(TennisAnalysis {
            total_score,
            qualifies: total_score.abs() >= QUALIFY_SCORE,
            favorite,
            breakdown,
        })
    }
}
