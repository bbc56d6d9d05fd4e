//! Over/under and both-teams-to-score statistics over the H2H record.

use crate::db::models::{
    FormRecord, HistoricalMatch, OuRecommendation, OverUnderAnalysis, Score, Sport,
};

/// Share of meetings (percent) above the line needed to recommend OVER.
pub const OVER_THRESHOLD: f64 = 60.0;
/// At or below this share the recommendation is UNDER.
pub const UNDER_THRESHOLD: f64 = 40.0;
pub const BTTS_THRESHOLD: f64 = 60.0;

/// Minimum number of H2H rows before the analysis is attempted.
pub const MIN_H2H_FOR_OU: usize = 5;

pub trait OverUnderAnalyzer: Send + Sync {
    /// `None` when there is nothing to analyse (e.g. no readable scorelines).
    fn analyze(
        &self,
        sport: Sport,
        h2h: &[HistoricalMatch],
        home_form: &FormRecord,
        away_form: &FormRecord,
        line: f64,
    ) -> Option<OverUnderAnalysis>;

    fn name(&self) -> &str;
}

/// Counts how often the combined scoreline of past meetings cleared the line.
/// Recent form is not used.
#[derive(Debug, Clone, Copy, Default)]
pub struct H2hTotalsAnalyzer;

impl OverUnderAnalyzer for H2hTotalsAnalyzer {
    fn name(&self) -> &str {
        "h2h-totals"
    }

    fn analyze(
        &self,
        sport: Sport,
        h2h: &[HistoricalMatch],
        _home_form: &FormRecord,
        _away_form: &FormRecord,
        line: f64,
    ) -> Option<OverUnderAnalysis> {
        let scores: Vec<Score> = h2h.iter().filter_map(|m| m.parsed_score().ok()).collect();
        if scores.is_empty() {
            return None;
        }
        let n = scores.len() as f64;

        let over = scores
            .iter()
            .filter(|s| (u64::from(s.home) + u64::from(s.away)) as f64 > line)
            .count();
        let over_pct = over as f64 * 100.0 / n;

        let recommendation = if over_pct >= OVER_THRESHOLD {
            Some(OuRecommendation::Over)
        } else if over_pct <= UNDER_THRESHOLD {
            Some(OuRecommendation::Under)
        } else {
            None
        };

        let (btts_qualifies, btts_h2h_percentage) = if sport == Sport::Football {
            let both = scores.iter().filter(|s| s.home > 0 && s.away > 0).count();
            let pct = both as f64 * 100.0 / n;
            (Some(pct >= BTTS_THRESHOLD), Some(pct))
        } else {
            (None, None)
        };

        Some(OverUnderAnalysis {
            qualifies: recommendation.is_some(),
            recommendation,
            line,
            line_type: sport.ou_line_type(),
            h2h_over_percentage: over_pct,
            btts_qualifies,
            btts_h2h_percentage,
        })
    }
}
