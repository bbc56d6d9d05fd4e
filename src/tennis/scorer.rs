use std::sync::Arc;

use tracing::warn;

use crate::config::log_detail;
use crate::db::models::{
    EventInput, FormRecord, FormResult, HistoricalMatch, Surface, TennisFavorite, TennisVerdict,
    Winner, MAX_H2H,
};
use crate::qualifier::names;
use crate::tennis::analyzer::{
    FormEntry, TennisAnalysis, TennisAnalysisInput, TennisAnalyzer, TennisMeeting, TennisSide,
};
use crate::tennis::surface::{detect_surface, surface_profile};

/// Form assumed for a player with no usable history (60% win rate).
const DEFAULT_FORM: [FormResult; 5] = [
    FormResult::Win,
    FormResult::Win,
    FormResult::Win,
    FormResult::Loss,
    FormResult::Loss,
];

/// Everything the scorer needs for one tennis event.
#[derive(Debug, Clone)]
pub struct TennisInputs<'a> {
    pub player_a: &'a str,
    pub player_b: &'a str,
    pub h2h: &'a [HistoricalMatch],
    pub form_a: &'a FormRecord,
    pub form_b: &'a FormRecord,
    pub surface: Option<Surface>,
    pub ranking_a: Option<u32>,
    pub ranking_b: Option<u32>,
    pub tournament_info: &'a str,
}

/// Head-to-head wins of player A and player B over the last five meetings.
/// A is checked first; a winner matching both names is credited to A only.
/// Ties and malformed scorelines are skipped.
pub fn count_player_wins(h2h: &[HistoricalMatch], player_a: &str, player_b: &str) -> (u32, u32) {
    let mut a_wins = 0;
    let mut b_wins = 0;
    for m in h2h.iter().take(MAX_H2H) {
        let winner = match m.winning_name() {
            Ok(Some(name)) => name,
            Ok(None) | Err(_) => continue,
        };
        if names::matches(player_a, winner) {
            a_wins += 1;
        } else if names::matches(player_b, winner) {
            b_wins += 1;
        }
    }
    (a_wins, b_wins)
}

/// Recent-form proxy built from the player's H2H results when no explicit
/// form is available. Short records are padded to five with the majority
/// result; no record at all gives `W W W L L`.
pub fn player_form_from_h2h(name: &str, h2h: &[HistoricalMatch]) -> FormRecord {
    let mut form = Vec::with_capacity(MAX_H2H);
    for m in h2h {
        let winner = m.resolved_winner();
        let result = if names::matches(name, &m.home) {
            match winner {
                Winner::Home => Some(FormResult::Win),
                Winner::Away => Some(FormResult::Loss),
                _ => None,
            }
        } else if names::matches(name, &m.away) {
            match winner {
                Winner::Away => Some(FormResult::Win),
                Winner::Home => Some(FormResult::Loss),
                _ => None,
            }
        } else {
            None
        };
        form.extend(result);
        if form.len() >= MAX_H2H {
            break;
        }
    }

    if form.is_empty() {
        return FormRecord::new(DEFAULT_FORM.to_vec());
    }

    let wins = form.iter().filter(|r| **r == FormResult::Win).count();
    let pad = if wins as f64 / form.len() as f64 > 0.5 {
        FormResult::Win
    } else {
        FormResult::Loss
    };
    form.resize(MAX_H2H, pad);
    FormRecord::new(form)
}

/// Tennis has no draws; a supplied `D` counts as a loss.
fn without_draws(form: &FormRecord) -> FormRecord {
    FormRecord::new(
        form.results()
            .iter()
            .map(|r| match r {
                FormResult::Draw => FormResult::Loss,
                other => *other,
            })
            .collect(),
    )
}

/// Express a raw H2H row relative to the current players. The upstream
/// winner field is mapped by exact name equality against the row's sides.
pub fn to_meeting(
    m: &HistoricalMatch,
    player_a: &str,
    player_b: &str,
    surface: Option<Surface>,
) -> TennisMeeting {
    let winner = match m.resolved_winner() {
        Winner::Home if m.home.trim() == player_a.trim() => Some(TennisSide::PlayerA),
        Winner::Home => Some(TennisSide::PlayerB),
        Winner::Away if m.away.trim() == player_b.trim() => Some(TennisSide::PlayerB),
        Winner::Away => Some(TennisSide::PlayerA),
        Winner::Draw | Winner::Unknown => None,
    };
    TennisMeeting {
        date: m.date.clone(),
        winner,
        score: m.score.clone(),
        surface,
    }
}

fn display_name(name: &str, placeholder: &str) -> String {
    if name.trim().is_empty() {
        placeholder.to_string()
    } else {
        name.to_string()
    }
}

pub fn wrap_form(form: &FormRecord) -> Vec<FormEntry> {
    form.results().iter().copied().map(FormEntry::from).collect()
}

/// Runs the injected analyzer and turns its output into a [`TennisVerdict`],
/// falling back to the raw H2H rule when the analyzer fails.
pub struct TennisScorer {
    analyzer: Arc<dyn TennisAnalyzer>,
    verbose: bool,
}

impl TennisScorer {
    pub fn new(analyzer: Arc<dyn TennisAnalyzer>, verbose: bool) -> Self {
        TennisScorer { analyzer, verbose }
    }

    /// Assemble inputs from a decoded event. Missing forms are derived from
    /// the H2H record; a missing surface is detected from the tournament
    /// text and URL.
    pub fn assess(&self, event: &EventInput) -> TennisVerdict {
        let ctx = &event.context;
        let form_a = match &event.form_a {
            Some(f) if !f.is_empty() => without_draws(f),
            _ => player_form_from_h2h(&ctx.home_team, &event.h2h),
        };
        let form_b = match &event.form_b {
            Some(f) if !f.is_empty() => without_draws(f),
            _ => player_form_from_h2h(&ctx.away_team, &event.h2h),
        };
        let tournament_info = match &event.tournament {
            Some(t) => format!("{} {}", t, ctx.match_url),
            None => ctx.match_url.clone(),
        };
        let surface = event
            .surface
            .unwrap_or_else(|| detect_surface(&tournament_info));

        self.score(&TennisInputs {
            player_a: &ctx.home_team,
            player_b: &ctx.away_team,
            h2h: &event.h2h,
            form_a: &form_a,
            form_b: &form_b,
            surface: Some(surface),
            ranking_a: event.ranking_a,
            ranking_b: event.ranking_b,
            tournament_info: &tournament_info,
        })
    }

    pub fn score(&self, inputs: &TennisInputs<'_>) -> TennisVerdict {
        let h2h = &inputs.h2h[..inputs.h2h.len().min(MAX_H2H)];
        let (a_wins, b_wins) = count_player_wins(h2h, inputs.player_a, inputs.player_b);

        let analysis_input = TennisAnalysisInput {
            player_a: display_name(inputs.player_a, "Player A"),
            player_b: display_name(inputs.player_b, "Player B"),
            h2h: h2h
                .iter()
                .map(|m| to_meeting(m, inputs.player_a, inputs.player_b, inputs.surface))
                .collect(),
            form_a: wrap_form(inputs.form_a),
            form_b: wrap_form(inputs.form_b),
            surface: inputs.surface,
            surface_stats_a: inputs
                .surface
                .map(|_| surface_profile(inputs.player_a, h2h, inputs.ranking_a)),
            surface_stats_b: inputs
                .surface
                .map(|_| surface_profile(inputs.player_b, h2h, inputs.ranking_b)),
            ranking_a: inputs.ranking_a,
            ranking_b: inputs.ranking_b,
            tournament_info: inputs.tournament_info.to_string(),
        };

        log_detail(
            self.verbose,
            format_args!(
                "Tennis inputs: {} vs {}, h2h={} ({}-{}), form_a={}, form_b={}, surface={:?}, rankings={:?}/{:?}",
                inputs.player_a,
                inputs.player_b,
                h2h.len(),
                a_wins,
                b_wins,
                inputs.form_a,
                inputs.form_b,
                inputs.surface,
                inputs.ranking_a,
                inputs.ranking_b
            ),
        );

        let mut verdict = TennisVerdict {
            score: 0.0,
            qualifies: false,
            favorite: TennisFavorite::from_wins(a_wins, b_wins),
            breakdown: None,
            player_a_wins: a_wins,
            player_b_wins: b_wins,
            h2h_count: h2h.len(),
            ranking_a: inputs.ranking_a,
            ranking_b: inputs.ranking_b,
            surface: inputs.surface,
            form_a: inputs.form_a.clone(),
            form_b: inputs.form_b.clone(),
            fallback: false,
        };

        match self.analyzer.analyze(&analysis_input) {
            Ok(analysis) => self.apply_analysis(&mut verdict, analysis),
            Err(e) => {
                warn!(
                    "Tennis analyzer '{}' failed for {} vs {}: {}; using H2H rule",
                    self.analyzer.name(),
                    inputs.player_a,
                    inputs.player_b,
                    e
                );
                verdict.fallback = true;
                verdict.qualifies = a_wins >= 1 && a_wins > b_wins;
            }
        }
        verdict
    }

    fn apply_analysis(&self, verdict: &mut TennisVerdict, analysis: TennisAnalysis) {
        verdict.score = analysis.total_score.abs();
        verdict.qualifies = analysis.qualifies;
        verdict.breakdown = Some(analysis.breakdown);
        // Raw H2H counts decide when the analyzer has no opinion.
        if verdict.score != 0.0 && analysis.favorite != TennisFavorite::Even {
            verdict.favorite = analysis.favorite;
        }
        log_detail(
            self.verbose,
            format_args!(
                "Tennis score: {:.1}/100 (h2h={:.1}, ranking={:.1}, form={:.1}, surface={:.1}), favorite={:?}, qualifies={}",
                verdict.score,
                analysis.breakdown.h2h_score,
                analysis.breakdown.ranking_score,
                analysis.breakdown.form_score,
                analysis.breakdown.surface_score,
                verdict.favorite,
                verdict.qualifies
            ),
        );
    }
}
