use anyhow::Result;
use chrono::NaiveDate;
use futures_util::future::join3;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{log_detail, EngineConfig};
use crate::db::models::{
    Assessment, EventInput, EventReport, FormRecord, OverUnderOdds, QualificationVerdict, Sport,
    MAX_H2H,
};
use crate::odds::over_under::MIN_H2H_FOR_OU;
use crate::odds::{extract_event_id, OddsProvider, OverUnderAnalyzer};
use crate::qualifier::{focus_advantage, form::format_form, qualify};
use crate::tennis::{TennisAnalyzer, TennisScorer};

/// Routes each event to the team or tennis scorer and enriches the verdict
/// with odds and over/under statistics.
pub struct ScanEngine {
    config: EngineConfig,
    odds: Option<Arc<dyn OddsProvider>>,
    over_under: Arc<dyn OverUnderAnalyzer>,
    tennis: TennisScorer,
}

impl ScanEngine {
    pub fn new(
        config: EngineConfig,
        odds: Option<Arc<dyn OddsProvider>>,
        over_under: Arc<dyn OverUnderAnalyzer>,
        tennis_analyzer: Arc<dyn TennisAnalyzer>,
    ) -> Self {
        let tennis = TennisScorer::new(tennis_analyzer, config.verbose);
        ScanEngine {
            config,
            odds,
            over_under,
            tennis,
        }
    }

    /// Verdict for one event, without any network enrichment.
    pub fn assess(&self, event: &EventInput) -> Assessment {
        if event.context.sport.is_individual() {
            Assessment::Tennis(self.tennis.assess(event))
        } else {
            Assessment::Team(self.assess_team(event))
        }
    }

    fn assess_team(&self, event: &EventInput) -> QualificationVerdict {
        let ctx = &event.context;
        let focus = self.config.focus;
        let mut verdict = qualify(&event.h2h, &ctx.home_team, &ctx.away_team, focus);

        for m in event.h2h.iter().take(MAX_H2H) {
            log_detail(
                self.config.verbose,
                format_args!("  H2H {} {} {} {}", m.date, m.home, m.score, m.away),
            );
        }

        // Form is only worth looking at once the H2H rule has passed.
        if verdict.qualifies {
            if let Some(forms) = event.forms.as_ref().filter(|f| !f.is_empty()) {
                verdict.form_advantage = focus_advantage(forms, focus);
                verdict.forms = forms.clone();
                log_detail(
                    self.config.verbose,
                    format_args!(
                        "  Form {}: overall [{}] home [{}] | {}: overall [{}] away [{}] → {} advantage={}",
                        ctx.home_team,
                        format_form(&forms.home_overall),
                        format_form(&forms.home_home),
                        ctx.away_team,
                        format_form(&forms.away_overall),
                        format_form(&forms.away_away),
                        focus,
                        verdict.form_advantage
                    ),
                );
            }
        }
        verdict
    }

    /// Full report for one event: verdict, odds and over/under analysis.
    /// Odds failures are logged and leave the corresponding fields empty.
    pub async fn process(&self, event: &EventInput, run_date: NaiveDate) -> EventReport {
        let ctx = &event.context;
        let assessment = self.assess(event);
        let h2h: Vec<_> = event.h2h.iter().take(MAX_H2H).cloned().collect();
        let enough_h2h = event.h2h.len() >= MIN_H2H_FOR_OU;

        let (odds, ou_odds, btts_odds) = match (&self.odds, extract_event_id(&ctx.match_url)) {
            (Some(provider), Some(event_id)) if self.config.odds_enabled => {
                let sport = ctx.sport;
                let id = event_id.as_str();
                let name = provider.name();
                let (odds, ou, btts) = join3(
                    async { settle(name, "1X2", id, provider.match_odds(id, sport).await) },
                    async {
                        if !enough_h2h {
                            return None;
                        }
                        settle(name, "O/U", id, provider.over_under_odds(id, sport).await)
                    },
                    async {
                        if !enough_h2h || sport != Sport::Football {
                            return None;
                        }
                        settle(name, "BTTS", id, provider.btts_odds(id).await)
                    },
                )
                .await;
                (odds, ou, btts)
            }
            (Some(_), None) if self.config.odds_enabled => {
                warn!("No event id in URL, skipping odds: {}", ctx.match_url);
                (None, None, None)
            }
            _ => (None, None, None),
        };

        let over_under = if enough_h2h {
            let line = analysis_line(ctx.sport, ou_odds.as_ref());
            let (home_form, away_form) = recent_forms(event);
            log_detail(
                self.config.verbose,
                format_args!("  O/U analyzer={} line={}", self.over_under.name(), line),
            );
            self.over_under
                .analyze(ctx.sport, &h2h, &home_form, &away_form, line)
        } else {
            None
        };

        let report = EventReport {
            run_date,
            context: ctx.clone(),
            h2h,
            assessment,
            odds,
            ou_odds,
            btts_odds,
            over_under,
        };
        log_report(&report);
        report
    }
}

fn settle<T>(provider: &str, market: &str, event_id: &str, res: Result<Option<T>>) -> Option<T> {
    match res {
        Ok(v) => v,
        Err(e) => {
            warn!(
                "{} {} odds failed for event {}: {:#}",
                provider, market, event_id, e
            );
            None
        }
    }
}

/// Line the H2H totals are measured against. Team sports use the bookmaker's
/// live line when there is one; tennis always uses the 2.5-set default and
/// keeps the fetched O/U odds for display only.
fn analysis_line(sport: Sport, ou_odds: Option<&OverUnderOdds>) -> f64 {
    if sport.is_individual() {
        return sport.default_ou_line();
    }
    ou_odds
        .and_then(|o| o.line_value())
        .unwrap_or_else(|| sport.default_ou_line())
}

/// Home/away recent form handed to the over/under analyzer.
fn recent_forms(event: &EventInput) -> (FormRecord, FormRecord) {
    if event.context.sport.is_individual() {
        (
            event.form_a.clone().unwrap_or_default(),
            event.form_b.clone().unwrap_or_default(),
        )
    } else {
        event
            .forms
            .as_ref()
            .map(|f| (f.home_overall.clone(), f.away_overall.clone()))
            .unwrap_or_default()
    }
}

fn log_report(report: &EventReport) {
    let ctx = &report.context;
    match &report.assessment {
        Assessment::Team(v) => info!(
            "{} {} vs {}: {} wins {}/{} ({:.0}%), qualifies={}, form_advantage={}",
            ctx.sport,
            ctx.home_team,
            ctx.away_team,
            v.focus,
            v.wins,
            v.h2h_count,
            v.win_rate * 100.0,
            v.qualifies,
            v.form_advantage
        ),
        Assessment::Tennis(v) => info!(
            "tennis {} vs {}: score {:.1}/100, favorite={:?}, H2H {}-{}, qualifies={}{}",
            ctx.home_team,
            ctx.away_team,
            v.score,
            v.favorite,
            v.player_a_wins,
            v.player_b_wins,
            v.qualifies,
            if v.fallback { " (fallback)" } else { "" }
        ),
    }
    if let Some(ou) = report.over_under.as_ref().filter(|o| o.qualifies) {
        if let Some(rec) = ou.recommendation {
            info!(
                "  O/U {} {} ({:.0}% of H2H over)",
                rec, ou.line, ou.h2h_over_percentage
            );
        }
    }
}

/// Running totals over a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub processed: usize,
    pub qualifying: usize,
    pub tennis: usize,
    pub with_odds: usize,
    pub over_under_qualifying: usize,
}

impl ScanSummary {
    pub fn record(&mut self, report: &EventReport) {
        self.processed += 1;
        if report.qualifies() {
            self.qualifying += 1;
        }
        if matches!(report.assessment, Assessment::Tennis(_)) {
            self.tennis += 1;
        }
        if report.odds.is_some() {
            self.with_odds += 1;
        }
        if report.over_under.as_ref().is_some_and(|o| o.qualifies) {
            self.over_under_qualifying += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        BttsOdds, EventContext, FocusSide, FormProfile, HistoricalMatch, MatchOdds,
        OuRecommendation, TennisFavorite,
    };
    use crate::odds::provider::bet_types_for;
    use crate::odds::H2hTotalsAnalyzer;
    use crate::tennis::WeightedTennisAnalyzer;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeOdds {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeOdds {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(FakeOdds {
                fail,
                calls: AtomicUsize::new(0),
            })
        }

        fn hit(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection reset");
            }
            Ok(())
        }
    }

    #[async_trait]
    impl OddsProvider for FakeOdds {
        fn name(&self) -> &str {
            "fake"
        }

        async fn match_odds(&self, _event_id: &str, sport: Sport) -> Result<Option<MatchOdds>> {
            self.hit()?;
            Ok(Some(MatchOdds {
                bookmaker_name: "Nordic Bet".into(),
                bet_type_used: bet_types_for(sport)[0].into(),
                home_odds: 1.45,
                draw_odds: sport.has_draw().then_some(4.1),
                away_odds: 6.5,
            }))
        }

        async fn over_under_odds(&self, _event_id: &str, sport: Sport) -> Result<Option<OverUnderOdds>> {
            self.hit()?;
            Ok(Some(OverUnderOdds {
                line: "3.5".into(),
                line_type: sport.ou_line_type(),
                over_odds: 2.1,
                under_odds: 1.7,
            }))
        }

        async fn btts_odds(&self, _event_id: &str) -> Result<Option<BttsOdds>> {
            self.hit()?;
            Ok(Some(BttsOdds {
                yes_odds: 1.8,
                no_odds: 1.95,
            }))
        }
    }

    fn config(focus: FocusSide) -> EngineConfig {
        EngineConfig {
            focus,
            verbose: false,
            odds_enabled: true,
        }
    }

    fn engine(focus: FocusSide, odds: Option<Arc<dyn OddsProvider>>) -> ScanEngine {
        ScanEngine::new(
            config(focus),
            odds,
            Arc::new(H2hTotalsAnalyzer),
            Arc::new(WeightedTennisAnalyzer),
        )
    }

    fn football(h2h: Vec<HistoricalMatch>, forms: Option<FormProfile>) -> EventInput {
        EventInput {
            context: EventContext {
                match_url: "https://www.livesport.com/pl/mecz/pilka-nozna/alpha/beta/?mid=KQAaF7d2"
                    .into(),
                home_team: "Alpha".into(),
                away_team: "Beta".into(),
                sport: Sport::Football,
                match_time: Some("18:30".into()),
            },
            h2h,
            forms,
            ranking_a: None,
            ranking_b: None,
            surface: None,
            tournament: None,
            form_a: None,
            form_b: None,
        }
    }

    fn alpha_dominant() -> Vec<HistoricalMatch> {
        vec![HistoricalMatch::new("Alpha", "Beta", "2-1"); 5]
    }

    fn strong_home_form() -> FormProfile {
        FormProfile {
            home_overall: FormRecord::parse("WWWDD").unwrap(),
            home_home: FormRecord::parse("WWW").unwrap(),
            away_overall: FormRecord::parse("LLLLL").unwrap(),
            away_away: FormRecord::parse("LLW").unwrap(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_qualifying_football_event_fully_enriched() {
        let fake = FakeOdds::new(false);
        let engine = engine(FocusSide::Home, Some(fake.clone()));
        let event = football(alpha_dominant(), Some(strong_home_form()));

        let report = engine.process(&event, date()).await;

        let Assessment::Team(v) = &report.assessment else {
            panic!("expected team verdict");
        };
        assert!(v.qualifies);
        assert_eq!(v.wins, 5);
        assert!(v.form_advantage);
        assert_eq!(v.forms, strong_home_form());

        assert_eq!(report.odds.as_ref().unwrap().draw_odds, Some(4.1));
        assert_eq!(report.ou_odds.as_ref().unwrap().line, "3.5");
        assert!(report.btts_odds.is_some());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 3);

        // live line 3.5: every 2-1 meeting stayed under
        let ou = report.over_under.unwrap();
        assert_eq!(ou.line, 3.5);
        assert_eq!(ou.recommendation, Some(OuRecommendation::Under));
        assert_eq!(ou.btts_qualifies, Some(true));
    }

    #[tokio::test]
    async fn test_short_history_skips_ou_and_btts() {
        let fake = FakeOdds::new(false);
        let engine = engine(FocusSide::Home, Some(fake.clone()));
        let event = football(alpha_dominant()[..3].to_vec(), None);

        let report = engine.process(&event, date()).await;

        assert!(report.qualifies());
        assert!(report.odds.is_some());
        assert!(report.ou_odds.is_none());
        assert!(report.btts_odds.is_none());
        assert!(report.over_under.is_none());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_line_when_no_odds_provider() {
        let engine = engine(FocusSide::Home, None);
        let report = engine.process(&football(alpha_dominant(), None), date()).await;
        assert!(report.odds.is_none());
        let ou = report.over_under.unwrap();
        assert_eq!(ou.line, 2.5);
        assert_eq!(ou.recommendation, Some(OuRecommendation::Over));
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_none() {
        let fake = FakeOdds::new(true);
        let engine = engine(FocusSide::Home, Some(fake.clone()));
        let report = engine.process(&football(alpha_dominant(), None), date()).await;
        assert!(report.qualifies());
        assert!(report.odds.is_none());
        assert!(report.ou_odds.is_none());
        assert!(report.btts_odds.is_none());
        assert_eq!(report.over_under.unwrap().line, 2.5);
    }

    #[tokio::test]
    async fn test_odds_disabled_makes_no_calls() {
        let fake = FakeOdds::new(false);
        let mut cfg = config(FocusSide::Home);
        cfg.odds_enabled = false;
        let engine = ScanEngine::new(
            cfg,
            Some(fake.clone()),
            Arc::new(H2hTotalsAnalyzer),
            Arc::new(WeightedTennisAnalyzer),
        );
        engine.process(&football(alpha_dominant(), None), date()).await;
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_form_not_evaluated_when_h2h_fails() {
        let engine = engine(FocusSide::Away, None);
        let event = football(alpha_dominant(), Some(strong_home_form()));
        let Assessment::Team(v) = engine.assess(&event) else {
            panic!("expected team verdict");
        };
        assert!(!v.qualifies);
        assert_eq!(v.wins, 0);
        assert!(!v.form_advantage);
        assert!(v.forms.is_empty());
    }

    #[test]
    fn test_away_focus_qualifies() {
        let engine = engine(FocusSide::Away, None);
        let h2h = vec![
            HistoricalMatch::new("Alpha", "Beta", "0-1"),
            HistoricalMatch::new("Beta", "Alpha", "3-0"),
            HistoricalMatch::new("Alpha", "Beta", "1-1"),
            HistoricalMatch::new("Beta", "Alpha", "2-1"),
        ];
        let Assessment::Team(v) = engine.assess(&football(h2h, None)) else {
            panic!("expected team verdict");
        };
        assert_eq!(v.wins, 3);
        assert!(v.qualifies);
        assert_eq!(v.focus, FocusSide::Away);
    }

    #[tokio::test]
    async fn test_tennis_event_routed_to_tennis_scorer() {
        let fake = FakeOdds::new(false);
        let engine = engine(FocusSide::Home, Some(fake.clone()));
        let mut event = football(
            vec![
                HistoricalMatch::new("Iga Swiatek", "Coco Gauff", "2-0"),
                HistoricalMatch::new("Coco Gauff", "Iga Swiatek", "0-2"),
            ],
            None,
        );
        event.context.sport = Sport::Tennis;
        event.context.home_team = "Iga Swiatek".into();
        event.context.away_team = "Coco Gauff".into();
        event.ranking_a = Some(1);
        event.ranking_b = Some(3);

        let report = engine.process(&event, date()).await;

        let Assessment::Tennis(v) = &report.assessment else {
            panic!("expected tennis verdict");
        };
        assert_eq!(v.favorite, TennisFavorite::PlayerA);
        assert_eq!(v.player_a_wins, 2);
        assert_eq!(report.odds.as_ref().unwrap().draw_odds, None);
        assert!(report.over_under.is_none());
    }

    #[tokio::test]
    async fn test_tennis_ou_ignores_live_line() {
        let fake = FakeOdds::new(false);
        let engine = engine(FocusSide::Home, Some(fake.clone()));
        let mut event = football(
            vec![HistoricalMatch::new("Iga Swiatek", "Coco Gauff", "2-1"); 5],
            None,
        );
        event.context.sport = Sport::Tennis;
        event.context.home_team = "Iga Swiatek".into();
        event.context.away_team = "Coco Gauff".into();

        let report = engine.process(&event, date()).await;

        assert_eq!(report.ou_odds.as_ref().unwrap().line, "3.5");
        // three sets per meeting clears 2.5 but not the fetched 3.5
        let ou = report.over_under.unwrap();
        assert_eq!(ou.line, 2.5);
        assert_eq!(ou.recommendation, Some(OuRecommendation::Over));
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let engine = engine(FocusSide::Home, None);
        let mut summary = ScanSummary::default();
        summary.record(&engine.process(&football(alpha_dominant(), None), date()).await);
        summary.record(&engine.process(&football(vec![], None), date()).await);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.qualifying, 1);
        assert_eq!(summary.with_odds, 0);
        assert_eq!(summary.over_under_qualifying, 1);
    }
}
