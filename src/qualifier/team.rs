use tracing::debug;

use crate::db::models::{
    FocusSide, FormProfile, HistoricalMatch, QualificationVerdict, MAX_H2H,
};

use super::names;

/// Minimum share of H2H meetings the focus side must have won.
pub const MIN_WIN_RATE: f64 = 0.60;

/// Raw head-to-head win tallies for the two current participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct H2hTally {
    pub wins_home: u32,
    pub wins_away: u32,
    pub considered: usize,
}

impl H2hTally {
    pub fn wins(&self, focus: FocusSide) -> u32 {
        match focus {
            FocusSide::Home => self.wins_home,
            FocusSide::Away => self.wins_away,
        }
    }
}

/// Count H2H wins for the current home and away sides over at most
/// [`MAX_H2H`] meetings.
///
/// The winning name of each meeting is tested against both current sides
/// independently, so a loose substring match can credit one meeting to both.
/// Rows with an unparseable scoreline are skipped for win counting but still
/// count as considered meetings.
pub fn tally(history: &[HistoricalMatch], current_home: &str, current_away: &str) -> H2hTally {
    let considered = &history[..history.len().min(MAX_H2H)];
    let mut out = H2hTally {
        considered: considered.len(),
        ..Default::default()
    };

    for item in considered {
        let winner = match item.winning_name() {
            Ok(Some(name)) => name,
            Ok(None) => continue,
            Err(e) => {
                debug!("Skipping H2H row {} vs {}: {}", item.home, item.away, e);
                continue;
            }
        };
        if names::matches(winner, current_home) {
            out.wins_home += 1;
        }
        if names::matches(winner, current_away) {
            out.wins_away += 1;
        }
    }

    out
}

/// Win rate with the 0.0 policy for an empty history.
pub fn win_rate(wins: u32, h2h_count: usize) -> f64 {
    if h2h_count == 0 {
        0.0
    } else {
        f64::from(wins) / h2h_count as f64
    }
}

/// Basic team-sport qualification: the focus side won at least 60% of the
/// last (up to five) meetings. Forms are left empty; the caller enriches them.
pub fn qualify(
    history: &[HistoricalMatch],
    current_home: &str,
    current_away: &str,
    focus: FocusSide,
) -> QualificationVerdict {
    let t = tally(history, current_home, current_away);
    let wins = t.wins(focus);
    let rate = win_rate(wins, t.considered);

    QualificationVerdict {
        focus,
        qualifies: t.considered >= 1 && rate >= MIN_WIN_RATE,
        win_rate: rate,
        wins,
        wins_home: t.wins_home,
        wins_away: t.wins_away,
        h2h_count: t.considered,
        form_advantage: false,
        forms: FormProfile::default(),
    }
}
