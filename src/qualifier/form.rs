use crate::db::models::{FocusSide, FormProfile, FormRecord, FormResult};

/// Overall points at or above which a side is "in good form".
const GOOD_FORM_POINTS: u32 = 7;
/// Overall points at or below which a side is "in poor form".
const POOR_FORM_POINTS: u32 = 6;

/// League-style form points: win 3, draw 1, loss 0.
pub fn form_points(form: &FormRecord) -> u32 {
    form.results()
        .iter()
        .map(|r| match r {
            FormResult::Win => 3,
            FormResult::Draw => 1,
            FormResult::Loss => 0,
        })
        .sum()
}

/// Home side holds a form advantage when it is in good form while the away
/// side is in poor form, or it leads both overall and on venue-specific form
/// (home at home vs away on the road).
pub fn home_advantage(profile: &FormProfile) -> bool {
    let home_overall = form_points(&profile.home_overall);
    let away_overall = form_points(&profile.away_overall);
    let home_home = form_points(&profile.home_home);
    let away_away = form_points(&profile.away_away);

    let split = home_overall >= GOOD_FORM_POINTS && away_overall <= POOR_FORM_POINTS;
    let better = home_overall > away_overall && home_home > away_away;
    split || better
}

/// Mirror of [`home_advantage`] for the away side.
pub fn away_advantage(profile: &FormProfile) -> bool {
    let home_overall = form_points(&profile.home_overall);
    let away_overall = form_points(&profile.away_overall);
    let home_home = form_points(&profile.home_home);
    let away_away = form_points(&profile.away_away);

    let split = away_overall >= GOOD_FORM_POINTS && home_overall <= POOR_FORM_POINTS;
    let better = away_overall > home_overall && away_away > home_home;
    split || better
}

/// The advantage predicate matching the active focus side.
pub fn focus_advantage(profile: &FormProfile, focus: FocusSide) -> bool {
    match focus {
        FocusSide::Home => home_advantage(profile),
        FocusSide::Away => away_advantage(profile),
    }
}

/// Log-friendly rendering, e.g. `W✅ L❌ D🟡`.
pub fn format_form(form: &FormRecord) -> String {
    form.results()
        .iter()
        .map(|r| {
            let mark = match r {
                FormResult::Win => "✅",
                FormResult::Loss => "❌",
                FormResult::Draw => "🟡",
            };
            format!("{}{}", r, mark)
        })
        .collect::<Vec<_>>()
        .join(" ")
}
