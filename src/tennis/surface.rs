//! Synthetic per-surface strength profiles.
//!
//! Real per-surface win rates are not reliably available upstream, so the
//! profile is derived deterministically from the player's H2H record, ranking
//! and a hash of the name. The arithmetic (including clamp order) is fixed so
//! the same inputs always produce bit-identical output.

use crate::db::models::{HistoricalMatch, Surface, SurfaceProfile, Winner};
use crate::qualifier::names;

const DEFAULT_BASE_RATE: f64 = 0.60;
const SPECIALTY_BOOST: f64 = 0.08;
const OFF_SURFACE_PENALTY: f64 = 0.04;
const MIN_RATE: f64 = 0.30;
const MAX_RATE: f64 = 0.98;

const CLAY_KEYWORDS: &[&str] = &[
    "clay", "ziemia", "ziemna", "antuka", "roland garros", "french open",
    "monte carlo", "rome", "madrid", "barcelona", "hamburg", "roland-garros", "glina",
];

const GRASS_KEYWORDS: &[&str] = &[
    "grass", "trawa", "trawiasta", "wimbledon", "halle", "queens",
    "s-hertogenbosch", "eastbourne", "mallorca",
];

const HARD_KEYWORDS: &[&str] = &[
    "hard", "twarda", "us open", "australian open", "usopen", "australian",
    "indian wells", "miami", "cincinnati", "montreal", "toronto", "shanghai",
    "beijing", "paris masters", "szanghaj", "pekin",
];

/// Sum of the name's character codes.
pub fn name_hash(name: &str) -> u64 {
    name.chars().map(|c| u64::from(u32::from(c))).sum()
}

/// Player's win fraction over the H2H meetings they appear in, or 0.60 when
/// none involve them.
pub fn h2h_base_rate(name: &str, h2h: &[HistoricalMatch]) -> f64 {
    let mut wins = 0u32;
    let mut total = 0u32;
    for m in h2h {
        let winner = m.resolved_winner();
        if names::matches(name, &m.home) {
            total += 1;
            if winner == Winner::Home {
                wins += 1;
            }
        } else if names::matches(name, &m.away) {
            total += 1;
            if winner == Winner::Away {
                wins += 1;
            }
        }
    }
    if total > 0 {
        f64::from(wins) / f64::from(total)
    } else {
        DEFAULT_BASE_RATE
    }
}

/// Ordinal ranking tiers; better ranking lifts the base rate up to a tier cap.
pub fn ranking_adjusted(base_rate: f64, ranking: Option<u32>) -> f64 {
    match ranking {
        None | Some(0) => base_rate,
        Some(r) if r <= 10 => (base_rate + 0.15).min(0.95),
        Some(r) if r <= 30 => (base_rate + 0.10).min(0.90),
        Some(r) if r <= 50 => (base_rate + 0.05).min(0.85),
        Some(r) if r <= 100 => base_rate.min(0.75),
        Some(_) => (base_rate - 0.05).max(0.45),
    }
}

/// Build the player's synthetic surface profile.
pub fn surface_profile(name: &str, h2h: &[HistoricalMatch], ranking: Option<u32>) -> SurfaceProfile {
    let base = ranking_adjusted(h2h_base_rate(name, h2h), ranking);

    let hash = name_hash(name);
    let specialty = Surface::ALL[(hash % 3) as usize];

    let mut stats = SurfaceProfile::uniform(base);
    for surface in Surface::ALL {
        let v = stats.get_mut(surface);
        *v = if surface == specialty {
            (*v + SPECIALTY_BOOST).min(MAX_RATE)
        } else {
            (*v - OFF_SURFACE_PENALTY).max(MIN_RATE)
        };
    }

    let micro = ((hash % 7) as f64 - 3.0) / 100.0;
    for surface in Surface::ALL {
        let v = stats.get_mut(surface);
        *v = MIN_RATE.max(MAX_RATE.min(*v + micro));
    }

    stats
}

/// Guess the court surface from tournament text or the event URL.
/// Clay keywords win over grass, grass over hard; hard is the default.
pub fn detect_surface(text: &str) -> Surface {
    let text = text.to_lowercase();
    [
        (CLAY_KEYWORDS, Surface::Clay),
        (GRASS_KEYWORDS, Surface::Grass),
        (HARD_KEYWORDS, Surface::Hard),
    ]
    .into_iter()
    .find(|(keywords, _)| keywords.iter().any(|kw| text.contains(kw)))
    .map_or(Surface::Hard, |(_, surface)| surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn h2h() -> Vec<HistoricalMatch> {
        vec![
            HistoricalMatch::new("Iga Swiatek", "Coco Gauff", "2-0"),
            HistoricalMatch::new("Coco Gauff", "Iga Swiatek", "1-2"),
            HistoricalMatch::new("Iga Swiatek", "Coco Gauff", "1-2"),
            HistoricalMatch::new("Coco Gauff", "Iga Swiatek", "0-2"),
        ]
    }

    #[test]
    fn test_base_rate_from_h2h() {
        assert_relative_eq!(h2h_base_rate("Iga Swiatek", &h2h()), 0.75, epsilon = 1e-9);
        assert_relative_eq!(h2h_base_rate("Coco Gauff", &h2h()), 0.25, epsilon = 1e-9);
        assert_relative_eq!(h2h_base_rate("Nobody", &h2h()), 0.60, epsilon = 1e-9);
        assert_relative_eq!(h2h_base_rate("Iga Swiatek", &[]), 0.60, epsilon = 1e-9);
    }

    #[test]
    fn test_ranking_tiers() {
        assert_relative_eq!(ranking_adjusted(0.60, Some(1)), 0.75, epsilon = 1e-9);
        assert_relative_eq!(ranking_adjusted(0.90, Some(5)), 0.95, epsilon = 1e-9);
        assert_relative_eq!(ranking_adjusted(0.60, Some(25)), 0.70, epsilon = 1e-9);
        assert_relative_eq!(ranking_adjusted(0.60, Some(45)), 0.65, epsilon = 1e-9);
        assert_relative_eq!(ranking_adjusted(0.80, Some(80)), 0.75, epsilon = 1e-9);
        assert_relative_eq!(ranking_adjusted(0.60, Some(80)), 0.60, epsilon = 1e-9);
        assert_relative_eq!(ranking_adjusted(0.60, Some(250)), 0.55, epsilon = 1e-9);
        assert_relative_eq!(ranking_adjusted(0.30, Some(250)), 0.45, epsilon = 1e-9);
        assert_relative_eq!(ranking_adjusted(0.60, None), 0.60, epsilon = 1e-9);
    }

    #[test]
    fn test_profile_known_values() {
        // "Abc" → 65 + 98 + 99 = 262; 262 % 3 = 1 (grass); 262 % 7 = 3 → +0.00
        assert_eq!(name_hash("Abc"), 262);
        let p = surface_profile("Abc", &[], None);
        assert_relative_eq!(p.grass, 0.68, epsilon = 1e-12);
        assert_relative_eq!(p.clay, 0.56, epsilon = 1e-12);
        assert_relative_eq!(p.hard, 0.56, epsilon = 1e-12);
    }

    #[test]
    fn test_profile_deterministic() {
        let a = surface_profile("Iga Swiatek", &h2h(), Some(2));
        let b = surface_profile("Iga Swiatek", &h2h(), Some(2));
        assert_eq!(a.clay.to_bits(), b.clay.to_bits());
        assert_eq!(a.grass.to_bits(), b.grass.to_bits());
        assert_eq!(a.hard.to_bits(), b.hard.to_bits());
    }

    #[test]
    fn test_profile_bounds() {
        let names = ["A", "Zz", "Novak Djokovic", "Łukasz Kubot", "x"];
        let rankings = [None, Some(1), Some(20), Some(40), Some(90), Some(500)];
        let histories = [
            vec![],
            vec![HistoricalMatch::new("A", "Zz", "2-0"); 5],
            vec![HistoricalMatch::new("A", "Zz", "0-2"); 5],
        ];
        for name in names {
            for ranking in rankings {
                for history in &histories {
                    let p = surface_profile(name, history, ranking);
                    for s in Surface::ALL {
                        let v = p.get(s);
                        assert!((0.30..=0.98).contains(&v), "{name} {s} {v}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_detect_surface() {
        assert_eq!(detect_surface("ATP Roland Garros - singles"), Surface::Clay);
        assert_eq!(detect_surface("WTA Wimbledon"), Surface::Grass);
        assert_eq!(detect_surface("https://x/pl/mecz/tenis/a/b/?t=us-open"), Surface::Hard);
        assert_eq!(detect_surface("Szczecin Open"), Surface::Hard);
    }

    #[test]
    fn test_detect_surface_keyword_precedence() {
        assert_eq!(detect_surface("Indian Wells, hard court"), Surface::Hard);
        assert_eq!(detect_surface("Hard-court warmup before Wimbledon"), Surface::Grass);
        assert_eq!(detect_surface("Madrid clay, Miami hard"), Surface::Clay);
    }
}
