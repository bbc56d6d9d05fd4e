pub mod livesport;
pub mod over_under;
pub mod provider;

pub use livesport::LiveSportOddsClient;
pub use over_under::{H2hTotalsAnalyzer, OverUnderAnalyzer};
pub use provider::{extract_event_id, OddsProvider};
