pub mod analyzer;
pub mod scorer;
pub mod surface;

pub use analyzer::{TennisAnalyzer, WeightedTennisAnalyzer};
pub use scorer::TennisScorer;
