mod policy;
mod score;
mod select;
mod strategy;

pub use policy::RankingPolicy;
pub use score::{RankInput, ScoreBreakdown, ScoredCandidate};
pub use select::select_top;
pub use strategy::RankingStrategy;
