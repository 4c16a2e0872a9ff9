pub mod engine;
pub mod scorer;

pub use engine::{find_matches, MatchCandidate, MatchReport};
pub use scorer::MatchCriteria;
