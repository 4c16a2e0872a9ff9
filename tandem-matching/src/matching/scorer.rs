use serde::Deserialize;

use crate::models::Profile;

// -- Weights --
// Every eligible candidate starts at BASE; the bonuses only reorder them.
const BASE: f64 = 100.0;
const W_SHARED_INTEREST: f64 = 2.0;
const AGE_MAX_BONUS: f64 = 10.0;
const AGE_PENALTY_PER_YEAR: f64 = 0.3;
const W_SAME_GENDER: f64 = 6.0;
const W_ZODIAC: f64 = 5.0;
const W_MBTI: f64 = 5.0;
const W_SAME_PROFESSION: f64 = 5.0;

/// Optional preferences supplied by the requester.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchCriteria {
    pub zodiac: Option<String>,
    pub mbti: Option<String>,
}

/// Interest names both users hold, in the requester's order. Comparison is exact.
pub fn shared_interests(requester: &[String], candidate: &[String]) -> Vec<String> {
    let mut shared: Vec<String> = Vec::new();
    for name in requester {
        if candidate.contains(name) && !shared.contains(name) {
            shared.push(name.clone());
        }
    }
    shared
}

fn same(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

/// Compatibility of `candidate` for `requester`, rounded to two decimals.
pub fn score(requester: &Profile, candidate: &Profile, shared_count: usize, criteria: &MatchCriteria) -> f64 {
    let mut total = BASE;

    total += W_SHARED_INTEREST * shared_count as f64;

    let age_gap = (requester.age.unwrap_or(0) - candidate.age.unwrap_or(0)).abs();
    total += (AGE_MAX_BONUS - AGE_PENALTY_PER_YEAR * f64::from(age_gap)).max(0.0);

    if same(&requester.gender, &candidate.gender) {
        total += W_SAME_GENDER;
    }
    if criteria.zodiac.is_some() && same(&criteria.zodiac, &candidate.zodiac) {
        total += W_ZODIAC;
    }
    if criteria.mbti.is_some() && same(&criteria.mbti, &candidate.mbti) {
        total += W_MBTI;
    }
    if same(&requester.profession, &candidate.profession) {
        total += W_SAME_PROFESSION;
    }

    round2(total)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
