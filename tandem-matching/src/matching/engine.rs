use std::cmp::Ordering;

use serde::Serialize;

use tandem_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::Profile;
use crate::storage::Storage;

use super::scorer::{score, shared_interests, MatchCriteria};

pub const MAX_MATCHES: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct RequesterSummary {
    pub user_id: i32,
    pub name: String,
    pub native_language: Option<String>,
    pub target_language: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub profession: Option<String>,
    pub native_language: Option<String>,
    pub target_language: Option<String>,
    pub target_language_proficiency: Option<String>,
    pub mbti: Option<String>,
    pub zodiac: Option<String>,
    pub shared_interests: Vec<String>,
    pub compatibility_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub requester: RequesterSummary,
    pub matches: Vec<MatchCandidate>,
    /// Eligible candidates before truncation to [`MAX_MATCHES`].
    pub total_matches: usize,
}

fn interest_names(storage: &dyn Storage, user_id: i32) -> AppResult<Vec<String>> {
    Ok(storage
        .get_interests(user_id)?
        .into_iter()
        .map(|i| i.interest_name)
        .collect())
}

/// Ranks language-exchange partners for `requester_id`.
///
/// A candidate is eligible when their native language is the requester's target language and
/// the other way round. Candidates with no account row are skipped.
pub fn find_matches(storage: &dyn Storage, requester_id: i32, criteria: &MatchCriteria) -> AppResult<MatchReport> {
    let requester: Profile = storage
        .get_profile(requester_id)?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, format!("profile {requester_id} not found")))?;
    let account = storage
        .get_account(requester_id)?
        .ok_or_else(|| AppError::new(ErrorCode::AccountNotFound, format!("account {requester_id} not found")))?;

    let summary = RequesterSummary {
        user_id: requester.id,
        name: account.full_name(),
        native_language: requester.native_language.clone(),
        target_language: requester.target_language.clone(),
    };

    let (Some(native), Some(target)) = (&requester.native_language, &requester.target_language) else {
        tracing::debug!(requester_id, "requester has no language pair, nothing to match");
        return Ok(MatchReport { requester: summary, matches: Vec::new(), total_matches: 0 });
    };

    let requester_interests = interest_names(storage, requester_id)?;
    let candidates = storage.find_profiles_by_language_swap(target, native, requester_id)?;
    tracing::debug!(requester_id, candidates = candidates.len(), "eligible candidates loaded");

    let mut matches = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Some(candidate_account) = storage.get_account(candidate.id)? else {
            tracing::warn!(candidate_id = candidate.id, "candidate profile has no account, skipping");
            continue;
        };
        let shared = shared_interests(&requester_interests, &interest_names(storage, candidate.id)?);
        let compatibility_score = score(&requester, &candidate, shared.len(), criteria);

        matches.push(MatchCandidate {
            user_id: candidate.id,
            first_name: candidate_account.first_name,
            last_name: candidate_account.last_name,
            age: candidate.age,
            gender: candidate.gender,
            profession: candidate.profession,
            native_language: candidate.native_language,
            target_language: candidate.target_language,
            target_language_proficiency: candidate.target_language_proficiency,
            mbti: candidate.mbti,
            zodiac: candidate.zodiac,
            shared_interests: shared,
            compatibility_score,
        });
    }

    matches.sort_by(|a, b| {
        b.compatibility_score
            .partial_cmp(&a.compatibility_score)
            .unwrap_or(Ordering::Equal)
            .then(a.user_id.cmp(&b.user_id))
    });
    let total_matches = matches.len();
    matches.truncate(MAX_MATCHES);

    tracing::info!(requester_id, total_matches, returned = matches.len(), "matches ranked");
    metrics::histogram!("tandem_match_candidates").record(total_matches as f64);

    Ok(MatchReport { requester: summary, matches, total_matches })
}
