use tandem_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum NameMatch {
    Exact,
    Prefix,
    Substring,
}

fn classify(account: &Account, query: &str) -> Option<NameMatch> {
    let full = account.full_name().to_lowercase();
    let first = account.first_name.to_lowercase();
    let last = account.last_name.to_lowercase();

    if full == query {
        Some(NameMatch::Exact)
    } else if full.starts_with(query) || first.starts_with(query) || last.starts_with(query) {
        Some(NameMatch::Prefix)
    } else if full.contains(query) {
        Some(NameMatch::Substring)
    } else {
        None
    }
}

/// Picks the account a free-text name refers to.
///
/// Candidates are ranked exact full name, then prefix, then substring (all case-insensitive).
/// The best tier must hold exactly one user; a tie is reported as `AmbiguousTarget` with the
/// tied candidates so the caller can ask which one was meant. The requester never takes part
/// in a tie: when they share the best tier with others they are dropped from it. A requester
/// who is the only best match is still returned.
pub fn resolve_target(candidates: &[Account], query: &str, requester_id: i32) -> AppResult<Account> {
    let query = query.trim().to_lowercase();

    let mut ranked: Vec<(NameMatch, &Account)> = candidates
        .iter()
        .filter_map(|a| classify(a, &query).map(|tier| (tier, a)))
        .collect();
    ranked.sort_by_key(|(tier, a)| (*tier, a.id));
    ranked.dedup_by_key(|(_, a)| a.id);

    let Some(&(best_tier, _)) = ranked.first() else {
        return Err(AppError::new(
            ErrorCode::TargetNotFound,
            format!("could not find a user with a name matching \"{query}\""),
        ));
    };

    let mut best: Vec<&Account> = ranked
        .iter()
        .filter(|(tier, _)| *tier == best_tier)
        .map(|(_, a)| *a)
        .collect();
    if best.len() > 1 {
        best.retain(|a| a.id != requester_id);
    }

    match best.as_slice() {
        [only] => Ok((*only).clone()),
        tied => Err(AppError::with_details(
            ErrorCode::AmbiguousTarget,
            format!("{} users match \"{query}\", please specify which one", tied.len()),
            serde_json::json!({ "candidates": tied }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: i32, first: &str, last: &str) -> Account {
        Account { id, first_name: first.into(), last_name: last.into() }
    }

    #[test]
    fn exact_match_beats_partial() {
        let candidates = [account(1, "Anna", "Kim"), account(2, "Anna", "Kimura"), account(3, "Hanna", "Kim")];
        assert_eq!(resolve_target(&candidates, "anna kim", 0).unwrap().id, 1);
    }

    #[test]
    fn unique_prefix_wins_over_substrings() {
        let candidates = [account(4, "Joanna", "Smith"), account(5, "Annabel", "Lee")];
        assert_eq!(resolve_target(&candidates, "Anna", 0).unwrap().id, 5);
    }

    #[test]
    fn substring_match_when_nothing_better() {
        let candidates = [account(6, "Marisol", "Vega")];
        assert_eq!(resolve_target(&candidates, "sol ve", 0).unwrap().id, 6);
    }

    #[test]
    fn tie_is_ambiguous() {
        let candidates = [account(7, "Lee", "Park"), account(8, "Lee", "Chen")];
        let err = resolve_target(&candidates, "lee", 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AmbiguousTarget);
        let listed = err.details().unwrap()["candidates"].as_array().unwrap().len();
        assert_eq!(listed, 2);
    }

    #[test]
    fn requester_is_dropped_from_a_tie() {
        let candidates = [account(11, "Bruno", "Costa"), account(12, "Bruno", "Mars")];
        assert_eq!(resolve_target(&candidates, "bruno", 11).unwrap().id, 12);

        let three = [account(11, "Bruno", "Costa"), account(12, "Bruno", "Mars"), account(13, "Bruno", "Lima")];
        let err = resolve_target(&three, "bruno", 11).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AmbiguousTarget);
        assert_eq!(err.details().unwrap()["candidates"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn requester_alone_in_best_tier_is_returned() {
        let candidates = [account(11, "Bruno", "Costa"), account(12, "Bruno", "Mars")];
        assert_eq!(resolve_target(&candidates, "bruno costa", 11).unwrap().id, 11);
    }

    #[test]
    fn duplicate_rows_are_one_user() {
        let candidates = [account(9, "Ravi", "Patel"), account(9, "Ravi", "Patel")];
        assert_eq!(resolve_target(&candidates, "ravi", 0).unwrap().id, 9);
    }

    #[test]
    fn no_match_is_not_found() {
        let candidates = [account(10, "Yuki", "Tanaka")];
        let err = resolve_target(&candidates, "bob", 0).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TargetNotFound);
        assert_eq!(resolve_target(&[], "bob", 0).unwrap_err().code(), ErrorCode::TargetNotFound);
    }
}
