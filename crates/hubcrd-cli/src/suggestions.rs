//! "Did you mean" suggestions for misspelled kinds

/// Maximum edit distance for a candidate to be suggested
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// The candidate closest to `input`, if any is close enough
///
/// Ties keep the first candidate.
pub fn closest_match<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&candidate| (candidate, strsim::levenshtein(input, candidate)))
        .filter(|(_, distance)| *distance > 0 && *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_match() {
        let kinds = ["API", "APIAccess", "APIAuth", "APIPortal"];
        assert_eq!(closest_match("APIAcess", &kinds), Some("APIAccess"));
        assert_eq!(closest_match("APIPortl", &kinds), Some("APIPortal"));
        assert_eq!(closest_match("ConfigMap", &kinds), None);
    }

    #[test]
    fn test_exact_match_is_not_a_suggestion() {
        assert_eq!(closest_match("API", &["API"]), None);
    }
}
