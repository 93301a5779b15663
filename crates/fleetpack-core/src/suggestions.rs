//! Fuzzy matching for "did you mean" hints
//!
//! Used when a configuration value is one letter away from something valid:
//! a misspelled service type, pull policy, or ingress backend name.

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Suggestion result with its distance to the input
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggested correction
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
}

/// Calculate Levenshtein distance between two strings
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Find closest matches from a list of candidates
///
/// Comparison is case-insensitive so `clusterip` still finds `ClusterIP`.
pub fn find_closest_matches<S: AsRef<str>>(
    input: &str,
    candidates: &[S],
    max_results: usize,
) -> Vec<Suggestion> {
    let needle = input.to_lowercase();
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|candidate| {
            let candidate = candidate.as_ref();
            let distance = levenshtein(&needle, &candidate.to_lowercase());
            (distance <= MAX_SUGGESTION_DISTANCE && candidate != input).then(|| Suggestion {
                text: candidate.to_string(),
                distance,
            })
        })
        .collect();

    // Stable sort keeps declaration order among equal distances
    suggestions.sort_by_key(|s| s.distance);
    suggestions.truncate(max_results);
    suggestions
}

/// Build a hint for a value that must be one of `allowed`
pub fn suggest_enum_value(input: &str, allowed: &[&str]) -> String {
    match find_closest_matches(input, allowed, 1).first() {
        Some(s) => format!("Did you mean `{}`? Allowed values: {}", s.text, allowed.join(", ")),
        None => format!("Allowed values: {}", allowed.join(", ")),
    }
}

/// Build a hint for a name that should refer to an existing entry
pub fn suggest_name<S: AsRef<str>>(input: &str, known: &[S]) -> Option<String> {
    let matches = find_closest_matches(input, known, 3);
    if matches.is_empty() {
        if known.is_empty() {
            return None;
        }
        let names: Vec<&str> = known.iter().map(|s| s.as_ref()).collect();
        return Some(format!("Known names: {}", names.join(", ")));
    }

    let suggestions: Vec<String> = matches.iter().map(|s| format!("`{}`", s.text)).collect();
    Some(format!("Did you mean {}?", suggestions.join(" or ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("api", "api"), 0);
        assert_eq!(levenshtein("apl", "api"), 1);
        assert_eq!(levenshtein("worker", "wrker"), 1);
    }

    #[test]
    fn test_find_closest_matches_orders_by_distance() {
        let candidates = ["api", "apis", "web", "payments"];
        let matches = find_closest_matches("ap", &candidates, 3);
        assert_eq!(matches[0].text, "api");
        assert_eq!(matches[1].text, "apis");
        assert!(matches.iter().all(|m| m.text != "payments"));
    }

    #[test]
    fn test_exact_match_is_not_suggested() {
        let matches = find_closest_matches("api", &["api"], 3);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_suggest_enum_value_case_insensitive() {
        let hint = suggest_enum_value("clusterip", &["ClusterIP", "NodePort", "LoadBalancer"]);
        assert!(hint.starts_with("Did you mean `ClusterIP`?"));
    }

    #[test]
    fn test_suggest_enum_value_without_match() {
        let hint = suggest_enum_value("ExternalName", &["ClusterIP", "NodePort"]);
        assert_eq!(hint, "Allowed values: ClusterIP, NodePort");
    }

    #[test]
    fn test_suggest_name() {
        let known = vec!["api".to_string(), "worker".to_string()];
        assert_eq!(suggest_name("apii", &known).unwrap(), "Did you mean `api`?");
        assert_eq!(
            suggest_name("billing-gateway", &known).unwrap(),
            "Known names: api, worker"
        );
        assert!(suggest_name::<String>("api", &[]).is_none());
    }
}
