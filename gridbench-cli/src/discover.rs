//! Suite Discovery
//!
//! Builds the list of suite files to load by matching glob patterns
//! against registered suite paths. Suites are compiled into the binary,
//! so patterns match registry paths rather than the filesystem.
//!
//! Ordering:
//! - Patterns are expanded in the order given
//! - Matches within one pattern are sorted lexicographically
//! - A path matched by several patterns keeps its first position

use gridbench_core::SuiteDef;
use std::collections::HashSet;

/// Ordered list of suite paths selected for a run
#[derive(Debug)]
pub struct SuitePlan {
    /// Suite paths in load order
    pub paths: Vec<String>,
}

/// Build a suite plan from registered paths and discovery patterns
pub fn plan_suites(
    paths: impl IntoIterator<Item = &'static str>,
    patterns: &[String],
) -> anyhow::Result<SuitePlan> {
    let available: Vec<&'static str> = paths.into_iter().collect();
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for pattern in patterns {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| anyhow::anyhow!("Invalid discovery pattern '{}': {}", pattern, e))?;

        let mut matched: Vec<&str> = available
            .iter()
            .copied()
            .filter(|p| matcher.matches(p))
            .collect();
        matched.sort_unstable();

        for path in matched {
            if seen.insert(path) {
                ordered.push(path.to_string());
            }
        }
    }

    Ok(SuitePlan { paths: ordered })
}

/// Expand discovery patterns against the suite registry
pub fn discover_paths(patterns: &[String]) -> anyhow::Result<SuitePlan> {
    plan_suites(
        inventory::iter::<SuiteDef>.into_iter().map(|s| s.path),
        patterns,
    )
}

/// All registered suite paths, sorted
pub fn registered_suites() -> Vec<&'static str> {
    let mut paths: Vec<&'static str> = inventory::iter::<SuiteDef>
        .into_iter()
        .map(|s| s.path)
        .collect();
    paths.sort_unstable();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATHS: &[&str] = &[
        "suites/parse.rs",
        "suites/hash.rs",
        "suites/io/read.rs",
        "suites/io/write.rs",
    ];

    fn plan(patterns: &[&str]) -> Vec<String> {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        plan_suites(PATHS.iter().copied(), &patterns).unwrap().paths
    }

    #[test]
    fn test_catch_all_matches_everything_sorted() {
        let paths = plan(&["**"]);
        assert_eq!(
            paths,
            vec![
                "suites/hash.rs",
                "suites/io/read.rs",
                "suites/io/write.rs",
                "suites/parse.rs",
            ]
        );
    }

    #[test]
    fn test_pattern_order_preserved() {
        // parse.rs comes first because its pattern was given first,
        // even though it sorts after the io suites.
        let paths = plan(&["suites/parse.rs", "suites/io/*"]);
        assert_eq!(
            paths,
            vec!["suites/parse.rs", "suites/io/read.rs", "suites/io/write.rs"]
        );
    }

    #[test]
    fn test_duplicate_match_keeps_first_position() {
        let paths = plan(&["suites/hash.rs", "**"]);
        assert_eq!(paths[0], "suites/hash.rs");
        assert_eq!(paths.len(), 4);
    }

    #[test]
    fn test_no_match_yields_empty_plan() {
        let paths = plan(&["suites/missing.rs"]);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let patterns = vec!["suites/[".to_string()];
        let err = plan_suites(PATHS.iter().copied(), &patterns).unwrap_err();
        assert!(err.to_string().contains("Invalid discovery pattern"));
    }
}
