//! Cluster selection by environment name.

use std::collections::HashMap;

/// Tag keys consulted for the environment, in lookup order.
const ENVIRONMENT_TAG_KEYS: [&str; 3] = ["Environment", "environment", "Env"];

/// Case-insensitive substring filter over cluster names and environment tags.
///
/// An empty filter matches every cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentFilter {
    needles: Vec<String>,
}

impl EnvironmentFilter {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let needles = targets
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { needles }
    }

    /// Parse a comma-separated list. `*` selects every cluster.
    pub fn parse(raw: &str) -> Self {
        if raw.split(',').any(|t| t.trim() == "*") {
            return Self::default();
        }
        Self::new(raw.split(','))
    }

    pub fn is_match_all(&self) -> bool {
        self.needles.is_empty()
    }

    pub fn targets(&self) -> &[String] {
        &self.needles
    }

    pub fn matches(&self, cluster_name: &str, tags: &HashMap<String, String>) -> bool {
        if self.needles.is_empty() {
            return true;
        }

        let name = cluster_name.to_lowercase();
        let env_tag = ENVIRONMENT_TAG_KEYS
            .iter()
            .find_map(|key| tags.get(*key).filter(|v| !v.is_empty()))
            .map(|v| v.to_lowercase());

        self.needles.iter().any(|needle| {
            name.contains(needle.as_str())
                || env_tag
                    .as_deref()
                    .is_some_and(|env| env.contains(needle.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_name_mismatch() {
        let filter = EnvironmentFilter::new(["dev"]);
        assert!(!filter.matches("prod-app", &HashMap::new()));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = EnvironmentFilter::new(Vec::<String>::new());
        assert!(filter.is_match_all());
        assert!(filter.matches("dev-app", &HashMap::new()));
        assert!(filter.matches("prod-app", &HashMap::new()));
    }

    #[test]
    fn test_environment_tag_substring() {
        let filter = EnvironmentFilter::new(["stag"]);
        assert!(filter.matches("x", &tags(&[("Environment", "Staging")])));
    }

    #[test]
    fn test_env_tag_and_lowercase_key() {
        let filter = EnvironmentFilter::new(["qa"]);
        assert!(filter.matches("payments", &tags(&[("Env", "QA")])));
        assert!(filter.matches("payments", &tags(&[("environment", "qa-2")])));
        assert!(!filter.matches("payments", &tags(&[("Team", "qa")])));
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let filter = EnvironmentFilter::new(["DEV"]);
        assert!(filter.matches("Platform-Dev-01", &HashMap::new()));
    }

    #[test]
    fn test_parse_comma_list() {
        let filter = EnvironmentFilter::parse("dev, development ,,");
        assert_eq!(filter.targets(), ["dev", "development"]);
    }

    #[test]
    fn test_parse_wildcard_and_blank() {
        assert!(EnvironmentFilter::parse("*").is_match_all());
        assert!(EnvironmentFilter::parse("").is_match_all());
        assert!(EnvironmentFilter::parse(" , ").is_match_all());
    }
}
