//! Brand-keyword policy tables
//!
//! Provider families are recognised by a keyword in the provider identifier
//! (`vast_us-east`, `aws_ap-south-1`, ...). A [`BrandTable`] maps such keywords
//! to a value and falls back to a default when nothing matches. Capacity and
//! default egress rates are both expressed this way so the policy can be
//! audited and extended from configuration.

use serde::{Deserialize, Serialize};

/// One keyword → value rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandRule<T> {
    /// Case-insensitive substring matched against the provider identifier
    pub keyword: String,
    /// Value applied when the keyword matches
    pub value: T,
}

/// Ordered keyword table with a fallback default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandTable<T> {
    /// Rules checked in order; the first match wins
    #[serde(default = "Vec::new")]
    pub rules: Vec<BrandRule<T>>,
    /// Value for identifiers no rule matches
    pub default: T,
}

impl<T: Copy> BrandTable<T> {
    /// Create a table with no rules
    pub fn new(default: T) -> Self {
        Self {
            rules: Vec::new(),
            default,
        }
    }

    /// Append a rule (builder style)
    pub fn with_rule(mut self, keyword: &str, value: T) -> Self {
        self.rules.push(BrandRule {
            keyword: keyword.to_lowercase(),
            value,
        });
        self
    }

    /// Resolve the value for a provider identifier
    pub fn lookup(&self, identifier: &str) -> T {
        self.matching_rule(identifier)
            .map(|rule| rule.value)
            .unwrap_or(self.default)
    }

    /// The rule that applies to `identifier`, if any
    pub fn matching_rule(&self, identifier: &str) -> Option<&BrandRule<T>> {
        let identifier = identifier.to_lowercase();
        self.rules
            .iter()
            .find(|rule| !rule.keyword.is_empty() && identifier.contains(&rule.keyword.to_lowercase()))
    }
}

/// Default per-provider GPU capacity: marketplace sellers are small, regions are large
pub fn default_capacity_table() -> BrandTable<u32> {
    BrandTable::new(32).with_rule("vast", 8)
}

/// Default egress rates in USD per GB
pub fn default_egress_table() -> BrandTable<f64> {
    BrandTable::new(0.05).with_rule("aws", 0.09).with_rule("vast", 0.02)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_policy() {
        let table = default_capacity_table();
        assert_eq!(table.lookup("vast_us-east"), 8);
        assert_eq!(table.lookup("VAST_eu"), 8);
        assert_eq!(table.lookup("aws_ap-south-1"), 32);
    }

    #[test]
    fn test_egress_policy() {
        let table = default_egress_table();
        assert_eq!(table.lookup("aws_us-east-1"), 0.09);
        assert_eq!(table.lookup("vast_global"), 0.02);
        assert_eq!(table.lookup("lambda_us-west"), 0.05);
    }

    #[test]
    fn test_first_rule_wins() {
        let table = BrandTable::new(1).with_rule("a", 2).with_rule("ab", 3);
        assert_eq!(table.lookup("abc"), 2);
    }

    #[test]
    fn test_empty_keyword_never_matches() {
        let table = BrandTable::new(1).with_rule("", 9);
        assert_eq!(table.lookup("anything"), 1);
    }

    #[test]
    fn test_table_from_toml() {
        let toml_str = r#"
default = 16
rules = [
    { keyword = "runpod", value = 4 },
]
"#;
        let table: BrandTable<u32> = toml::from_str(toml_str).unwrap();
        assert_eq!(table.lookup("runpod_global"), 4);
        assert_eq!(table.lookup("azure_eastus"), 16);
    }
}
