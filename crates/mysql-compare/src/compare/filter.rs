//! Include/exclude table filtering with `*` and `?` glob patterns.

use regex::Regex;

use crate::error::{CompareError, Result};

/// Compiled include/exclude patterns.
///
/// A table passes when it matches at least one include pattern (or there are
/// none) and no exclude pattern. Matching is case-sensitive and anchored.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl TableFilter {
    /// Compile glob patterns.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// Whether no pattern is configured.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Check a single table name.
    pub fn matches(&self, table: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|re| re.is_match(table));
        included && !self.exclude.iter().any(|re| re.is_match(table))
    }

    /// Keep only the matching names.
    pub fn apply(&self, tables: Vec<String>) -> Vec<String> {
        if self.is_empty() {
            return tables;
        }
        tables.into_iter().filter(|t| self.matches(t)).collect()
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| glob_to_regex(p)).collect()
}

/// Translate a glob pattern into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re)
        .map_err(|e| CompareError::Config(format!("Invalid table pattern '{}': {}", pattern, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = TableFilter::default();
        assert!(filter.is_empty());
        assert_eq!(
            filter.apply(patterns(&["a", "b"])),
            patterns(&["a", "b"])
        );
    }

    #[test]
    fn test_include_and_exclude() {
        let filter = TableFilter::new(&patterns(&["order*", "user?"]), &patterns(&["*_archive"]))
            .unwrap();

        assert!(filter.matches("orders"));
        assert!(filter.matches("order_items"));
        assert!(filter.matches("users"));
        assert!(!filter.matches("user"));
        assert!(!filter.matches("orders_archive"));
        assert!(!filter.matches("products"));
    }

    #[test]
    fn test_literal_characters_are_escaped() {
        let filter = TableFilter::new(&patterns(&["a.b"]), &[]).unwrap();
        assert!(filter.matches("a.b"));
        assert!(!filter.matches("axb"));
    }

    #[test]
    fn test_exclude_only() {
        let filter = TableFilter::new(&[], &patterns(&["tmp_*"])).unwrap();
        assert_eq!(
            filter.apply(patterns(&["tmp_x", "users"])),
            patterns(&["users"])
        );
    }
}
