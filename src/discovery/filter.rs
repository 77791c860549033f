//! Ignore and include lists for gathered sprite paths.
//!
//! A list file holds one regular expression per line. Lines are trimmed;
//! blank lines and lines starting with `#` are skipped. A pattern must match
//! the whole sprite path.

use std::path::Path;

use regex::Regex;

use crate::error::{PackError, Result};

/// Compiled patterns from one list file.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<Regex>,
}

impl PatternList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a pattern list from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PackError::io(path, format!("Failed to read pattern list: {}", e)))?;
        Self::parse(&content)
    }

    /// Parse a pattern list, one expression per line.
    pub fn parse(content: &str) -> Result<Self> {
        let mut patterns = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let regex = Regex::new(&format!("^(?:{})$", line)).map_err(|e| PackError::Parse {
                message: format!("Invalid pattern on line {}: {}", index + 1, e),
                help: Some("Each line is a regular expression matched against the whole sprite path".to_string()),
            })?;
            patterns.push(regex);
        }
        Ok(Self { patterns })
    }

    pub fn is_match(&self, sprite_path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(sprite_path))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Decides which sprite paths are gathered.
#[derive(Debug, Clone, Default)]
pub struct SpriteFilter {
    pub ignore: PatternList,
    pub include: PatternList,
}

impl SpriteFilter {
    /// A sprite is dropped when an ignore pattern matches it, unless an
    /// include pattern matches it too.
    pub fn keeps(&self, sprite_path: &str) -> bool {
        !self.ignore.is_match(sprite_path) || self.include.is_match(sprite_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let list = PatternList::parse("# props\n\n  props/.*  \n#trees/.*\ntrees/Oak\n").unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.is_match("props/rocks/Rock"));
        assert!(list.is_match("trees/Oak"));
        assert!(!list.is_match("trees/Pine"));
    }

    #[test]
    fn test_full_match_only() {
        let list = PatternList::parse("Rock").unwrap();
        assert!(list.is_match("Rock"));
        assert!(!list.is_match("props/Rock"));
        assert!(!list.is_match("Rock_part0"));
    }

    #[test]
    fn test_alternation_is_anchored() {
        let list = PatternList::parse("a|b").unwrap();
        assert!(list.is_match("a"));
        assert!(!list.is_match("ab"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PatternList::parse("ok\n(unclosed").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_include_overrides_ignore() {
        let filter = SpriteFilter {
            ignore: PatternList::parse("props/.*").unwrap(),
            include: PatternList::parse("props/rocks/Boulder").unwrap(),
        };
        assert!(filter.keeps("trees/Oak"));
        assert!(!filter.keeps("props/rocks/Rock"));
        assert!(filter.keeps("props/rocks/Boulder"));
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        assert!(SpriteFilter::default().keeps("anything/at/all"));
    }
}
