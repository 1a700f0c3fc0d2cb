use lbwatch_model::CandidateFile;
use regex::Regex;

use super::FileFilter;
use crate::error::{LbwatchError, Result};

/// Include/exclude regexes matched against the whole file name.
///
/// Used by [`crate::FileEndpoint`] for its `include`/`exclude` options. It is
/// also a standalone [`FileFilter`] without a priority, so endpoints bound to
/// it are never destination-tagged.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl NameFilter {
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Ok(Self {
            include: include.map(compile_anchored).transpose()?,
            exclude: exclude.map(compile_anchored).transpose()?,
        })
    }

    pub fn include(pattern: &str) -> Result<Self> {
        Self::new(Some(pattern), None)
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_none() && self.exclude.is_none()
    }

    pub fn matches(&self, name: &str) -> bool {
        if let Some(include) = &self.include
            && !include.is_match(name)
        {
            return false;
        }
        !self
            .exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(name))
    }
}

fn compile_anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
        LbwatchError::Pattern {
            pattern: pattern.to_string(),
            source,
        }
    })
}

impl FileFilter for NameFilter {
    fn accept(&self, file: &CandidateFile) -> bool {
        self.matches(&file.name_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_must_match_whole_name() {
        let filter = NameFilter::include(r".*\.csv").expect("pattern");

        assert!(filter.matches("orders.csv"));
        assert!(!filter.matches("orders.csv.tmp"));
        assert!(filter.priority().is_none());
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter =
            NameFilter::new(Some(r".*\.csv"), Some(r"draft-.*")).expect("pattern");

        assert!(filter.accept(&CandidateFile::new("/in/final.csv")));
        assert!(!filter.accept(&CandidateFile::new("/in/draft-final.csv")));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = NameFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches("anything"));
    }

    #[test]
    fn reports_bad_patterns() {
        let err = NameFilter::include("(").expect_err("unbalanced");
        assert!(matches!(err, LbwatchError::Pattern { ref pattern, .. } if pattern == "("));
    }
}
