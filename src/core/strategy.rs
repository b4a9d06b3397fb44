//! Signature strategies and the set of strategies a run has enabled.

use serde::{Deserialize, Serialize};

/// One kind of file signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Strategy {
    /// MD5 digest of the full file contents
    Content,
    /// Difference hash of the decoded image
    Perceptual,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Content => write!(f, "md5 checksum"),
            Strategy::Perceptual => write!(f, "image hash"),
        }
    }
}

/// The strategies enabled for a run.
///
/// Each strategy appears at most once. Indexing needs at least one,
/// finding needs exactly one; those rules are checked where the set is
/// consumed, once, at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrategySet {
    content: bool,
    perceptual: bool,
}

impl StrategySet {
    /// An empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from the two CLI-style flags
    pub fn from_flags(content: bool, perceptual: bool) -> Self {
        Self {
            content,
            perceptual,
        }
    }

    /// Add a strategy to the set
    pub fn with(mut self, strategy: Strategy) -> Self {
        match strategy {
            Strategy::Content => self.content = true,
            Strategy::Perceptual => self.perceptual = true,
        }
        self
    }

    /// Check whether a strategy is enabled
    pub fn contains(&self, strategy: Strategy) -> bool {
        match strategy {
            Strategy::Content => self.content,
            Strategy::Perceptual => self.perceptual,
        }
    }

    /// Enabled strategies in a fixed order (content first)
    pub fn iter(&self) -> impl Iterator<Item = Strategy> + '_ {
        [Strategy::Content, Strategy::Perceptual]
            .into_iter()
            .filter(move |s| self.contains(*s))
    }

    /// Number of enabled strategies
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// True when nothing is enabled
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_no_strategies() {
        let set = StrategySet::new();
        assert!(set.is_empty());
        assert_eq!(set.iter().count(), 0);
    }

    #[test]
    fn adding_twice_does_not_duplicate() {
        let set = StrategySet::new()
            .with(Strategy::Content)
            .with(Strategy::Content);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn iteration_order_is_content_first() {
        let set = StrategySet::new()
            .with(Strategy::Perceptual)
            .with(Strategy::Content);
        let order: Vec<_> = set.iter().collect();
        assert_eq!(order, vec![Strategy::Content, Strategy::Perceptual]);
    }

    #[test]
    fn from_flags_matches_builder() {
        assert_eq!(
            StrategySet::from_flags(true, false),
            StrategySet::new().with(Strategy::Content)
        );
    }
}
