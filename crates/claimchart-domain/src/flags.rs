//! Weakness flags attached to an element

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of weakness flags
///
/// Flags are compared by exact string after trimming surrounding whitespace.
/// Blank flags are never stored, and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FlagSet(BTreeSet<String>);

impl FlagSet {
    /// Create an empty flag set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a flag, returning whether it was new
    pub fn insert(&mut self, flag: impl AsRef<str>) -> bool {
        let flag = flag.as_ref().trim();
        if flag.is_empty() {
            return false;
        }
        self.0.insert(flag.to_string())
    }

    /// Set union: every flag from `self` and `other`, each exactly once
    ///
    /// # Examples
    ///
    /// ```
    /// use claimchart_domain::FlagSet;
    ///
    /// let a = FlagSet::from_iter(["A", "B"]);
    /// let b = FlagSet::from_iter(["B", "C"]);
    /// assert_eq!(a.union(&b), FlagSet::from_iter(["A", "B", "C"]));
    /// ```
    pub fn union(&self, other: &FlagSet) -> FlagSet {
        FlagSet(self.0.union(&other.0).cloned().collect())
    }

    /// Check whether a flag is present
    pub fn contains(&self, flag: &str) -> bool {
        self.0.contains(flag.trim())
    }

    /// Number of flags
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no flags are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over flags in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for FlagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = FlagSet::new();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

impl From<Vec<String>> for FlagSet {
    fn from(flags: Vec<String>) -> Self {
        flags.into_iter().collect()
    }
}

impl From<FlagSet> for Vec<String> {
    fn from(flags: FlagSet) -> Self {
        flags.0.into_iter().collect()
    }
}
