use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::model::row::fold_key;

/// Business workflow order for known statuses. Everything else sorts after
/// this list, alphabetically.
pub const CANONICAL_STATUS_ORDER: &[&str] = &[
    "Draft",
    "Submitted",
    "Approved",
    "Rejected",
    "Returned",
    "In Review",
    "In-Review",
    "Resubmitted",
    "Cancelled",
];

const UNRANKED_PRIORITY: usize = 9999;

/// Total order over status values: position in a canonical list first, then
/// alphabetical (case-insensitive) with the literal form as the final tie
/// break. The canonical list is configuration, not baked into the comparison.
#[derive(Debug, Clone)]
pub struct StatusRanking {
    priority: HashMap<String, usize>,
}

impl StatusRanking {
    pub fn new<'a, I>(canonical: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut priority = HashMap::new();
        for (idx, name) in canonical.into_iter().enumerate() {
            priority.entry(fold_key(name)).or_insert(idx);
        }
        Self { priority }
    }

    pub fn canonical() -> Self {
        Self::new(CANONICAL_STATUS_ORDER.iter().copied())
    }

    pub fn priority_of(&self, status: &str) -> usize {
        self.priority
            .get(&fold_key(status))
            .copied()
            .unwrap_or(UNRANKED_PRIORITY)
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let pa = self.priority_of(a);
        let pb = self.priority_of(b);
        pa.cmp(&pb)
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
            .then_with(|| a.cmp(b))
    }
}

/// Statuses hidden from the displayed dimension. Hidden statuses still count
/// toward node totals; only the visible column set shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusDisplayPolicy {
    hidden: BTreeSet<String>,
}

impl StatusDisplayPolicy {
    pub fn hide<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hidden: names.into_iter().map(|n| fold_key(n.as_ref())).collect(),
        }
    }

    pub fn is_hidden(&self, status: &str) -> bool {
        self.hidden.contains(&fold_key(status))
    }

    pub fn visible(&self, order: &[String]) -> Vec<String> {
        order
            .iter()
            .filter(|s| !self.is_hidden(s))
            .cloned()
            .collect()
    }
}
