use std::collections::BTreeMap;

use crate::model::row::BLANK_SENTINEL;

/// Grouping depth of one aggregate node. The tree is always root → ou0 →
/// ou1 → ou2; `child_level` encodes that shape so descent cannot overrun it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggLevel {
    Root,
    Ou0,
    Ou1,
    Ou2,
}

impl AggLevel {
    pub fn child_level(self) -> Option<AggLevel> {
        match self {
            AggLevel::Root => Some(AggLevel::Ou0),
            AggLevel::Ou0 => Some(AggLevel::Ou1),
            AggLevel::Ou1 => Some(AggLevel::Ou2),
            AggLevel::Ou2 => None,
        }
    }
}

/// One node of the rollup tree: per-status counts aligned with the status
/// order the tree was built against, the node total, and children keyed by
/// group value. `key` is `None` only at the root.
#[derive(Debug, Clone, PartialEq)]
pub struct AggNode {
    pub level: AggLevel,
    pub key: Option<String>,
    pub by_status: Vec<u64>,
    pub total: u64,
    pub children: BTreeMap<String, AggNode>,
}

impl AggNode {
    pub fn new(level: AggLevel, key: Option<String>, n_statuses: usize) -> Self {
        Self {
            level,
            key,
            by_status: vec![0; n_statuses],
            total: 0,
            children: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, status_idx: usize) {
        self.by_status[status_idx] += 1;
        self.total += 1;
    }

    /// Get-or-insert semantics: one node per distinct key under a parent.
    pub fn child_entry(&mut self, key: &str) -> &mut AggNode {
        let level = self
            .level
            .child_level()
            .expect("leaf nodes have no children");
        let n_statuses = self.by_status.len();
        self.children
            .entry(key.to_string())
            .or_insert_with(|| AggNode::new(level, Some(key.to_string()), n_statuses))
    }

    pub fn status_count(&self, status_idx: usize) -> u64 {
        self.by_status.get(status_idx).copied().unwrap_or(0)
    }
}

/// The full aggregation result: the ranked status vocabulary and the root
/// node owning the three-level descendant tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Rollup {
    pub status_order: Vec<String>,
    pub root: AggNode,
}

impl Rollup {
    pub fn is_empty(&self) -> bool {
        self.root.total == 0
    }
}

/// Presentation order for group keys: lexicographic, with the blank sentinel
/// forced last regardless of where it would sort.
pub fn sorted_group_keys(children: &BTreeMap<String, AggNode>) -> Vec<&str> {
    let mut keys: Vec<&str> = children
        .keys()
        .map(String::as_str)
        .filter(|k| *k != BLANK_SENTINEL)
        .collect();
    if children.contains_key(BLANK_SENTINEL) {
        keys.push(BLANK_SENTINEL);
    }
    keys
}
