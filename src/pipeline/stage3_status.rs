use std::collections::HashSet;

use crate::model::row::{Row, fold_key};
use crate::model::status::StatusRanking;

/// Derives the status column order for one aggregation pass: distinct status
/// values of trackable rows, deduplicated case/whitespace-insensitively
/// (first literal form wins), sorted by the ranking. The result depends only
/// on the distinct status set, never on row order.
pub fn rank_statuses(rows: &[Row], ranking: &StatusRanking) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut distinct: Vec<String> = Vec::new();
    for row in rows.iter().filter(|r| r.is_trackable()) {
        if seen.insert(fold_key(&row.status)) {
            distinct.push(row.status.clone());
        }
    }
    distinct.sort_by(|a, b| ranking.compare(a, b));
    distinct
}
