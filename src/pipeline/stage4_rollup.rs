use std::collections::HashMap;

use crate::model::rollup::{AggLevel, AggNode, Rollup};
use crate::model::row::{Row, fold_key};

/// Builds the three-level rollup tree. Rows without an application key are
/// excluded; every remaining row increments the root and the ou0/ou1/ou2
/// nodes on its path. Child creation is get-or-insert, so row order cannot
/// produce duplicate keys, and counts are order-independent.
pub fn build_rollup(rows: &[Row], status_order: &[String]) -> Rollup {
    let status_index: HashMap<String, usize> = status_order
        .iter()
        .enumerate()
        .map(|(idx, status)| (fold_key(status), idx))
        .collect();

    let mut root = AggNode::new(AggLevel::Root, None, status_order.len());
    let mut skipped_no_key = 0usize;

    for row in rows {
        if !row.is_trackable() {
            skipped_no_key += 1;
            continue;
        }
        let Some(&idx) = status_index.get(&fold_key(&row.status)) else {
            // A status outside the tracked vocabulary has no column; counting
            // it anywhere would break total == sum(by_status).
            tracing::warn!(status = %row.status, "row status not in tracked vocabulary; row not counted");
            continue;
        };
        root.record(idx);
        let node0 = root.child_entry(&row.ou0);
        node0.record(idx);
        let node1 = node0.child_entry(&row.ou1);
        node1.record(idx);
        let node2 = node1.child_entry(&row.ou2);
        node2.record(idx);
    }

    if skipped_no_key > 0 {
        tracing::info!(
            skipped = skipped_no_key,
            "rows without application id excluded from rollup"
        );
    }

    Rollup {
        status_order: status_order.to_vec(),
        root,
    }
}
