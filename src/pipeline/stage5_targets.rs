use std::collections::BTreeMap;

use crate::model::row::Row;
use crate::model::targets::{TargetSet, grown_target};

/// Derives growth targets from the prior comparison period: identifier-bearing
/// row counts per top-level group and overall, grown by the configured
/// percent. Status plays no part here, so this runs independently of the
/// rollup build.
pub fn derive_targets(prior_rows: &[Row], growth_percent: u32) -> TargetSet {
    let mut grand = 0u64;
    let mut per_group: BTreeMap<String, u64> = BTreeMap::new();
    for row in prior_rows.iter().filter(|r| r.is_trackable()) {
        grand += 1;
        *per_group.entry(row.ou0.clone()).or_insert(0) += 1;
    }

    let group_targets = per_group
        .into_iter()
        .map(|(key, count)| (key, grown_target(count, growth_percent)))
        .collect();

    TargetSet {
        growth_percent,
        prior_grand_count: grand,
        grand_target: grown_target(grand, growth_percent),
        group_targets,
    }
}
