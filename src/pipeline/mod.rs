use thiserror::Error;

pub mod coordinator;
pub mod stage1_resolve;
pub mod stage2_normalize;
pub mod stage3_status;
pub mod stage4_rollup;
pub mod stage5_targets;

use crate::input::{InputError, TableSource};
use crate::model::rollup::Rollup;
use crate::model::status::StatusRanking;
use crate::model::targets::{DEFAULT_GROWTH_PERCENT, TargetSet};
use self::stage1_resolve::{ColumnAliases, SchemaError, resolve_columns};
use self::stage2_normalize::normalize_rows;
use self::stage3_status::rank_statuses;
use self::stage4_rollup::build_rollup;
use self::stage5_targets::derive_targets;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub growth_percent: u32,
    pub aliases: ColumnAliases,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            growth_percent: DEFAULT_GROWTH_PERCENT,
            aliases: ColumnAliases::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub source: String,
    pub rollup: Rollup,
    pub targets: Option<TargetSet>,
    pub growth_percent: u32,
    pub rows_seen: usize,
    pub rows_counted: usize,
}

/// One full aggregation pass: resolve and normalize the current period, rank
/// its status vocabulary, build the rollup tree, and (when a prior period is
/// supplied) derive growth targets from it. The target step shares only the
/// normalizer with the rollup build.
pub fn run_pipeline(
    current: &TableSource,
    prior: Option<&TableSource>,
    opts: &PipelineOptions,
) -> Result<PipelineOutput, PipelineError> {
    let map = resolve_columns(&current.table, &opts.aliases, &current.available_tables)?;
    let rows = normalize_rows(&current.table, &map);
    let rows_counted = rows.iter().filter(|r| r.is_trackable()).count();

    let ranking = StatusRanking::canonical();
    let status_order = rank_statuses(&rows, &ranking);
    let rollup = build_rollup(&rows, &status_order);

    let targets = match prior {
        Some(source) => {
            let prior_map = resolve_columns(&source.table, &opts.aliases, &source.available_tables)?;
            let prior_rows = normalize_rows(&source.table, &prior_map);
            Some(derive_targets(&prior_rows, opts.growth_percent))
        }
        None => None,
    };

    tracing::info!(
        rows_seen = rows.len(),
        rows_counted,
        groups = rollup.root.children.len(),
        statuses = rollup.status_order.len(),
        targets = targets.is_some(),
        "pipeline complete"
    );

    Ok(PipelineOutput {
        source: current.table.name.clone(),
        rollup,
        targets,
        growth_percent: opts.growth_percent,
        rows_seen: rows.len(),
        rows_counted,
    })
}
