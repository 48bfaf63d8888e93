use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub mod json;
pub mod text;

use crate::model::rollup::{AggNode, sorted_group_keys};
use crate::model::status::StatusDisplayPolicy;
use crate::model::targets::grown_target;
use crate::pipeline::PipelineOutput;

pub const GRAND_TOTAL_LABEL: &str = "Grand Total";

/// Where a group's target number came from: the prior-period baseline, or
/// the current total grown by the same rule when no baseline matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetOrigin {
    Prior,
    CurrentFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCell {
    pub value: u64,
    pub progress_percent: f64,
    pub origin: TargetOrigin,
}

/// One displayed row. `by_status` is aligned with the view's visible status
/// columns; `total` still includes hidden statuses. Targets exist only on
/// top-level groups and the grand total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRow {
    pub key: String,
    pub by_status: Vec<u64>,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetCell>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GroupRow>,
}

/// The flattened presentation of one pipeline output: visible status columns
/// in ranked order, top-level groups sorted with the blank sentinel last,
/// and the grand-total row, which is the root re-labeled, never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupView {
    pub source: String,
    pub statuses: Vec<String>,
    pub groups: Vec<GroupRow>,
    pub grand_total: GroupRow,
    pub prior_grand_count: Option<u64>,
    pub growth_percent: u32,
    pub rows_seen: usize,
    pub rows_counted: usize,
}

fn visible_counts(node: &AggNode, visible_idx: &[usize]) -> Vec<u64> {
    visible_idx.iter().map(|&i| node.status_count(i)).collect()
}

fn progress_percent(total: u64, target: u64) -> f64 {
    if target == 0 {
        0.0
    } else {
        total as f64 * 100.0 / target as f64
    }
}

fn child_rows(node: &AggNode, visible_idx: &[usize]) -> Vec<GroupRow> {
    sorted_group_keys(&node.children)
        .into_iter()
        .map(|key| {
            let child = &node.children[key];
            GroupRow {
                key: key.to_string(),
                by_status: visible_counts(child, visible_idx),
                total: child.total,
                target: None,
                children: child_rows(child, visible_idx),
            }
        })
        .collect()
}

/// Builds the display view. The exclusion policy shrinks the visible column
/// set only; every total was computed before it applies.
pub fn build_view(output: &PipelineOutput, policy: &StatusDisplayPolicy) -> RollupView {
    let statuses = policy.visible(&output.rollup.status_order);
    let visible_idx: Vec<usize> = output
        .rollup
        .status_order
        .iter()
        .enumerate()
        .filter(|(_, s)| !policy.is_hidden(s))
        .map(|(i, _)| i)
        .collect();

    let root = &output.rollup.root;
    let target_for = |key: &str, total: u64| -> TargetCell {
        let (value, origin) = match &output.targets {
            Some(targets) => match targets.target_for_group(key) {
                Some(value) => (value, TargetOrigin::Prior),
                None => (
                    grown_target(total, targets.growth_percent),
                    TargetOrigin::CurrentFallback,
                ),
            },
            None => (
                grown_target(total, output.growth_percent),
                TargetOrigin::CurrentFallback,
            ),
        };
        TargetCell {
            value,
            progress_percent: progress_percent(total, value),
            origin,
        }
    };

    let groups: Vec<GroupRow> = sorted_group_keys(&root.children)
        .into_iter()
        .map(|key| {
            let node = &root.children[key];
            GroupRow {
                key: key.to_string(),
                by_status: visible_counts(node, &visible_idx),
                total: node.total,
                target: Some(target_for(key, node.total)),
                children: child_rows(node, &visible_idx),
            }
        })
        .collect();

    let grand_target = match &output.targets {
        Some(targets) => TargetCell {
            value: targets.grand_target,
            progress_percent: progress_percent(root.total, targets.grand_target),
            origin: TargetOrigin::Prior,
        },
        None => {
            let value = grown_target(root.total, output.growth_percent);
            TargetCell {
                value,
                progress_percent: progress_percent(root.total, value),
                origin: TargetOrigin::CurrentFallback,
            }
        }
    };

    let grand_total = GroupRow {
        key: GRAND_TOTAL_LABEL.to_string(),
        by_status: visible_counts(root, &visible_idx),
        total: root.total,
        target: Some(grand_target),
        children: Vec::new(),
    };

    RollupView {
        source: output.source.clone(),
        statuses,
        groups,
        grand_total,
        prior_grand_count: output.targets.as_ref().map(|t| t.prior_grand_count),
        growth_percent: output.growth_percent,
        rows_seen: output.rows_seen,
        rows_counted: output.rows_counted,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    Text,
    Json,
    Both,
}

pub fn write_reports(
    view: &RollupView,
    out_dir: &Path,
    mode: ReportMode,
) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();
    if matches!(mode, ReportMode::Text | ReportMode::Both) {
        let path = out_dir.join("rollup.txt");
        fs::write(&path, text::render_rollup_text(view))?;
        written.push(path);
    }
    if matches!(mode, ReportMode::Json | ReportMode::Both) {
        let path = out_dir.join("rollup.json");
        let body = json::render_rollup_json(view)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&path, body)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{CellValue, SheetTable, TableSource};
    use crate::model::row::BLANK_SENTINEL;
    use crate::pipeline::{PipelineOptions, run_pipeline};

    fn output(rows: Vec<Vec<&str>>, prior: Option<Vec<Vec<&str>>>) -> PipelineOutput {
        let make = |rows: Vec<Vec<&str>>| TableSource {
            available_tables: vec!["register".to_string()],
            table: SheetTable {
                name: "register".to_string(),
                columns: vec![
                    "Ministry".to_string(),
                    "Department".to_string(),
                    "Division".to_string(),
                    "Application ID".to_string(),
                    "Status".to_string(),
                ],
                rows: rows
                    .into_iter()
                    .map(|cells| {
                        cells
                            .into_iter()
                            .map(|c| {
                                if c.trim().is_empty() {
                                    CellValue::Blank
                                } else {
                                    CellValue::Text(c.to_string())
                                }
                            })
                            .collect()
                    })
                    .collect(),
            },
        };
        let current = make(rows);
        let prior = prior.map(make);
        run_pipeline(&current, prior.as_ref(), &PipelineOptions::default()).unwrap()
    }

    fn sample_output() -> PipelineOutput {
        output(
            vec![
                vec!["Finance", "Budget", "Planning", "F-1", "Draft"],
                vec!["Finance", "Budget", "Planning", "F-2", "Submitted"],
                vec!["Justice", "Courts", "North", "J-1", "Approved"],
                vec!["", "", "", "X-1", "Draft"],
            ],
            Some(vec![
                vec!["Finance", "Budget", "Planning", "P-1", "Approved"],
                vec!["Finance", "Budget", "Planning", "P-2", "Approved"],
                vec!["Finance", "Budget", "Planning", "P-3", "Approved"],
            ]),
        )
    }

    #[test]
    fn test_view_ordering_blank_last_grand_total_is_root() {
        let out = sample_output();
        let view = build_view(&out, &StatusDisplayPolicy::default());
        let keys: Vec<&str> = view.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Finance", "Justice", BLANK_SENTINEL]);
        assert_eq!(view.grand_total.key, GRAND_TOTAL_LABEL);
        assert_eq!(view.grand_total.total, out.rollup.root.total);
        assert_eq!(
            view.grand_total.by_status.iter().sum::<u64>(),
            out.rollup.root.total
        );
    }

    #[test]
    fn test_prior_target_and_fallback_target() {
        let out = sample_output();
        let view = build_view(&out, &StatusDisplayPolicy::default());

        // Finance has a prior counterpart: 3 prior rows -> target 4.
        let finance = &view.groups[0];
        let target = finance.target.as_ref().unwrap();
        assert_eq!(target.value, 4);
        assert_eq!(target.origin, TargetOrigin::Prior);
        assert!((target.progress_percent - 50.0).abs() < 1e-9);

        // Justice has no prior counterpart: falls back to its own total,
        // never to the grand target and never to zero.
        let justice = &view.groups[1];
        let target = justice.target.as_ref().unwrap();
        assert_eq!(target.value, 2);
        assert_eq!(target.origin, TargetOrigin::CurrentFallback);

        assert_eq!(view.grand_total.target.as_ref().unwrap().value, 4);
        assert_eq!(view.prior_grand_count, Some(3));
    }

    #[test]
    fn test_no_prior_all_targets_fall_back() {
        let out = output(
            vec![vec!["Finance", "Budget", "Planning", "F-1", "Draft"]],
            None,
        );
        let view = build_view(&out, &StatusDisplayPolicy::default());
        assert_eq!(view.prior_grand_count, None);
        let target = view.groups[0].target.as_ref().unwrap();
        assert_eq!(target.value, 2);
        assert_eq!(target.origin, TargetOrigin::CurrentFallback);
        assert_eq!(
            view.grand_total.target.as_ref().unwrap().origin,
            TargetOrigin::CurrentFallback
        );
    }

    #[test]
    fn test_hidden_status_leaves_totals_intact() {
        let out = sample_output();
        let policy = StatusDisplayPolicy::hide(["Draft"]);
        let view = build_view(&out, &policy);
        assert_eq!(view.statuses, vec!["Submitted", "Approved"]);
        // Two Draft rows stay inside the totals even though the column is
        // hidden.
        assert_eq!(view.grand_total.total, 4);
        assert_eq!(view.grand_total.by_status, vec![1, 1]);
        let finance = &view.groups[0];
        assert_eq!(finance.total, 2);
        assert_eq!(finance.by_status, vec![1, 0]);
    }

    #[test]
    fn test_nested_children_in_view() {
        let out = sample_output();
        let view = build_view(&out, &StatusDisplayPolicy::default());
        let finance = &view.groups[0];
        assert_eq!(finance.children.len(), 1);
        let budget = &finance.children[0];
        assert_eq!(budget.key, "Budget");
        assert!(budget.target.is_none());
        assert_eq!(budget.children[0].key, "Planning");
        assert_eq!(budget.children[0].total, 2);
    }

    #[test]
    fn test_write_reports_both_modes() {
        let out = sample_output();
        let view = build_view(&out, &StatusDisplayPolicy::default());
        let mut dir = std::env::temp_dir();
        dir.push(format!("apptally_report_test_{}", std::process::id()));
        let written = write_reports(&view, &dir, ReportMode::Both).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("rollup.txt"));
        assert!(written[1].ends_with("rollup.json"));
        let text = fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains(GRAND_TOTAL_LABEL));
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&written[1]).unwrap()).unwrap();
        assert_eq!(json["grandTotal"]["total"], 4);
        fs::remove_dir_all(&dir).ok();
    }
}
