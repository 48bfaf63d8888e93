use thiserror::Error;

use crate::input::SheetTable;
use crate::model::row::fold_key;

/// Required columns could not be resolved against the actual header set.
/// Carries every missing column, not just the first, plus the table names the
/// source offered so the user can see what was actually uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "missing required column(s): {}; available tables: {}",
    .missing.join(", "),
    .available_tables.join(", ")
)]
pub struct SchemaError {
    pub missing: Vec<String>,
    pub available_tables: Vec<String>,
}

/// One required column: the label reported in errors plus accepted aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub label: &'static str,
    pub aliases: &'static [&'static str],
}

/// The five required columns of a register export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnAliases {
    pub ou0: ColumnSpec,
    pub ou1: ColumnSpec,
    pub ou2: ColumnSpec,
    pub key: ColumnSpec,
    pub status: ColumnSpec,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            ou0: ColumnSpec {
                label: "Ministry",
                aliases: &["Ministry / Agency", "Organization"],
            },
            ou1: ColumnSpec {
                label: "Department",
                aliases: &["Department / Directorate", "Dept"],
            },
            ou2: ColumnSpec {
                label: "Division",
                aliases: &["Division / Unit", "Unit", "Section"],
            },
            key: ColumnSpec {
                label: "Application ID",
                aliases: &["Application No", "Application Number", "App ID"],
            },
            status: ColumnSpec {
                label: "Status",
                aliases: &["Application Status", "Current Status"],
            },
        }
    }
}

/// Resolved header positions for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub ou0: usize,
    pub ou1: usize,
    pub ou2: usize,
    pub key: usize,
    pub status: usize,
}

/// Matches required columns against actual headers, comparing both sides
/// folded (trimmed, whitespace-collapsed, lower-cased). Fails with every
/// unresolved column at once.
pub fn resolve_columns(
    table: &SheetTable,
    aliases: &ColumnAliases,
    available_tables: &[String],
) -> Result<ColumnMap, SchemaError> {
    let folded: Vec<String> = table.columns.iter().map(|c| fold_key(c)).collect();

    let find = |spec: &ColumnSpec| -> Option<usize> {
        std::iter::once(spec.label)
            .chain(spec.aliases.iter().copied())
            .find_map(|alias| {
                let want = fold_key(alias);
                folded.iter().position(|have| *have == want)
            })
    };

    let mut missing = Vec::new();
    let mut require = |spec: &ColumnSpec| -> usize {
        match find(spec) {
            Some(idx) => idx,
            None => {
                missing.push(spec.label.to_string());
                usize::MAX
            }
        }
    };

    let map = ColumnMap {
        ou0: require(&aliases.ou0),
        ou1: require(&aliases.ou1),
        ou2: require(&aliases.ou2),
        key: require(&aliases.key),
        status: require(&aliases.status),
    };

    if missing.is_empty() {
        Ok(map)
    } else {
        Err(SchemaError {
            missing,
            available_tables: available_tables.to_vec(),
        })
    }
}
