use crate::input::{CellValue, SheetTable};
use crate::model::row::{Row, normalize_category, normalize_identifier};
use crate::pipeline::stage1_resolve::ColumnMap;

fn cell_text(cells: &[CellValue], idx: usize) -> String {
    cells.get(idx).map(CellValue::to_text).unwrap_or_default()
}

/// Turns raw table rows into canonical [`Row`]s. Categorical cells fall back
/// to the blank sentinel; the application key keeps its emptiness so the
/// aggregation filter can tell drafts apart from blank categories.
pub fn normalize_rows(table: &SheetTable, map: &ColumnMap) -> Vec<Row> {
    table
        .rows
        .iter()
        .map(|cells| Row {
            ou0: normalize_category(&cell_text(cells, map.ou0)),
            ou1: normalize_category(&cell_text(cells, map.ou1)),
            ou2: normalize_category(&cell_text(cells, map.ou2)),
            application_key: normalize_identifier(&cell_text(cells, map.key)),
            status: normalize_category(&cell_text(cells, map.status)),
        })
        .collect()
}
