use crate::pipeline::coordinator::EMPTY_STATE_MESSAGE;
use crate::report::{GroupRow, RollupView};

struct Line<'a> {
    indent: usize,
    row: &'a GroupRow,
}

fn flatten<'a>(rows: &'a [GroupRow], indent: usize, out: &mut Vec<Line<'a>>) {
    for row in rows {
        out.push(Line { indent, row });
        flatten(&row.children, indent + 2, out);
    }
}

pub fn render_rollup_text(view: &RollupView) -> String {
    let mut out = String::new();

    let title = format!("Application Status Rollup: {}", view.source);
    out.push_str(&title);
    out.push('\n');
    out.push_str(&"=".repeat(title.chars().count()));
    out.push_str("\n\n");

    out.push_str(&format!(
        "Rows: {} read, {} with an application id\n",
        view.rows_seen, view.rows_counted
    ));
    match view.prior_grand_count {
        Some(count) => out.push_str(&format!(
            "Prior period baseline: {} applications; grand target {} (growth {}%)\n",
            count,
            view.grand_total
                .target
                .as_ref()
                .map(|t| t.value)
                .unwrap_or(0),
            view.growth_percent
        )),
        None => out.push_str(&format!(
            "Prior period baseline: unavailable; targets derived from current totals (growth {}%)\n",
            view.growth_percent
        )),
    }
    out.push('\n');

    if view.groups.is_empty() {
        out.push_str(EMPTY_STATE_MESSAGE);
        out.push('\n');
        return out;
    }

    let mut lines = Vec::new();
    flatten(&view.groups, 0, &mut lines);

    let mut name_width = "Group".len().max(view.grand_total.key.chars().count());
    for line in &lines {
        name_width = name_width.max(line.indent + line.row.key.chars().count());
    }

    let mut status_widths: Vec<usize> = view
        .statuses
        .iter()
        .map(|s| s.chars().count().max(3))
        .collect();
    for line in &lines {
        for (idx, count) in line.row.by_status.iter().enumerate() {
            status_widths[idx] = status_widths[idx].max(count.to_string().len());
        }
    }

    let total_width = "Total"
        .len()
        .max(view.grand_total.total.to_string().len());
    let mut target_width = "Target".len().max(
        view.grand_total
            .target
            .as_ref()
            .map(|t| t.value.to_string().len())
            .unwrap_or(0),
    );
    for line in &lines {
        if let Some(target) = &line.row.target {
            target_width = target_width.max(target.value.to_string().len());
        }
    }

    let mut header = format!("{:<name_width$}", "Group");
    for (status, &width) in view.statuses.iter().zip(&status_widths) {
        header.push_str(&format!("  {status:>width$}"));
    }
    header.push_str(&format!(
        "  {:>total_width$}  {:>target_width$}  Progress",
        "Total", "Target"
    ));
    let rule = "-".repeat(header.chars().count());

    out.push_str(&header);
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    let mut push_row = |out: &mut String, indent: usize, row: &GroupRow| {
        let name = format!("{}{}", " ".repeat(indent), row.key);
        out.push_str(&format!("{name:<name_width$}"));
        for (&count, &width) in row.by_status.iter().zip(&status_widths) {
            out.push_str(&format!("  {count:>width$}"));
        }
        out.push_str(&format!("  {:>total_width$}", row.total));
        match &row.target {
            Some(target) => out.push_str(&format!(
                "  {:>target_width$}  {:>7.1}%",
                target.value, target.progress_percent
            )),
            None => out.push_str(&format!("  {:>target_width$}  {:>8}", "", "")),
        }
        out.push('\n');
    };

    for line in &lines {
        push_row(&mut out, line.indent, line.row);
    }
    out.push_str(&rule);
    out.push('\n');
    push_row(&mut out, 0, &view.grand_total);

    out
}
