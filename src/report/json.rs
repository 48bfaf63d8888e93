use serde::Serialize;

use crate::report::RollupView;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    tool: &'static str,
    version: &'static str,
    #[serde(flatten)]
    view: &'a RollupView,
}

pub fn render_rollup_json(view: &RollupView) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        tool: "apptally",
        version: env!("CARGO_PKG_VERSION"),
        view,
    })
}
