use anyhow::Result;
use serde_json::json;

use crate::core::graph::ModuleGraph;

/// Machine-readable dump of the graph for downstream tooling.
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format(&self, graph: &ModuleGraph) -> Result<String> {
        let modules: Vec<serde_json::Value> = graph
            .list_modules()
            .into_iter()
            .map(|module| {
                json!({
                    "name": module.modname,
                    "label": module.label,
                    "filename": module.filename,
                    "imports": module.imports,
                    "unused": module
                        .unused_names
                        .iter()
                        .map(|record| json!({"name": record.name, "line": record.lineno}))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        Ok(serde_json::to_string_pretty(&json!({ "modules": modules }))?)
    }
}
