use std::fmt::Write;
use std::fs;

use crate::core::graph::ModuleGraph;

/// Dependency report: one block per module, sorted dependency ids indented
/// beneath it.
pub struct ImportsReport {
    /// Include dependencies on modules outside the analyzed set.
    pub external_dependencies: bool,
}

impl ImportsReport {
    pub fn format(&self, graph: &ModuleGraph) -> String {
        let mut out = String::new();
        for module in graph.list_modules() {
            let imports: Vec<&str> = module
                .imports
                .iter()
                .filter(|name| self.external_dependencies || !graph.is_external(name))
                .map(String::as_str)
                .collect();
            let _ = writeln!(out, "{}:", module.label);
            let _ = writeln!(out, "  {}", imports.join("\n  "));
        }
        out
    }
}

/// Report of every imported name, in extraction order.
pub struct ImportedNamesReport;

impl ImportedNamesReport {
    pub fn format(&self, graph: &ModuleGraph) -> String {
        let mut out = String::new();
        for module in graph.list_modules() {
            let names: Vec<&str> = module
                .imported_names
                .iter()
                .map(|record| record.name.as_str())
                .collect();
            let _ = writeln!(out, "{}:", module.modname);
            let _ = writeln!(out, "  {}", names.join("\n  "));
        }
        out
    }
}

/// Report of imports that are never referenced, as `file:line: name` lines
/// sorted by line number.
pub struct UnusedImportsReport {
    /// Report even imports whose line carries a comment; by default a
    /// comment is taken as an explanation for why the import stays.
    pub all_unused: bool,
}

impl UnusedImportsReport {
    pub fn format(&self, graph: &ModuleGraph) -> String {
        let mut out = String::new();
        for module in graph.list_modules() {
            let source = fs::read_to_string(&module.filename).unwrap_or_default();
            let lines: Vec<&str> = source.split('\n').collect();

            let mut names: Vec<(usize, &str)> = module
                .unused_names
                .iter()
                .map(|record| (record.lineno, record.name.as_str()))
                .collect();
            names.sort();

            for (lineno, name) in names {
                if !self.all_unused {
                    let line = lines.get(lineno.saturating_sub(1)).copied().unwrap_or("");
                    if line.contains('#') {
                        continue;
                    }
                }
                let _ = writeln!(
                    out,
                    "{}:{}: {} not used",
                    module.filename.display(),
                    lineno,
                    name
                );
            }
        }
        out
    }
}
