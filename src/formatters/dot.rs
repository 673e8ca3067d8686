use std::collections::{BTreeSet, HashMap};

use crate::core::graph::ModuleGraph;

/// Graphviz rendering of a module graph: box nodes for analyzed modules,
/// dotted nodes for external dependencies, stable `modN`/`extmodN` ids.
pub struct DotFormatter {
    /// Extra graph attribute lines, e.g. `rankdir=TB`.
    pub attributes: Vec<String>,
    pub external_dependencies: bool,
}

impl DotFormatter {
    pub fn format(&self, graph: &ModuleGraph) -> String {
        let mut lines: Vec<String> = vec!["digraph ModuleDependencies {".to_string()];
        for attribute in &self.attributes {
            lines.push(format!("  {attribute}"));
        }
        lines.push("  node[shape=box];".to_string());

        let mut all_names: BTreeSet<&str> = BTreeSet::new();
        let mut dot_names: HashMap<&str, String> = HashMap::new();
        for (n, module) in graph.list_modules().into_iter().enumerate() {
            let id = format!("mod{n}");
            lines.push(format!("  {id}[label=\"{}\"];", quote(&module.label)));
            dot_names.insert(module.modname.as_str(), id);
            all_names.extend(module.imports.iter().map(String::as_str));
        }

        lines.push("  node[style=dotted];".to_string());
        if self.external_dependencies {
            let externals: Vec<&str> = all_names
                .into_iter()
                .filter(|name| graph.is_external(name))
                .collect();
            for (n, name) in externals.into_iter().enumerate() {
                let id = format!("extmod{n}");
                lines.push(format!("  {id}[label=\"{name}\"];"));
                dot_names.insert(name, id);
            }
        }

        for (modname, module) in &graph.modules {
            for other in &module.imports {
                if let (Some(source), Some(target)) = (
                    dot_names.get(modname.as_str()),
                    dot_names.get(other.as_str()),
                ) {
                    lines.push(format!("  {source} -> {target};"));
                }
            }
        }
        lines.push("}".to_string());
        lines.join("\n")
    }
}

/// Quote a label for graphviz; cycle labels contain newlines.
fn quote(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
