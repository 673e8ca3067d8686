use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::diag::Warner;
use super::resolver::ModuleResolver;
use crate::parsers::ImportRecord;

/// Package names folded into their parents by the test-collapsing transform.
pub const TEST_PACKAGE_NAMES: &[&str] = &["tests", "ftests"];

/// Node in the module dependency graph.
///
/// Packages and collapsed cycles are represented as modules too; `imports`
/// holds canonical ids of the modules this one depends on, `imported_names`
/// the raw records, `unused_names` the subset never referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub modname: String,
    pub label: String,
    pub filename: PathBuf,
    pub imports: BTreeSet<String>,
    pub imported_names: Vec<ImportRecord>,
    pub unused_names: Vec<ImportRecord>,
}

impl Module {
    pub fn new(modname: impl Into<String>, filename: impl Into<PathBuf>) -> Self {
        let modname = modname.into();
        Self {
            label: modname.clone(),
            modname,
            filename: filename.into(),
            imports: BTreeSet::new(),
            imported_names: Vec::new(),
            unused_names: Vec::new(),
        }
    }
}

/// One strongly connected component, condensed to a single node whose id is
/// the lexicographically smallest member and whose label lists all members.
#[derive(Debug, Clone)]
pub struct ModuleCycle {
    pub modnames: Vec<String>,
    pub modname: String,
    pub label: String,
    pub imports: BTreeSet<String>,
}

impl ModuleCycle {
    /// `modnames` must be sorted.
    pub fn new(modnames: Vec<String>) -> Self {
        let modname = modnames.first().cloned().unwrap_or_default();
        Self {
            label: modnames.join("\n"),
            modname,
            modnames,
            imports: BTreeSet::new(),
        }
    }

    pub fn into_module(self) -> Module {
        let mut module = Module::new(self.modname, PathBuf::new());
        module.label = self.label;
        module.imports = self.imports;
        module
    }
}

/// Module dependency graph: canonical id → module, kept sorted so every
/// listing and transform is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleGraph {
    pub modules: BTreeMap<String, Module>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, module: Module) {
        self.modules.insert(module.modname.clone(), module);
    }

    /// All modules in alphabetical order.
    pub fn list_modules(&self) -> Vec<&Module> {
        self.modules.values().collect()
    }

    /// A dependency target is external when it is not a node of this graph.
    pub fn is_external(&self, modname: &str) -> bool {
        !self.modules.contains_key(modname)
    }

    /// Group modules by owning package. With `externals_only`, modules of
    /// the analyzed set keep their identity and only external targets are
    /// collapsed. `package_level` truncates package names to their first N
    /// segments.
    pub fn package_graph(
        &self,
        resolver: &mut ModuleResolver,
        warner: &mut Warner,
        package_level: Option<usize>,
        externals_only: bool,
    ) -> ModuleGraph {
        let mut packages: BTreeMap<String, Module> = BTreeMap::new();
        for module in self.modules.values() {
            let package_name = self.maybe_package_of(
                resolver,
                warner,
                &module.modname,
                package_level,
                externals_only,
            );
            let deps: Vec<String> = module
                .imports
                .iter()
                .map(|name| {
                    self.maybe_package_of(resolver, warner, name, package_level, externals_only)
                })
                .collect();

            let dirname = module
                .filename
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let package = packages
                .entry(package_name.clone())
                .or_insert_with(|| Module::new(package_name, dirname));
            for dep in deps {
                if dep != package.modname {
                    package.imports.insert(dep);
                }
            }
        }
        ModuleGraph { modules: packages }
    }

    fn maybe_package_of(
        &self,
        resolver: &mut ModuleResolver,
        warner: &mut Warner,
        dotted_name: &str,
        package_level: Option<usize>,
        externals_only: bool,
    ) -> String {
        if externals_only && !self.is_external(dotted_name) {
            return dotted_name.to_string();
        }
        resolver.package_of(dotted_name, package_level, warner)
    }

    /// Fold test packages into their parents; meant for package graphs.
    pub fn collapse_tests(&self, pkgnames: &[&str]) -> ModuleGraph {
        let mut packages: BTreeMap<String, Module> = BTreeMap::new();
        for module in self.modules.values() {
            let package_name = strip_test_packages(&module.modname, pkgnames);
            if package_name == module.modname {
                packages.insert(
                    package_name,
                    Module::new(module.modname.clone(), module.filename.clone()),
                );
            }
        }
        for module in self.modules.values() {
            let package_name = strip_test_packages(&module.modname, pkgnames);
            let deps: Vec<String> = module
                .imports
                .iter()
                .map(|name| strip_test_packages(name, pkgnames))
                .collect();
            let package = packages
                .entry(package_name.clone())
                .or_insert_with(|| Module::new(package_name, module.filename.clone()));
            for dep in deps {
                if dep != package.modname {
                    package.imports.insert(dep);
                }
            }
        }
        ModuleGraph { modules: packages }
    }

    /// Strip the first matching of `prefixes` from every node id and edge
    /// target. Nodes whose id collapses to nothing are removed.
    pub fn remove_prefixes(&self, prefixes: &[String]) -> ModuleGraph {
        let union = prefixes
            .iter()
            .map(|prefix| regex::escape(prefix))
            .collect::<Vec<_>>()
            .join("|");
        let Ok(rx) = Regex::new(&format!(r"^(({union})\.)?")) else {
            return self.clone();
        };

        let mut modules: BTreeMap<String, Module> = BTreeMap::new();
        for module in self.modules.values() {
            let new_modname = rx.replace(&module.modname, "").to_string();
            if new_modname.is_empty() {
                continue;
            }
            let mut new_module = Module::new(new_modname.clone(), module.filename.clone());
            for name in &module.imports {
                let new_name = rx.replace(name, "").to_string();
                if !new_name.is_empty() && new_name != new_modname {
                    new_module.imports.insert(new_name);
                }
            }
            modules.insert(new_modname, new_module);
        }
        ModuleGraph { modules }
    }

    /// Collapse import cycles: strongly connected components of the internal
    /// subgraph become single nodes (edges leaving the analyzed set are
    /// ignored), with dependencies translated to target components and
    /// self-loops dropped.
    pub fn collapse_cycles(&self) -> ModuleGraph {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut indices: BTreeMap<&str, NodeIndex> = BTreeMap::new();
        for name in self.modules.keys() {
            indices.insert(name, graph.add_node(name));
        }
        for (name, module) in &self.modules {
            for dep in &module.imports {
                if let Some(&target) = indices.get(dep.as_str()) {
                    graph.add_edge(indices[name.as_str()], target, ());
                }
            }
        }

        let mut components: Vec<Vec<String>> = Vec::new();
        let mut component_of: HashMap<String, String> = HashMap::new();
        for component in kosaraju_scc(&graph) {
            let mut members: Vec<String> = component
                .iter()
                .map(|&index| graph[index].to_string())
                .collect();
            members.sort();
            let head = members.first().cloned().unwrap_or_default();
            for member in &members {
                component_of.insert(member.clone(), head.clone());
            }
            components.push(members);
        }

        let mut result = ModuleGraph::new();
        for members in components {
            let mut cycle = ModuleCycle::new(members.clone());
            for member in &members {
                let Some(module) = self.modules.get(member) else {
                    continue;
                };
                for dep in &module.imports {
                    if let Some(target) = component_of.get(dep) {
                        if target != &cycle.modname {
                            cycle.imports.insert(target.clone());
                        }
                    }
                }
            }
            result.add(cycle.into_module());
        }
        result
    }
}

/// Truncate a dotted name at the first segment naming a test package.
/// Names that would vanish entirely are left untouched.
fn strip_test_packages(dotted_name: &str, pkgnames: &[&str]) -> String {
    let mut result: Vec<&str> = Vec::new();
    for segment in dotted_name.split('.') {
        if pkgnames.contains(&segment) {
            break;
        }
        result.push(segment);
    }
    if result.is_empty() {
        return dotted_name.to_string();
    }
    result.join(".")
}
