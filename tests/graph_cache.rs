use modgraph::core::cache::{read_cache, write_cache};
use modgraph::core::graph::{Module, ModuleGraph};
use modgraph::parsers::ImportRecord;
use std::path::PathBuf;

#[test]
fn cache_round_trips_the_node_map() {
    let mut graph = ModuleGraph::new();
    let mut module = Module::new("pkg.a", PathBuf::from("/src/pkg/a.py"));
    module.imports.insert("pkg.b".to_string());
    module.imports.insert("os".to_string());
    module.imported_names.push(ImportRecord {
        name: "os".to_string(),
        alias: None,
        filename: PathBuf::from("/src/pkg/a.py"),
        lineno: 1,
        level: None,
    });
    module.unused_names = module.imported_names.clone();
    graph.add(module);
    graph.add(Module::new("pkg.b", PathBuf::from("/src/pkg/b.py")));

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("graph.depcache");

    write_cache(&graph, &path).unwrap();
    let loaded = read_cache(&path).unwrap();

    assert_eq!(loaded, graph);
}

#[test]
fn unreadable_cache_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("corrupt.depcache");
    std::fs::write(&path, b"not a cache").unwrap();

    assert!(read_cache(&path).is_err());
}
