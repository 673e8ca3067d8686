use modgraph::core::analyzer::{Analyzer, AnalyzerOptions};
use modgraph::core::cache;
use modgraph::core::diag::Warner;
use modgraph::formatters::{DotFormatter, ImportsReport, UnusedImportsReport};
use std::fs;
use std::path::Path;

fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

fn default_options() -> AnalyzerOptions {
    AnalyzerOptions {
        ignores: vec!["venv".to_string()],
        ..AnalyzerOptions::default()
    }
}

#[test]
fn analyzer_builds_a_graph_from_a_tree() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("a.py"), "import b\nimport os\n");
    write(&root.join("b.py"), "import a\n");

    let mut analyzer = Analyzer::with_warner(default_options(), Warner::buffered());
    let graph = analyzer.analyze(&[root.to_path_buf()]).unwrap();

    let names: Vec<&String> = graph.modules.keys().collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(
        graph.modules["a"].imports.iter().collect::<Vec<_>>(),
        vec!["b", "os"]
    );
    assert_eq!(
        graph.modules["b"].imports.iter().collect::<Vec<_>>(),
        vec!["a"]
    );
    assert!(analyzer.warner().messages().is_empty());
}

#[test]
fn import_cycle_collapses_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("a.py"), "import b\n");
    write(&root.join("b.py"), "import a\n");

    let mut analyzer = Analyzer::with_warner(default_options(), Warner::buffered());
    let graph = analyzer
        .analyze(&[root.to_path_buf()])
        .unwrap()
        .collapse_cycles();

    assert_eq!(graph.modules.len(), 1);
    assert_eq!(graph.modules["a"].label, "a\nb");
    assert!(graph.modules["a"].imports.is_empty());
}

#[test]
fn unused_report_respects_comments() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("c.py"), "import os\nimport sys  # noqa\n");

    let options = AnalyzerOptions {
        track_unused: true,
        ..default_options()
    };
    let mut analyzer = Analyzer::with_warner(options, Warner::buffered());
    let graph = analyzer.analyze(&[root.to_path_buf()]).unwrap();

    let quiet = UnusedImportsReport { all_unused: false }.format(&graph);
    assert!(quiet.contains(":1: os not used"));
    assert!(!quiet.contains("sys"));

    let all = UnusedImportsReport { all_unused: true }.format(&graph);
    assert!(all.contains(":1: os not used"));
    assert!(all.contains(":2: sys not used"));
}

#[test]
fn ignore_stdlib_drops_stdlib_imports() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("a.py"), "import b\nimport os\n");
    write(&root.join("b.py"), "");

    let options = AnalyzerOptions {
        ignore_stdlib: true,
        ..default_options()
    };
    let mut analyzer = Analyzer::with_warner(options, Warner::buffered());
    let graph = analyzer.analyze(&[root.to_path_buf()]).unwrap();

    assert_eq!(
        graph.modules["a"].imports.iter().collect::<Vec<_>>(),
        vec!["b"]
    );
}

#[test]
fn ignored_directories_are_pruned() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("venv")).unwrap();
    write(&root.join("venv/junk.py"), "import this\n");
    write(&root.join("a.py"), "");

    let mut analyzer = Analyzer::with_warner(default_options(), Warner::buffered());
    let graph = analyzer.analyze(&[root.to_path_buf()]).unwrap();

    let names: Vec<&String> = graph.modules.keys().collect();
    assert_eq!(names, vec!["a"]);
}

#[test]
fn cache_blob_substitutes_for_a_parse_pass() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("a.py"), "import b\n");
    write(&root.join("b.py"), "");

    let mut analyzer = Analyzer::with_warner(default_options(), Warner::buffered());
    let graph = analyzer.analyze(&[root.to_path_buf()]).unwrap();

    let blob = root.join("graph.depcache");
    cache::write_cache(&graph, &blob).unwrap();

    let mut second = Analyzer::with_warner(default_options(), Warner::buffered());
    let reloaded = second.analyze(&[blob]).unwrap();
    assert_eq!(reloaded, graph);
}

#[test]
fn reports_are_deterministic() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("a.py"), "import b\nimport zlib\n");
    write(&root.join("b.py"), "import a\n");

    let mut analyzer = Analyzer::with_warner(default_options(), Warner::buffered());
    let graph = analyzer.analyze(&[root.to_path_buf()]).unwrap();

    let report = ImportsReport {
        external_dependencies: true,
    };
    assert_eq!(report.format(&graph), report.format(&graph));
    assert_eq!(report.format(&graph), "a:\n  b\n  zlib\nb:\n  a\n");

    let dot = DotFormatter {
        attributes: vec!["rankdir=TB".to_string()],
        external_dependencies: true,
    }
    .format(&graph);
    assert!(dot.starts_with("digraph ModuleDependencies {"));
    assert!(dot.contains("  rankdir=TB"));
    assert!(dot.contains("mod0[label=\"a\"];"));
    assert!(dot.contains("extmod0[label=\"zlib\"];"));
    assert!(dot.contains("mod0 -> mod1;"));
    assert!(dot.ends_with("}"));
}

#[test]
fn syntax_errors_skip_the_file_but_not_the_run() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    write(&root.join("bad.py"), "def f(:\n");
    write(&root.join("good.py"), "import os\n");

    let mut analyzer = Analyzer::with_warner(default_options(), Warner::buffered());
    let graph = analyzer.analyze(&[root.to_path_buf()]).unwrap();

    let names: Vec<&String> = graph.modules.keys().collect();
    assert_eq!(names, vec!["bad", "good"]);
    assert!(graph.modules["bad"].imports.is_empty());
    assert_eq!(
        graph.modules["good"].imports.iter().collect::<Vec<_>>(),
        vec!["os"]
    );
    assert_eq!(analyzer.warner().messages().len(), 1);
    assert!(analyzer.warner().messages()[0].contains("syntax error"));
}
