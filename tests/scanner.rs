use modgraph::core::scanner::FileScanner;
use std::fs;
use std::path::Path;

fn touch<P: AsRef<Path>>(p: P) {
    fs::write(p, "# test\n").unwrap();
}

#[test]
fn scanner_keeps_only_python_sources_sorted() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("a")).unwrap();
    fs::create_dir_all(root.join("b")).unwrap();

    touch(root.join("b/late.py"));
    touch(root.join("a/early.py"));
    touch(root.join("a/readme.txt")); // not python
    touch(root.join("a/.#early.py")); // editor lock file

    let scanner = FileScanner::new(Vec::new());
    let files = scanner.scan_directory(root).unwrap();

    let names: Vec<String> = files
        .iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(names, vec!["a/early.py", "b/late.py"]);
}

#[test]
fn ignored_names_prune_files_and_directories() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("venv/lib")).unwrap();

    touch(root.join("venv/lib/junk.py"));
    touch(root.join("skipme.py"));
    touch(root.join("code.py"));

    let scanner = FileScanner::new(vec!["venv".to_string(), "skipme.py".to_string()]);
    let files = scanner.scan_directory(root).unwrap();

    let names: Vec<&str> = files
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(names, vec!["code.py"]);
}
