use modgraph::core::diag::Warner;
use modgraph::parsers::python::PythonParser;
use modgraph::parsers::{ParseOptions, ParseResult};
use std::path::Path;

fn track(source: &str) -> (ParseResult, Warner) {
    track_with(
        source,
        ParseOptions {
            track_unused: true,
            ..ParseOptions::default()
        },
    )
}

fn track_with(source: &str, options: ParseOptions) -> (ParseResult, Warner) {
    let parser = PythonParser::new(options);
    let mut warner = Warner::buffered();
    let result = parser
        .parse_source(source, Path::new("sample.py"), &mut warner)
        .unwrap();
    (result, warner)
}

fn unused_names(result: &ParseResult) -> Vec<(&str, usize)> {
    result
        .unused
        .iter()
        .map(|r| (r.name.as_str(), r.lineno))
        .collect()
}

#[test]
fn never_referenced_import_is_unused() {
    let code = "\
import os
import sys

print(sys.argv)
";
    let (result, _) = track(code);
    assert_eq!(unused_names(&result), vec![("os", 1)]);
}

#[test]
fn attribute_chain_marks_the_base_used() {
    let code = "\
import pkg

pkg.sub.func()
";
    let (result, _) = track(code);
    assert!(result.unused.is_empty());
}

#[test]
fn outer_import_used_by_inner_code() {
    let code = "\
import os


def f():
    return os.path
";
    let (result, _) = track(code);
    assert!(result.unused.is_empty());
}

#[test]
fn function_local_import_has_its_own_scope() {
    let code = "\
def f():
    import os
    return 1


def g():
    return 1
";
    let (result, _) = track(code);
    assert_eq!(unused_names(&result), vec![("os", 2)]);
}

#[test]
fn alias_is_the_reported_binding() {
    let code = "import os.path as p\n";
    let (result, _) = track(code);
    assert_eq!(unused_names(&result), vec![("p", 1)]);
}

#[test]
fn plain_dotted_import_binds_the_full_name() {
    let code = "\
import os.path

os.path.join('a', 'b')
";
    let (result, _) = track(code);
    assert!(result.unused.is_empty());
}

#[test]
fn doctest_usage_counts_as_a_use() {
    let code = "\
\"\"\"
>>> import json
>>> json.dumps({})
\"\"\"
";
    let (result, _) = track(code);
    assert!(result.unused.is_empty());
}

#[test]
fn unused_doctest_import_reported_at_prompt_line() {
    let code = "\
\"\"\"
>>> import json
\"\"\"
";
    let (result, _) = track(code);
    assert_eq!(unused_names(&result), vec![("json", 2)]);
}

#[test]
fn unused_list_is_sorted_by_line() {
    let code = "\
import zzz
import aaa
";
    let (result, _) = track(code);
    assert_eq!(unused_names(&result), vec![("zzz", 1), ("aaa", 2)]);
}

#[test]
fn keyword_argument_names_are_not_uses() {
    let code = "\
import key

f(key=1)
";
    let (result, _) = track(code);
    assert_eq!(unused_names(&result), vec![("key", 1)]);
}

#[test]
fn duplicate_rebinding_without_comment_warns() {
    let code = "\
import os
import os
";
    let (result, warner) = track_with(
        code,
        ParseOptions {
            track_unused: true,
            warn_duplicates: true,
            ..ParseOptions::default()
        },
    );
    assert_eq!(warner.messages(), ["sample.py:2: os imported again"]);
    assert_eq!(unused_names(&result), vec![("os", 1)]);
}

#[test]
fn duplicate_rebinding_with_comment_is_silent() {
    let code = "\
import os
import os  # reexport
";
    let (_, warner) = track_with(
        code,
        ParseOptions {
            track_unused: true,
            warn_duplicates: true,
            ..ParseOptions::default()
        },
    );
    assert!(warner.messages().is_empty());
}

#[test]
fn verbose_duplicates_point_at_the_previous_binding() {
    let code = "\
import os
import os
";
    let (_, warner) = track_with(
        code,
        ParseOptions {
            track_unused: true,
            warn_duplicates: true,
            verbose: true,
            ..ParseOptions::default()
        },
    );
    assert_eq!(warner.messages().len(), 2);
    assert!(warner.messages()[1].contains("sample.py:1:"));
}
