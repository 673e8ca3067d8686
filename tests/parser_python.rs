use modgraph::core::diag::Warner;
use modgraph::parsers::python::PythonParser;
use modgraph::parsers::{ParseOptions, ParseResult};
use std::path::Path;

fn parse(source: &str) -> (ParseResult, Warner) {
    let parser = PythonParser::new(ParseOptions::default());
    let mut warner = Warner::buffered();
    let result = parser
        .parse_source(source, Path::new("sample.py"), &mut warner)
        .unwrap();
    (result, warner)
}

#[test]
fn imports_are_recorded_as_written() {
    let code = "\
import a, b.c, d as e
from q.w.e import x, y as foo, z
from woof import *
";
    let (result, warner) = parse(code);

    let names: Vec<&str> = result.imports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["a", "b.c", "d", "q.w.e.x", "q.w.e.y", "q.w.e.z", "woof.*"]
    );
    assert!(warner.messages().is_empty());
}

#[test]
fn aliases_and_levels_are_kept() {
    let code = "\
import d as e
from q.w import y as foo
from . import sibling
from ..pkg import thing
";
    let (result, _) = parse(code);

    assert_eq!(result.imports[0].alias.as_deref(), Some("e"));
    assert_eq!(result.imports[0].level, None);
    assert_eq!(result.imports[1].name, "q.w.y");
    assert_eq!(result.imports[1].alias.as_deref(), Some("foo"));
    assert_eq!(result.imports[1].level, Some(0));
    assert_eq!(result.imports[2].name, "sibling");
    assert_eq!(result.imports[2].level, Some(1));
    assert_eq!(result.imports[3].name, "pkg.thing");
    assert_eq!(result.imports[3].level, Some(2));
}

#[test]
fn future_imports_are_ignored() {
    let code = "\
from __future__ import annotations
import os
";
    let (result, _) = parse(code);

    let names: Vec<&str> = result.imports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["os"]);
}

#[test]
fn multiline_import_lines_point_at_the_names() {
    let code = "\
from pkg import (
    alpha,
    beta,
)
";
    let (result, _) = parse(code);

    let located: Vec<(&str, usize)> = result
        .imports
        .iter()
        .map(|r| (r.name.as_str(), r.lineno))
        .collect();
    assert_eq!(located, vec![("pkg.alpha", 2), ("pkg.beta", 3)]);
}

#[test]
fn doctest_import_reported_at_prompt_line() {
    let code = "\
\"\"\"Module docs.

>>> import os
\"\"\"
";
    let (result, warner) = parse(code);

    assert_eq!(result.imports.len(), 1);
    assert_eq!(result.imports[0].name, "os");
    assert_eq!(result.imports[0].lineno, 3);
    assert!(warner.messages().is_empty());
}

#[test]
fn doctest_in_function_docstring() {
    let code = "\
def f():
    \"\"\"Docs.

    >>> import json
    \"\"\"
    return 1
";
    let (result, _) = parse(code);

    assert_eq!(result.imports.len(), 1);
    assert_eq!(result.imports[0].name, "json");
    assert_eq!(result.imports[0].lineno, 4);
}

#[test]
fn broken_doctest_block_is_skipped_not_fatal() {
    let code = "\
\"\"\"
>>> )
>>> import collections
\"\"\"
import sys
";
    let (result, warner) = parse(code);

    let names: Vec<&str> = result.imports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["collections", "sys"]);
    assert_eq!(result.imports[0].lineno, 3);
    assert_eq!(warner.messages().len(), 1);
    assert!(warner.messages()[0].contains("syntax error in doctest"));
}

#[test]
fn file_with_syntax_error_yields_empty_result() {
    let (result, warner) = parse("def f(:\n");

    assert!(result.imports.is_empty());
    assert_eq!(warner.messages().len(), 1);
    assert!(warner.messages()[0].contains("syntax error"));
}

#[test]
fn conditional_and_nested_imports_are_found() {
    let code = "\
try:
    import fast_json
except ImportError:
    import json


def f():
    import math
    return math.pi
";
    let (result, _) = parse(code);

    let names: Vec<&str> = result.imports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["fast_json", "json", "math"]);
}

#[test]
fn max_depth_bounds_the_walk() {
    let code = "\
import top


def f():
    import nested
";
    let parser = PythonParser::new(ParseOptions {
        max_depth: Some(1),
        ..ParseOptions::default()
    });
    let mut warner = Warner::buffered();
    let result = parser
        .parse_source(code, Path::new("sample.py"), &mut warner)
        .unwrap();

    let names: Vec<&str> = result.imports.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["top"]);
}
