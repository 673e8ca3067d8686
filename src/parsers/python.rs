use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::{Node as TSNode, Parser};

use super::common::{docstring_node, extract_text, read_source, TreeSitterParser};
use super::doctest;
use super::{ImportRecord, ParseOptions, ParseResult};
use crate::core::diag::Warner;

/// Scope-aware import extractor for one Python source file.
///
/// The statements
///
/// ```text
/// import a, b.c, d as e
/// from q.w.e import x, y as foo, z
/// from woof import *
/// ```
///
/// produce records named `a`, `b.c`, `d`, `q.w.e.x`, `q.w.e.y`, `q.w.e.z`
/// and `woof.*`. Doctest blocks inside docstrings are re-parsed and walked
/// with line numbers offset back into the enclosing file.
pub struct PythonParser {
    options: ParseOptions,
}

impl PythonParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn parse_file(&self, file_path: &Path, warner: &mut Warner) -> Result<ParseResult> {
        let source = read_source(file_path)?;
        self.parse_source(&source, file_path, warner)
    }

    /// Parse Python source text. A file whose parse contains syntax errors is
    /// reported once and yields an empty result; the caller keeps going.
    pub fn parse_source(
        &self,
        source: &str,
        file_path: &Path,
        warner: &mut Warner,
    ) -> Result<ParseResult> {
        let mut parser = TreeSitterParser::new(tree_sitter_python::language())?;
        let tree = parser.parse_source(source, file_path)?;
        if tree.root_node().has_error() {
            let origin = file_path.display().to_string();
            warner.warn(&origin, format!("{origin}: syntax error"));
            return Ok(ParseResult::default());
        }

        let mut walker = ImportWalker::new(file_path, source, &self.options, warner)?;
        walker.walk(&tree.root_node(), source.as_bytes(), 0);
        Ok(walker.finish())
    }
}

/// One lexical namespace. Non-root scopes point at their parent by arena
/// index; children never look up siblings, so plain indices suffice.
struct Scope {
    parent: Option<usize>,
    imports: HashMap<String, ImportRecord>,
    unused: HashMap<String, ImportRecord>,
}

impl Scope {
    fn new(parent: Option<usize>) -> Self {
        Self {
            parent,
            imports: HashMap::new(),
            unused: HashMap::new(),
        }
    }
}

const TOP_SCOPE: usize = 0;

struct ImportWalker<'a> {
    filename: &'a Path,
    file_lines: Vec<&'a str>,
    options: &'a ParseOptions,
    warner: &'a mut Warner,
    doctest_parser: Parser,
    imports: Vec<ImportRecord>,
    scopes: Vec<Scope>,
    active: Vec<usize>,
    unused: Vec<ImportRecord>,
    lineno_offset: usize,
}

impl<'a> ImportWalker<'a> {
    fn new(
        filename: &'a Path,
        source: &'a str,
        options: &'a ParseOptions,
        warner: &'a mut Warner,
    ) -> Result<Self> {
        let mut doctest_parser = Parser::new();
        doctest_parser.set_language(tree_sitter_python::language())?;
        Ok(Self {
            filename,
            file_lines: source.split('\n').collect(),
            options,
            warner,
            doctest_parser,
            imports: Vec::new(),
            scopes: vec![Scope::new(None)],
            active: vec![TOP_SCOPE],
            unused: Vec::new(),
            lineno_offset: 0,
        })
    }

    fn finish(mut self) -> ParseResult {
        self.flush_scope(TOP_SCOPE);
        self.unused.sort_by_key(|record| record.lineno);
        ParseResult {
            imports: self.imports,
            unused: self.unused,
        }
    }

    fn walk(&mut self, node: &TSNode, source: &[u8], depth: usize) {
        match node.kind() {
            "import_statement" => self.handle_import(node, source),
            "import_from_statement" => self.handle_import_from(node, source),
            // `from __future__ import ...` never names a real dependency.
            "future_import_statement" => {}
            "module" => {
                self.process_docstring(node, source, depth);
                self.walk_children(node, source, depth);
            }
            "class_definition" => self.handle_class(node, source, depth),
            "function_definition" => self.handle_function(node, source, depth),
            "lambda" => self.handle_lambda(node, source, depth),
            "attribute" => self.handle_attribute(node, source, depth),
            "identifier" => {
                let name = extract_text(node, source).to_string();
                self.use_name(&name);
            }
            // The key on the left of `f(key=...)` is not a name reference.
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.descend(&value, source, depth);
                }
            }
            "global_statement" | "nonlocal_statement" => {}
            "except_clause" => self.handle_except(node, source, depth),
            _ => self.walk_children(node, source, depth),
        }
    }

    fn descend(&mut self, child: &TSNode, source: &[u8], depth: usize) {
        let within_depth = self.options.max_depth.map_or(true, |max| depth < max);
        if within_depth {
            self.walk(child, source, depth + 1);
        }
    }

    fn walk_children(&mut self, node: &TSNode, source: &[u8], depth: usize) {
        let mut cursor = node.walk();
        let children: Vec<TSNode> = node.children(&mut cursor).collect();
        for child in children {
            self.descend(&child, source, depth);
        }
    }

    // ---- scopes ----------------------------------------------------------

    fn current_scope(&self) -> usize {
        self.active.last().copied().unwrap_or(TOP_SCOPE)
    }

    fn push_scope(&mut self, parent: usize) {
        self.scopes.push(Scope::new(Some(parent)));
        self.active.push(self.scopes.len() - 1);
    }

    fn pop_scope(&mut self) {
        if let Some(index) = self.active.pop() {
            self.flush_scope(index);
        }
    }

    fn flush_scope(&mut self, index: usize) {
        let mut leftovers: Vec<ImportRecord> =
            self.scopes[index].unused.drain().map(|(_, v)| v).collect();
        leftovers.sort_by_key(|record| record.lineno);
        self.unused.extend(leftovers);
    }

    /// Mark `name` used in the current scope and every ancestor; an outer
    /// import may be used by inner code.
    fn use_name(&mut self, name: &str) {
        if !self.options.track_unused {
            return;
        }
        let mut index = Some(self.current_scope());
        while let Some(i) = index {
            self.scopes[i].unused.remove(name);
            index = self.scopes[i].parent;
        }
    }

    fn have_import(&self, name: &str) -> bool {
        let mut index = Some(self.current_scope());
        while let Some(i) = index {
            if self.scopes[i].imports.contains_key(name) {
                return true;
            }
            index = self.scopes[i].parent;
        }
        false
    }

    fn where_imported(&self, name: &str) -> Option<&ImportRecord> {
        let mut index = Some(self.current_scope());
        while let Some(i) = index {
            if let Some(record) = self.scopes[i].imports.get(name) {
                return Some(record);
            }
            index = self.scopes[i].parent;
        }
        None
    }

    // ---- imports ---------------------------------------------------------

    fn handle_import(&mut self, node: &TSNode, source: &[u8]) {
        let mut cursor = node.walk();
        let names: Vec<TSNode> = node.children_by_field_name("name", &mut cursor).collect();
        for child in names {
            match child.kind() {
                "dotted_name" => {
                    let name = extract_text(&child, source).to_string();
                    self.process_import(&name, None, &name, None, node);
                }
                "aliased_import" => {
                    let Some(name_node) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let name = extract_text(&name_node, source).to_string();
                    let alias = child
                        .child_by_field_name("alias")
                        .map(|n| extract_text(&n, source).to_string());
                    self.process_import(&name, alias, &name, None, node);
                }
                _ => {}
            }
        }
    }

    fn handle_import_from(&mut self, node: &TSNode, source: &[u8]) {
        let (module, level) = match node.child_by_field_name("module_name") {
            Some(m) if m.kind() == "relative_import" => {
                let mut dots = 0;
                let mut name = None;
                let mut cursor = m.walk();
                for part in m.children(&mut cursor) {
                    match part.kind() {
                        "import_prefix" => {
                            dots = extract_text(&part, source).matches('.').count();
                        }
                        "dotted_name" => {
                            name = Some(extract_text(&part, source).to_string());
                        }
                        _ => {}
                    }
                }
                (name, dots)
            }
            Some(m) => (Some(extract_text(&m, source).to_string()), 0),
            None => (None, 0),
        };
        if module.as_deref() == Some("__future__") {
            return;
        }

        let mut cursor = node.walk();
        let has_wildcard = node
            .children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import");
        if has_wildcard {
            let full_name = match &module {
                Some(m) => format!("{m}.*"),
                None => "*".to_string(),
            };
            self.process_import("*", None, &full_name, Some(level), node);
            return;
        }

        let mut cursor = node.walk();
        let names: Vec<TSNode> = node.children_by_field_name("name", &mut cursor).collect();
        for child in names {
            let (written, alias) = match child.kind() {
                "dotted_name" => (extract_text(&child, source).to_string(), None),
                "aliased_import" => {
                    let Some(name_node) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let alias = child
                        .child_by_field_name("alias")
                        .map(|n| extract_text(&n, source).to_string());
                    (extract_text(&name_node, source).to_string(), alias)
                }
                _ => continue,
            };
            let full_name = match &module {
                Some(m) => format!("{m}.{written}"),
                None => written.clone(),
            };
            self.process_import(&written, alias, &full_name, Some(level), node);
        }
    }

    fn process_import(
        &mut self,
        written: &str,
        alias: Option<String>,
        full_name: &str,
        level: Option<usize>,
        node: &TSNode,
    ) {
        let stmt_line = self.lineno_offset + node.start_position().row + 1;
        let lineno = adjust_lineno(&self.file_lines, stmt_line, written);
        self.imports.push(ImportRecord {
            name: full_name.to_string(),
            alias: alias.clone(),
            filename: self.filename.to_path_buf(),
            lineno,
            level,
        });

        if !self.options.track_unused {
            return;
        }
        let binding = alias.unwrap_or_else(|| written.to_string());
        if binding == "*" {
            return;
        }

        if self.options.warn_duplicates && self.have_import(&binding) {
            let line = self
                .file_lines
                .get(stmt_line - 1)
                .copied()
                .unwrap_or_default();
            // A comment on the line is taken as an intentional re-export.
            if !line.contains('#') {
                let origin = self.filename.display();
                self.warner
                    .report(format!("{origin}:{stmt_line}: {binding} imported again"));
                if self.options.verbose {
                    if let Some(previous) = self.where_imported(&binding) {
                        let previous_line = previous.lineno;
                        self.warner.report(format!(
                            "{origin}:{previous_line}:   (location of previous import)"
                        ));
                    }
                }
            }
        } else {
            let record = ImportRecord {
                name: binding.clone(),
                alias: None,
                filename: self.filename.to_path_buf(),
                lineno: stmt_line,
                level,
            };
            let current_scope = self.current_scope();
            let scope = &mut self.scopes[current_scope];
            scope.imports.insert(binding.clone(), record.clone());
            scope.unused.insert(binding, record);
        }
    }

    // ---- definitions and docstrings --------------------------------------

    fn handle_class(&mut self, node: &TSNode, source: &[u8], depth: usize) {
        // Class bodies do not open a namespace of their own here; bindings
        // land in the enclosing scope.
        if let Some(body) = node.child_by_field_name("body") {
            self.process_docstring(&body, source, depth);
        }
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            self.descend(&superclasses, source, depth);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.descend(&body, source, depth);
        }
    }

    fn handle_function(&mut self, node: &TSNode, source: &[u8], depth: usize) {
        if self.options.track_unused {
            self.push_scope(self.current_scope());
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.process_docstring(&body, source, depth);
        }
        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.handle_parameters(&parameters, source, depth);
        }
        if let Some(return_type) = node.child_by_field_name("return_type") {
            self.descend(&return_type, source, depth);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.descend(&body, source, depth);
        }
        if self.options.track_unused {
            self.pop_scope();
        }
    }

    fn handle_lambda(&mut self, node: &TSNode, source: &[u8], depth: usize) {
        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.handle_parameters(&parameters, source, depth);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.descend(&body, source, depth);
        }
    }

    /// Parameter names are bindings, not references; only annotations and
    /// default values can mention imported names.
    fn handle_parameters(&mut self, node: &TSNode, source: &[u8], depth: usize) {
        let mut cursor = node.walk();
        let children: Vec<TSNode> = node.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "typed_parameter" => {
                    if let Some(ty) = child.child_by_field_name("type") {
                        self.descend(&ty, source, depth);
                    }
                }
                "default_parameter" | "typed_default_parameter" => {
                    if let Some(ty) = child.child_by_field_name("type") {
                        self.descend(&ty, source, depth);
                    }
                    if let Some(value) = child.child_by_field_name("value") {
                        self.descend(&value, source, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn handle_except(&mut self, node: &TSNode, source: &[u8], depth: usize) {
        let mut cursor = node.walk();
        let children: Vec<TSNode> = node.children(&mut cursor).collect();
        let mut after_as = false;
        for child in children {
            if child.kind() == "as" {
                after_as = true;
                continue;
            }
            // `except E as e` binds e; it is not a use of e.
            if after_as && child.kind() == "identifier" {
                after_as = false;
                continue;
            }
            self.descend(&child, source, depth);
        }
    }

    fn handle_attribute(&mut self, node: &TSNode, source: &[u8], depth: usize) {
        let mut parts: Vec<String> = Vec::new();
        let mut base = *node;
        while base.kind() == "attribute" {
            if let Some(attr) = base.child_by_field_name("attribute") {
                parts.push(extract_text(&attr, source).to_string());
            }
            match base.child_by_field_name("object") {
                Some(object) => base = object,
                None => break,
            }
        }

        if base.kind() == "identifier" {
            // A pure chain a.b.c marks a, a.b and a.b.c used, so
            // `import pkg` plus `pkg.sub.func()` counts as a use of pkg.
            parts.push(extract_text(&base, source).to_string());
            parts.reverse();
            let mut name = String::new();
            for part in parts {
                if name.is_empty() {
                    name = part;
                } else {
                    name = format!("{name}.{part}");
                }
                self.use_name(&name);
            }
        } else {
            // The chain hangs off a call or subscript; only the base
            // expression holds real name references.
            self.descend(&base, source, depth);
        }
    }

    fn process_docstring(&mut self, body: &TSNode, source: &[u8], depth: usize) {
        let Some((string_node, content)) = docstring_node(body, source) else {
            return;
        };
        let examples = doctest::parse_examples(&content);
        if examples.is_empty() {
            return;
        }

        let string_row = string_node.start_position().row;
        if self.options.track_unused {
            // Doctest scopes hang off the module scope, not the enclosing
            // function: the transcript runs against the module namespace.
            self.push_scope(TOP_SCOPE);
        }
        for example in examples {
            let saved_offset = self.lineno_offset;
            self.lineno_offset += string_row + example.lineno;
            match self.doctest_parser.parse(&example.source, None) {
                Some(tree) if !tree.root_node().has_error() => {
                    self.walk(&tree.root_node(), example.source.as_bytes(), depth);
                }
                _ => {
                    let origin = self.filename.display();
                    let prompt_line = self.lineno_offset + 1;
                    self.warner.warn(
                        &format!("{origin}:{prompt_line}"),
                        format!("{origin}:{prompt_line}: syntax error in doctest"),
                    );
                }
            }
            self.lineno_offset = saved_offset;
        }
        if self.options.track_unused {
            self.pop_scope();
        }
    }
}

/// Advance an import's line number to the line actually mentioning the
/// name. Import statements can span lines, and the statement's first line
/// may not contain the specific name.
fn adjust_lineno(lines: &[&str], start: usize, name: &str) -> usize {
    let pattern = if name == "*" {
        "[*]".to_string()
    } else {
        format!(r"\b{}\b", regex::escape(name))
    };
    let Ok(rx) = Regex::new(&pattern) else {
        return start;
    };
    let mut lineno = start.max(1);
    while lineno <= lines.len() && !rx.is_match(lines[lineno - 1]) {
        lineno += 1;
    }
    lineno
}
