use anyhow::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tree_sitter::{Language, Node as TSNode, Parser, Tree};

pub struct TreeSitterParser {
    parser: Parser,
}

impl TreeSitterParser {
    pub fn new(language: Language) -> Result<Self> {
        let mut parser = Parser::new();
        parser.set_language(language)?;
        Ok(Self { parser })
    }

    pub fn parse_source(&mut self, source: &str, origin: &Path) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("Failed to parse file: {}", origin.display()))
    }
}

/// Buffered file reading; small files get an exactly-sized buffer.
pub fn read_source(file_path: &Path) -> Result<String> {
    let file = File::open(file_path)?;
    let metadata = file.metadata()?;
    let file_size = metadata.len() as usize;

    let mut reader =
        BufReader::with_capacity(if file_size < 8192 { file_size } else { 8192 }, file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content)?;
    Ok(content)
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

/// The docstring of a module, class, or function body: the string literal of
/// the first statement, if there is one.
pub fn docstring_node<'a>(body: &TSNode<'a>, source: &[u8]) -> Option<(TSNode<'a>, String)> {
    let first = body.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string_node = first.child(0)?;
    if string_node.kind() != "string" {
        return None;
    }
    let text = extract_text(&string_node, source);
    Some((string_node, strip_string_quotes(text)))
}

/// Strip an optional literal prefix (r, b, f, u in any case) and the
/// surrounding quotes from a Python string literal.
fn strip_string_quotes(literal: &str) -> String {
    let body = literal.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if let Some(rest) = body.strip_prefix(quote) {
            return rest.strip_suffix(quote).unwrap_or(rest).to_string();
        }
    }
    body.to_string()
}
