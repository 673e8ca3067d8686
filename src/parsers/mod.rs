pub mod common;
pub mod doctest;
pub mod python;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A record of an imported name and the location of the import statement.
///
/// Immutable once emitted; the line number has already been advanced to the
/// line actually mentioning the name, so a multi-name statement yields
/// several records with distinct lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Dotted name: `module.name` for from-imports, `module.*` for
    /// wildcards, the name as written for plain imports.
    pub name: String,
    /// Binding alias from an `as` clause, if any.
    pub alias: Option<String>,
    pub filename: PathBuf,
    /// 1-based line in `filename`.
    pub lineno: usize,
    /// `None` for plain imports; number of leading dots for from-imports
    /// (0 means absolute).
    pub level: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub imports: Vec<ImportRecord>,
    pub unused: Vec<ImportRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Track name references and report imports never used.
    pub track_unused: bool,
    /// Report rebindings of a name already imported in the scope chain.
    pub warn_duplicates: bool,
    /// Also report where the earlier binding of a duplicate lives.
    pub verbose: bool,
    /// Bound on generic descent into the syntax tree; `None` is unlimited.
    pub max_depth: Option<usize>,
}
