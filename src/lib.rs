//! # modgraph
//!
//! Static import analysis for Python codebases.
//!
//! modgraph parses every source file of a project, works out which modules
//! it imports and whether each imported name is ever referenced, and builds
//! a directed module dependency graph that can be reshaped before rendering:
//! grouped into packages, test packages folded away, prefixes stripped, and
//! import cycles collapsed into single nodes via strongly connected
//! components.
//!
//! ## Reports
//!
//! - **imports**: per-module sorted dependency lists
//! - **names**: every imported name with its location
//! - **unused**: imports that are never referenced
//! - **dot**: graphviz rendering of the (transformed) graph
//! - **json**: machine-readable graph dump

pub mod core;
pub mod formatters;
pub mod parsers;

pub use crate::core::analyzer::{Analyzer, AnalyzerOptions};
pub use crate::core::diag::Warner;
pub use crate::core::graph::{Module, ModuleCycle, ModuleGraph};
pub use crate::core::resolver::ModuleResolver;
pub use crate::core::scanner::FileScanner;
pub use crate::parsers::{ImportRecord, ParseOptions, ParseResult};
