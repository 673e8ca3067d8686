pub mod dot;
pub mod json;
pub mod text;

pub use dot::DotFormatter;
pub use json::JsonFormatter;
pub use text::{ImportedNamesReport, ImportsReport, UnusedImportsReport};
