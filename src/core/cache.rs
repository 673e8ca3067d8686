use anyhow::Result;
use std::fs;
use std::path::Path;

use super::graph::ModuleGraph;

/// Extension marking an input path as a serialized graph rather than source.
pub const CACHE_EXTENSION: &str = "depcache";

/// Serialize the graph's node map so later runs can skip the parse pass.
pub fn write_cache(graph: &ModuleGraph, path: &Path) -> Result<()> {
    let data = bincode::serialize(&graph.modules)?;
    fs::write(path, data)?;
    Ok(())
}

/// Load a graph previously written by [`write_cache`].
pub fn read_cache(path: &Path) -> Result<ModuleGraph> {
    let data = fs::read(path)?;
    let modules = bincode::deserialize(&data)?;
    Ok(ModuleGraph { modules })
}
