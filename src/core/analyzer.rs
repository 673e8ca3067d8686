use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::cache;
use super::diag::Warner;
use super::graph::{Module, ModuleGraph};
use super::resolver::ModuleResolver;
use super::scanner::FileScanner;
use super::stdlib;
use crate::parsers::python::PythonParser;
use crate::parsers::{ParseOptions, ParseResult};

#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Track name references and record imports never used.
    pub track_unused: bool,
    /// Report duplicate import bindings.
    pub warn_duplicates: bool,
    /// Report locations of earlier bindings for duplicates.
    pub verbose: bool,
    /// Bound on syntax-tree descent; `None` is unlimited.
    pub max_depth: Option<usize>,
    /// Drop imports of standard-library modules from the graph.
    pub ignore_stdlib: bool,
    /// File or directory names skipped during enumeration.
    pub ignores: Vec<String>,
    /// Global module search path (directories or zip archives).
    pub search_path: Vec<PathBuf>,
}

/// Runs one analysis pass: enumerate, parse, resolve, accumulate a graph.
///
/// The resolver's memo and the warner's already-warned set live for exactly
/// one pass; parsing all files before resolving any import keeps the result
/// independent of enumeration order.
pub struct Analyzer {
    parser: PythonParser,
    scanner: FileScanner,
    resolver: ModuleResolver,
    warner: Warner,
    ignore_stdlib: bool,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self::with_warner(options, Warner::new())
    }

    /// Analyzer reporting into the given warner (tests use a buffered one).
    pub fn with_warner(options: AnalyzerOptions, warner: Warner) -> Self {
        let parse_options = ParseOptions {
            track_unused: options.track_unused,
            warn_duplicates: options.warn_duplicates,
            verbose: options.verbose,
            max_depth: options.max_depth,
        };
        Self {
            parser: PythonParser::new(parse_options),
            scanner: FileScanner::new(options.ignores),
            resolver: ModuleResolver::new(options.search_path),
            warner,
            ignore_stdlib: options.ignore_stdlib,
        }
    }

    pub fn warner(&self) -> &Warner {
        &self.warner
    }

    /// The run's resolver and warner, for transforms that resolve packages.
    pub fn parts_mut(&mut self) -> (&mut ModuleResolver, &mut Warner) {
        (&mut self.resolver, &mut self.warner)
    }

    /// Analyze files, directories, and cache blobs into one module graph.
    pub fn analyze(&mut self, paths: &[PathBuf]) -> Result<ModuleGraph> {
        let mut graph = ModuleGraph::new();
        let mut parsed: Vec<(String, PathBuf, ParseResult)> = Vec::new();

        for path in paths {
            if path.is_dir() {
                for file in self.scanner.scan_directory(path)? {
                    self.parse_one(&file, &mut parsed);
                }
            } else if path
                .extension()
                .map_or(false, |ext| ext == cache::CACHE_EXTENSION)
            {
                match cache::read_cache(path) {
                    Ok(cached) => graph.modules.extend(cached.modules),
                    Err(err) => {
                        let origin = path.display().to_string();
                        self.warner
                            .warn(&origin, format!("{origin}: failed to load cache: {err}"));
                    }
                }
            } else {
                self.parse_one(path, &mut parsed);
            }
        }

        // Every analyzed module is resolvable by name before any import is
        // resolved, so results do not depend on enumeration order.
        for (modname, _, _) in &parsed {
            self.resolver.add_known_module(modname.clone());
        }

        for (modname, filename, result) in parsed {
            graph.add(self.build_module(modname, filename, result));
        }
        Ok(graph)
    }

    fn parse_one(&mut self, file: &Path, parsed: &mut Vec<(String, PathBuf, ParseResult)>) {
        let modname = self.resolver.filename_to_modname(file, &mut self.warner);
        let result = match self.parser.parse_file(file, &mut self.warner) {
            Ok(result) => result,
            Err(err) => {
                let origin = file.display().to_string();
                self.warner
                    .warn(&origin, format!("{origin}: failed to parse: {err}"));
                ParseResult::default()
            }
        };
        parsed.push((modname, file.to_path_buf(), result));
    }

    fn build_module(&mut self, modname: String, filename: PathBuf, result: ParseResult) -> Module {
        let mut imported_names = result.imports;
        if self.ignore_stdlib {
            imported_names.retain(|record| !stdlib::is_stdlib(&record.name));
        }

        let dir = filename.parent().map(Path::to_path_buf);
        let mut imports: BTreeSet<String> = BTreeSet::new();
        for record in &imported_names {
            let target = self.resolver.find_module_of_name(
                &record.name,
                record.level,
                &filename,
                dir.as_deref(),
                &mut self.warner,
            );
            imports.insert(target);
        }
        // A module never depends on itself.
        imports.remove(&modname);
        if self.ignore_stdlib {
            imports.retain(|name| stdlib::STDLIB_MODULES.binary_search(&name.as_str()).is_err());
        }

        let mut module = Module::new(modname, filename);
        module.imports = imports;
        module.imported_names = imported_names;
        module.unused_names = result.unused;
        module
    }
}
