use std::collections::{HashMap, HashSet};
use std::env;
use std::fs::File;
use std::path::{Component, Path, PathBuf};

use super::diag::Warner;
use super::stdlib;

/// Presence of this file declares a directory to be a package.
pub const PACKAGE_MARKER: &str = "__init__.py";

const DEFAULT_EXTENSIONS: &[&str] = &[".py", ".so", ".dll", ".pyd"];

/// Maps dotted import names to canonical module identifiers.
///
/// Searches, in order: modules already known to the analysis, the
/// standard-library table, the importing file's directory (for relative
/// imports), then every entry of the global search path — directories and
/// zip archives alike. Results (hits and misses) are memoized per
/// (name, extra root) pair, so a repeated query does no filesystem probes.
pub struct ModuleResolver {
    search_path: Vec<PathBuf>,
    extensions: Vec<String>,
    known_modules: HashSet<String>,
    module_cache: HashMap<(String, Option<PathBuf>), Option<String>>,
}

impl ModuleResolver {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self {
            search_path,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            known_modules: HashSet::new(),
            module_cache: HashMap::new(),
        }
    }

    /// Register an additional recognized file extension (".pyx" style,
    /// leading dot included).
    pub fn add_extension(&mut self, extension: &str) {
        self.extensions.push(extension.to_string());
    }

    /// Register a module name the analysis already holds in memory, making
    /// it resolvable without touching the filesystem.
    pub fn add_known_module(&mut self, modname: impl Into<String>) {
        self.known_modules.insert(modname.into());
    }

    /// Derive the canonical module id of a source file: strip the longest
    /// recognized extension, then climb parent directories while each one
    /// carries a package marker, accumulating dotted segments.
    pub fn filename_to_modname(&self, filename: &Path, warner: &mut Warner) -> String {
        let display = filename.to_string_lossy().to_string();
        let mut extensions: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        extensions.sort_by_key(|ext| std::cmp::Reverse(ext.len()));

        let base = match extensions
            .iter()
            .find_map(|ext| display.strip_suffix(ext))
        {
            Some(stripped) => stripped.to_string(),
            None => {
                warner.warn(&display, format!("{display}: unknown file name extension"));
                display.clone()
            }
        };

        let absolute = absolutize(Path::new(&base));
        let mut segments: Vec<String> = Vec::new();
        if let Some(name) = absolute.file_name() {
            segments.push(name.to_string_lossy().to_string());
        }
        let mut dir = absolute.parent();
        while let Some(d) = dir {
            if !d.join(PACKAGE_MARKER).exists() {
                break;
            }
            match d.file_name() {
                Some(name) => segments.push(name.to_string_lossy().to_string()),
                None => break,
            }
            dir = d.parent();
        }
        segments.reverse();
        segments.join(".")
    }

    /// Find what module a fully qualified name lives in.
    ///
    /// Longest resolvable prefix wins, testing "is a module" before "is a
    /// package" at every prefix; total failure warns once per distinct name
    /// and falls back to the literal name so the graph never has a gap.
    pub fn find_module_of_name(
        &mut self,
        dotted_name: &str,
        level: Option<usize>,
        filename: &Path,
        extrapath: Option<&Path>,
        warner: &mut Warner,
    ) -> String {
        // A wildcard import is the module itself, never a symbol of it.
        if let Some(stripped) = dotted_name.strip_suffix(".*") {
            return stripped.to_string();
        }

        // from .. import X climbs one directory per dot beyond the first.
        let extrapath = match (level, extrapath) {
            (Some(level), Some(extra)) if level > 1 => {
                let mut dir = extra.to_path_buf();
                for _ in 0..level - 1 {
                    dir.pop();
                }
                Some(dir)
            }
            (_, Some(extra)) => Some(extra.to_path_buf()),
            (_, None) => None,
        };

        let mut name = dotted_name;
        while !name.is_empty() {
            if let Some(modname) = self.is_module(name, extrapath.as_deref(), warner) {
                return modname;
            }
            if let Some(modname) = self.is_package(name, extrapath.as_deref(), warner) {
                return modname;
            }
            name = match name.rfind('.') {
                Some(dot) => &name[..dot],
                None => "",
            };
        }

        warner.warn(
            dotted_name,
            format!("{}: could not find {}", filename.display(), dotted_name),
        );
        dotted_name.to_string()
    }

    /// Is `dotted_name` the name of a module?
    pub fn is_module(
        &mut self,
        dotted_name: &str,
        extrapath: Option<&Path>,
        warner: &mut Warner,
    ) -> Option<String> {
        let key = (dotted_name.to_string(), extrapath.map(Path::to_path_buf));
        if let Some(cached) = self.module_cache.get(&key) {
            return cached.clone();
        }

        if self.known_modules.contains(dotted_name)
            || stdlib::STDLIB_MODULES.binary_search(&dotted_name).is_ok()
        {
            return Some(dotted_name.to_string());
        }

        let relative: PathBuf = dotted_name.split('.').collect();

        if let Some(extra) = extrapath {
            for ext in &self.extensions {
                let candidate = extra.join(format!("{}{}", relative.display(), ext));
                if candidate.exists() {
                    let modname = self.filename_to_modname(&candidate, warner);
                    self.module_cache.insert(key, Some(modname.clone()));
                    return Some(modname);
                }
            }
        }

        let global_key = (dotted_name.to_string(), None);
        if extrapath.is_some() {
            if let Some(cached) = self.module_cache.get(&global_key) {
                let cached = cached.clone();
                self.module_cache.insert(key, cached.clone());
                return cached;
            }
        }

        let archive_member = dotted_name.replace('.', "/");
        for dir in self.search_path.clone() {
            if dir.is_file() {
                // distribute drops *.egg-info files onto the search path
                if dir.to_string_lossy().ends_with(".egg-info") {
                    continue;
                }
                let archive = File::open(&dir)
                    .ok()
                    .and_then(|file| zip::ZipArchive::new(file).ok());
                let Some(archive) = archive else {
                    let entry = dir.display().to_string();
                    warner.warn(&entry, format!("{entry}: not a directory or zip file"));
                    continue;
                };
                for ext in &self.extensions {
                    let member = format!("{archive_member}{ext}");
                    if archive.file_names().any(|name| name == member) {
                        let modname = dotted_name.to_string();
                        self.module_cache.insert(key, Some(modname.clone()));
                        self.module_cache.insert(global_key, Some(modname.clone()));
                        return Some(modname);
                    }
                }
            } else {
                for ext in &self.extensions {
                    let candidate = dir.join(format!("{}{}", relative.display(), ext));
                    if candidate.exists() {
                        let modname = self.filename_to_modname(&candidate, warner);
                        self.module_cache.insert(key, Some(modname.clone()));
                        self.module_cache.insert(global_key, Some(modname.clone()));
                        return Some(modname);
                    }
                }
            }
        }

        self.module_cache.insert(global_key, None);
        self.module_cache.insert(key, None);
        None
    }

    /// Is `dotted_name` the name of a package?
    pub fn is_package(
        &mut self,
        dotted_name: &str,
        extrapath: Option<&Path>,
        warner: &mut Warner,
    ) -> Option<String> {
        let init = format!("{dotted_name}.__init__");
        let candidate = self.is_module(&init, extrapath, warner)?;
        let stripped = candidate.strip_suffix(".__init__").unwrap_or_default();
        if stripped.is_empty() {
            None
        } else {
            Some(stripped.to_string())
        }
    }

    /// The package containing `dotted_name`, optionally truncated to its
    /// topmost `package_level` segments.
    pub fn package_of(
        &mut self,
        dotted_name: &str,
        package_level: Option<usize>,
        warner: &mut Warner,
    ) -> String {
        if !dotted_name.contains('.') {
            return dotted_name.to_string();
        }
        let mut name = dotted_name.to_string();
        if self.is_package(&name, None, warner).is_none() {
            if let Some(dot) = name.rfind('.') {
                name.truncate(dot);
            }
        }
        if let Some(level) = package_level {
            if level > 0 {
                let truncated: Vec<&str> = name.split('.').take(level).collect();
                name = truncated.join(".");
            }
        }
        name
    }
}

/// Absolute, component-normalized form of a path, without touching the
/// filesystem (the path may not exist yet).
fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
