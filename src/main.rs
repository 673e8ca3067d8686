use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use modgraph::core::analyzer::{Analyzer, AnalyzerOptions};
use modgraph::core::cache;
use modgraph::core::graph::TEST_PACKAGE_NAMES;
use modgraph::formatters::{
    DotFormatter, ImportedNamesReport, ImportsReport, JsonFormatter, UnusedImportsReport,
};

#[derive(Debug, Parser)]
#[command(
    name = "modgraph",
    version,
    about = "Static import analysis and module dependency graphs for Python codebases"
)]
struct Cli {
    /// Files or directories to inspect; a *.depcache file loads a saved graph
    #[arg(value_name = "PATH", default_value = ".")]
    paths: Vec<PathBuf>,

    /// Report to produce
    #[arg(short = 'r', long, value_enum, default_value_t = Report::Imports)]
    report: Report,

    /// Report unused imports even when a comment shares their line
    #[arg(short = 'a', long = "all")]
    all_unused: bool,

    /// Warn about duplicate imports
    #[arg(long)]
    duplicates: bool,

    /// Ignore imports of standard-library modules
    #[arg(long)]
    ignore_stdlib: bool,

    /// Print more information (currently only affects --duplicates)
    #[arg(short, long)]
    verbose: bool,

    /// Omit external dependencies
    #[arg(short = 'N', long = "no-externals")]
    no_externals: bool,

    /// Convert the module graph to a package graph
    #[arg(short, long)]
    packages: bool,

    /// Convert only external modules to packages
    #[arg(long, conflicts_with = "packages")]
    package_externals: bool,

    /// Collapse subpackages to the topmost N levels (with --packages)
    #[arg(short = 'l', long, value_name = "N")]
    level: Option<usize>,

    /// Collapse dependency cycles
    #[arg(short, long)]
    collapse: bool,

    /// Collapse packages named 'tests' and 'ftests' with parent packages
    #[arg(short = 'T', long)]
    tests: bool,

    /// Write a cache of the parsed graph; pass the file back as input later
    #[arg(short = 'w', long, value_name = "FILE")]
    write_cache: Option<PathBuf>,

    /// Skip a file or directory name while scanning; repeatable
    #[arg(short = 'I', long = "ignore", value_name = "NAME", default_value = "venv")]
    ignores: Vec<String>,

    /// Remove a leading prefix from displayed node names; applied last
    #[arg(short = 'R', long = "rmprefix", value_name = "PREFIX")]
    rmprefix: Vec<String>,

    /// Maximum syntax-tree depth to descend into
    #[arg(short = 'D', long = "depth", value_name = "N")]
    max_depth: Option<usize>,

    /// Extra dot graph attributes, e.g. "rankdir=TB"
    #[arg(short = 'A', long = "attr", value_name = "ATTR")]
    attributes: Vec<String>,

    /// Additional module search path entry; PYTHONPATH is appended
    #[arg(long = "path", value_name = "DIR")]
    search_path: Vec<PathBuf>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum Report {
    Imports,
    Dot,
    Names,
    Unused,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let mut search_path = cli.search_path.clone();
    if let Ok(pythonpath) = std::env::var("PYTHONPATH") {
        search_path.extend(std::env::split_paths(&pythonpath));
    }

    let options = AnalyzerOptions {
        track_unused: cli.report == Report::Unused,
        warn_duplicates: cli.duplicates,
        verbose: cli.verbose,
        max_depth: cli.max_depth,
        ignore_stdlib: cli.ignore_stdlib,
        ignores: cli.ignores.clone(),
        search_path,
    };

    let mut analyzer = Analyzer::new(options);
    let mut graph = analyzer.analyze(&cli.paths)?;

    if let Some(path) = &cli.write_cache {
        cache::write_cache(&graph, path)?;
    }

    if cli.packages || cli.package_externals {
        let (resolver, warner) = analyzer.parts_mut();
        graph = graph.package_graph(resolver, warner, cli.level, cli.package_externals);
    }
    if cli.tests {
        graph = graph.collapse_tests(TEST_PACKAGE_NAMES);
    }
    if cli.collapse {
        graph = graph.collapse_cycles();
    }
    if !cli.rmprefix.is_empty() {
        graph = graph.remove_prefixes(&cli.rmprefix);
    }

    let external_dependencies = !cli.no_externals;
    match cli.report {
        Report::Imports => print!(
            "{}",
            ImportsReport {
                external_dependencies
            }
            .format(&graph)
        ),
        Report::Names => print!("{}", ImportedNamesReport.format(&graph)),
        Report::Unused => print!(
            "{}",
            UnusedImportsReport {
                all_unused: cli.all_unused
            }
            .format(&graph)
        ),
        Report::Dot => println!(
            "{}",
            DotFormatter {
                attributes: cli.attributes.clone(),
                external_dependencies
            }
            .format(&graph)
        ),
        Report::Json => println!("{}", JsonFormatter.format(&graph)?),
    }

    Ok(())
}
