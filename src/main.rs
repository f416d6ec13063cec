use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use clap::Parser;
use makeprof::{Ast, DependencyGraph, Makefile};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Dependency and influence analysis for Makefiles")]
struct Cli {
    /// Makefile to analyze
    makefile: PathBuf,

    /// Print every target affected by a change to TARGET
    #[arg(long, value_name = "TARGET", conflicts_with = "docs")]
    influences: Option<String>,

    /// Print documented targets in file order
    #[arg(long)]
    docs: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

struct IDGen(&'static str, usize);
impl IDGen {
    fn new(prefix: &'static str) -> Self {
        Self(prefix, 0)
    }

    fn next(&mut self) -> String {
        let id = format!("{}{}", self.0, self.1);
        self.1 += 1;
        id
    }
}

/// What to print once the Makefile is analyzed.
enum Report {
    Dot,
    Influences(String),
    Docs,
}

impl Report {
    fn from_cli(cli: &Cli) -> Self {
        match (&cli.influences, cli.docs) {
            (_, true) => Report::Docs,
            (Some(target), false) => Report::Influences(target.clone()),
            (None, false) => Report::Dot,
        }
    }

    fn write(
        &self,
        ast: &Ast,
        graph: &DependencyGraph,
        out: &mut impl Write,
    ) -> anyhow::Result<()> {
        match self {
            Report::Dot => write_dot(graph, out)?,
            Report::Influences(target) => {
                if graph.influences_of(target).is_none() {
                    anyhow::bail!("`{}` is not a target or prerequisite", target);
                }
                for name in graph.affected_by(target) {
                    writeln!(out, "{}", name)?;
                }
            }
            Report::Docs => {
                for (name, doc) in ast.documented_targets() {
                    writeln!(out, "{}\t{}", name, doc)?;
                }
            }
        }
        Ok(())
    }
}

fn write_dot(graph: &DependencyGraph, out: &mut impl Write) -> io::Result<()> {
    let mut id = IDGen::new("task");
    let ids: Vec<(&String, String)> = graph
        .influences()
        .keys()
        .map(|name| (name, id.next()))
        .collect();
    let id_of = |name: &str| {
        ids.iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, id)| id.as_str())
    };

    writeln!(out, "digraph G {{\n\tranksep=3")?;
    for (name, id) in &ids {
        writeln!(out, "\t{}[label={:?}]", id, name)?;
    }
    for (name, deps) in graph.dependencies() {
        let Some(from) = id_of(name) else { continue };
        for dep in &deps.required {
            if let Some(to) = id_of(dep) {
                writeln!(out, "\t{} -> {}", from, to)?;
            }
        }
        for dep in &deps.order_only {
            if let Some(to) = id_of(dep) {
                writeln!(out, "\t{} -> {} [style=dashed]", from, to)?;
            }
        }
    }
    writeln!(out, "}}")
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let makefile = Makefile::open(&cli.makefile)
        .with_context(|| format!("reading {}", cli.makefile.display()))?;
    tracing::info!(
        path = %cli.makefile.display(),
        lines = makefile.lines.len(),
        includes = makefile.includes.len(),
        "loaded makefile"
    );

    let (ast, graph) = makefile
        .analyze()
        .with_context(|| format!("parsing {}", cli.makefile.display()))?;
    for warning in graph.warnings() {
        tracing::warn!("{}", warning);
    }

    let stdout = io::stdout();
    Report::from_cli(cli).write(&ast, &graph, &mut stdout.lock())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(&cli)
}
