//! Command-line interface.
//!
//! ```bash
//! stategraph highstate.dot
//! stategraph --strict --config stategraph.yaml lowstate.yaml
//! stategraph --dump -vv highstate.dot
//! ```
//!
//! Diagnostics go to stdout, one per line. Input warnings and logs go to
//! stderr.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use stategraph_input::{InputFormat, read_graph};
use tracing::{info, warn};

use crate::config::Config;
use crate::dump;
use crate::error::Error;
use crate::lineage::Lineage;
use crate::registry::NodeRegistry;
use crate::report::Report;

/// Check a Salt state dependency graph for cycles and for subgraphs
/// without a common entry or exit point.
#[derive(Parser, Debug)]
#[command(name = "stategraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Graph file: a DOT rendering or a lowstate YAML dump
    pub input: PathBuf,

    /// Input format (auto detects lowstate from a .yaml/.yml extension)
    #[arg(short, long, value_enum, default_value_t = FormatArg::Auto)]
    pub format: FormatArg,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Exit with status 1 when any error diagnostic is reported
    #[arg(long)]
    pub strict: bool,

    /// Print every node with its neighbors and closures as YAML after the
    /// diagnostics
    #[arg(long)]
    pub dump: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Input format as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Pick by file extension
    Auto,
    /// Graphviz DOT
    Dot,
    /// `state.show_lowstate` YAML
    Lowstate,
}

impl FormatArg {
    /// The concrete format for `path`.
    #[must_use]
    pub fn resolve(self, path: &Path) -> InputFormat {
        match self {
            Self::Auto => InputFormat::detect(path),
            Self::Dot => InputFormat::Dot,
            Self::Lowstate => InputFormat::Lowstate,
        }
    }
}

/// Result of a completed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing that fails the run was reported.
    Passed,
    /// Strict mode is on and an error diagnostic was reported.
    Failed,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Passed => Self::SUCCESS,
            Status::Failed => Self::FAILURE,
        }
    }
}

impl Cli {
    /// Default log filter for the `-v` count.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Run the check, writing to the process's stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or input cannot be loaded, or
    /// if the input does not describe a consistent graph.
    pub fn run(&self) -> Result<ExitCode> {
        let stdout = io::stdout();
        let stderr = io::stderr();
        let status = self.run_with(&mut stdout.lock(), &mut stderr.lock())?;
        Ok(status.into())
    }

    /// Run the check against the given output streams.
    ///
    /// # Errors
    ///
    /// See [`Cli::run`].
    pub fn run_with(&self, out: &mut impl Write, err: &mut impl Write) -> Result<Status> {
        let config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::default(),
        };

        let format = self.format.resolve(&self.input);
        info!(input = %self.input.display(), ?format, "reading graph");
        let source = read_graph(&self.input, format, &config.lowstate)
            .map_err(Error::Input)
            .with_context(|| format!("failed to read {}", self.input.display()))?;
        for warning in &source.warnings {
            writeln!(err, "{}: {warning}", "warning".yellow().bold())?;
        }

        let registry = NodeRegistry::from_source(&source)?;
        if registry.is_empty() {
            warn!(input = %self.input.display(), "graph declares no states");
        }
        let lineage = Lineage::compute(&registry);
        let report = Report::build(&registry, &lineage);
        report.write_to(out)?;

        if self.dump {
            out.write_all(dump::to_yaml(&registry, &lineage)?.as_bytes())?;
        }
        out.flush()?;

        info!(
            nodes = registry.len(),
            diagnostics = report.diagnostics().len(),
            errors = report.error_count(),
            "check complete"
        );
        if (self.strict || config.strict) && report.has_errors() {
            Ok(Status::Failed)
        } else {
            Ok(Status::Passed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("stategraph").chain(args.iter().copied())).unwrap()
    }

    fn run(cli: &Cli) -> (Result<Status>, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = cli.run_with(&mut out, &mut err);
        (result, String::from_utf8(out).unwrap())
    }

    #[rstest]
    #[case(FormatArg::Auto, "graph.yaml", InputFormat::Lowstate)]
    #[case(FormatArg::Auto, "graph.dot", InputFormat::Dot)]
    #[case(FormatArg::Dot, "graph.yaml", InputFormat::Dot)]
    #[case(FormatArg::Lowstate, "graph.txt", InputFormat::Lowstate)]
    fn format_resolution(
        #[case] arg: FormatArg,
        #[case] path: &str,
        #[case] expected: InputFormat,
    ) {
        assert_eq!(arg.resolve(Path::new(path)), expected);
    }

    #[rstest]
    #[case(&["g.dot"], "warn")]
    #[case(&["-v", "g.dot"], "info")]
    #[case(&["-vv", "g.dot"], "debug")]
    #[case(&["-vvvv", "g.dot"], "trace")]
    fn verbosity_selects_filter(#[case] args: &[&str], #[case] expected: &str) {
        assert_eq!(parse(args).log_filter(), expected);
    }

    #[test]
    fn missing_input_is_a_usage_error() {
        assert!(Cli::try_parse_from(["stategraph"]).is_err());
    }

    #[test]
    fn unknown_format_is_a_usage_error() {
        assert!(Cli::try_parse_from(["stategraph", "--format", "json", "g.dot"]).is_err());
    }

    #[test]
    fn config_strict_fails_on_errors() {
        let dir = TempDir::new().unwrap();
        let graph = dir.path().join("g.dot");
        let config = dir.path().join("c.yaml");
        fs::write(&graph, "digraph g { subgraph cluster_X { a; b; } a -> b; }").unwrap();
        fs::write(&config, "strict: true\n").unwrap();

        let lenient = parse(&[graph.to_str().unwrap()]);
        let strict = parse(&["--config", config.to_str().unwrap(), graph.to_str().unwrap()]);

        let (result, output) = run(&lenient);
        assert_eq!(result.unwrap(), Status::Passed);
        assert_eq!(output, "ERR: X: SOURCE: a\nERR: X: SINK: b\n");
        assert_eq!(run(&strict).0.unwrap(), Status::Failed);
    }

    #[test]
    fn strict_passes_clean_graph() {
        let dir = TempDir::new().unwrap();
        let graph = dir.path().join("g.dot");
        fs::write(
            &graph,
            "digraph g { start; end; subgraph cluster_X { a; b; } start -> a; start -> b; a -> end; b -> end; }",
        )
        .unwrap();

        let (result, output) = run(&parse(&["--strict", graph.to_str().unwrap()]));

        assert_eq!(result.unwrap(), Status::Passed);
        assert!(output.contains("tag: X: require: start\n"));
    }

    #[test]
    fn unknown_node_is_fatal() {
        let dir = TempDir::new().unwrap();
        let graph = dir.path().join("g.dot");
        fs::write(&graph, "digraph g { a; a -> b; }").unwrap();

        let (result, output) = run(&parse(&[graph.to_str().unwrap()]));

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Unknown node: b");
        assert!(output.is_empty());
    }

    #[test]
    fn unreadable_input_is_an_input_error() {
        let dir = TempDir::new().unwrap();
        let graph = dir.path().join("absent.dot");

        let (result, _) = run(&parse(&[graph.to_str().unwrap()]));

        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("failed to read "));
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Input(stategraph_input::Error::Io(_)))
        ));
    }

    #[test]
    fn dump_follows_diagnostics() {
        let dir = TempDir::new().unwrap();
        let graph = dir.path().join("g.dot");
        fs::write(&graph, "digraph g { subgraph cluster_X { a; } }").unwrap();

        let (result, output) = run(&parse(&["--dump", graph.to_str().unwrap()]));

        result.unwrap();
        assert!(output.starts_with("ERR: X: SOURCE: a\nERR: X: SINK: a\n"));
        assert!(output.contains("subgraph: X"));
    }
}
