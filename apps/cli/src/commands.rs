//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use docpack_core::pipeline::{BuildResult, ProgressReporter, run_build};
use docpack_shared::{
    AppConfig, BuildConfig, DocpackError, init_config, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docpack: documentation indexes and skill bundles.
#[derive(Parser)]
#[command(
    name = "docpack",
    version,
    about = "Index a documentation tree and package it into self-contained skill bundles.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ./docpack.toml or ~/.docpack/docpack.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Build indexes, compact files, examples, and skill bundles.
    Build(BuildArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `docpack build`.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct BuildArgs {
    /// Write the top-level artifacts only; do not touch skill bundles.
    #[arg(long)]
    pub skip_bundles: bool,

    /// Assemble only the named skill bundle.
    #[arg(long, value_name = "NAME", conflicts_with = "skip_bundles")]
    pub skill: Option<String>,

    /// Documentation source tree.
    #[arg(long, env = "DOCPACK_DOCS_ROOT")]
    pub docs_root: Option<PathBuf>,

    /// Directory holding one subdirectory per skill.
    #[arg(long, env = "DOCPACK_SKILLS_ROOT")]
    pub skills_root: Option<PathBuf>,

    /// Where top-level artifacts are written.
    #[arg(long, env = "DOCPACK_OUTPUT_ROOT")]
    pub output_root: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docpack=info",
        1 => "docpack=debug",
        _ => "docpack=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let loaded = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    let app = match loaded {
        Ok(app) => app,
        Err(e) => return fail(e, "failed to load configuration"),
    };

    match cli.command {
        Command::Build(args) => cmd_build(&app, &args),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&app),
        },
    }
}

/// Merge config file values with CLI/env overrides.
fn resolve_build_config(
    app: &AppConfig,
    args: &BuildArgs,
) -> docpack_shared::Result<BuildConfig> {
    let mut config = BuildConfig::from_app(app)?;

    if let Some(docs_root) = &args.docs_root {
        config = config.with_docs_root(docs_root.clone(), &app.paths.snippets_dir);
    }
    if let Some(skills_root) = &args.skills_root {
        config.skills_root = skills_root.clone();
    }
    if let Some(output_root) = &args.output_root {
        config.output_root = output_root.clone();
    }

    config.skip_bundles = args.skip_bundles;
    config.only_skill = args.skill.clone();
    config.tool_version = env!("CARGO_PKG_VERSION").to_string();
    Ok(config)
}

fn cmd_build(app: &AppConfig, args: &BuildArgs) -> Result<()> {
    let config = match resolve_build_config(app, args) {
        Ok(config) => config,
        Err(e) => return fail(e, "invalid build configuration"),
    };

    info!(
        docs = %config.docs_root.display(),
        skills = %config.skills_root.display(),
        output = %config.output_root.display(),
        skip_bundles = config.skip_bundles,
        skill = config.only_skill.as_deref().unwrap_or("all"),
        "building documentation pack"
    );

    let reporter = CliProgress::new();
    let result = match run_build(&config, &reporter) {
        Ok(result) => result,
        Err(e) => {
            reporter.abandon();
            return fail(e, "build aborted");
        }
    };

    print_summary(&result);
    Ok(())
}

/// Fatal configuration errors exit with a one-line diagnostic on stderr;
/// anything else gets the full error report.
fn fail(e: DocpackError, context: &'static str) -> Result<()> {
    if let Some(line) = fatal_diagnostic(&e) {
        eprintln!("{line}");
        std::process::exit(1);
    }
    Err(e).wrap_err(context)
}

fn fatal_diagnostic(e: &DocpackError) -> Option<String> {
    if !e.is_fatal_configuration() {
        return None;
    }
    let message = e
        .to_string()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    Some(format!("error: {message}"))
}

fn print_summary(result: &BuildResult) {
    println!();
    println!("  Documentation pack built!");
    println!("  Documents: {}", result.document_count);
    println!("  Tokens:    {}", result.token_count);
    println!("  Compact:   {}", result.compact_count);
    println!("  Snippets:  {}", result.snippet_count);
    println!("  Skills:    {}", result.skill_count);
    println!("  Bundles:   {}", result.bundles.len());
    println!(
        "  Changes:   {} added, {} changed, {} unchanged, {} removed",
        result.changes.added.len(),
        result.changes.changed.len(),
        result.changes.unchanged,
        result.changes.removed.len()
    );
    println!("  Output:    {}", result.output_root.display());
    for bundle in &result.bundles {
        println!("  Bundle:    {}", bundle.bundle_dir.display());
    }
    println!("  Time:      {:.1}s", result.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn abandon(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_read(&self, path: &str, current: usize) {
        self.spinner.set_message(format!("Reading [{current}] {path}"));
    }

    fn bundle_assembled(&self, skill: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Assembled [{current}/{total}] {skill}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(app: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(app)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("docpack").chain(args.iter().copied()))
    }

    #[test]
    fn skill_conflicts_with_skip_bundles() {
        assert!(parse(&["build", "--skip-bundles", "--skill", "x"]).is_err());
        assert!(parse(&["build", "--skill", "x"]).is_ok());
    }

    #[test]
    fn cli_overrides_config_file() {
        let mut app = AppConfig::default();
        app.paths.docs_root = "site/docs".into();
        app.paths.output_root = "dist".into();

        let args = BuildArgs {
            docs_root: Some(PathBuf::from("other")),
            skill: Some("helper".into()),
            ..BuildArgs::default()
        };
        let config = resolve_build_config(&app, &args).unwrap();

        assert_eq!(config.docs_root, PathBuf::from("other"));
        assert_eq!(config.snippets_dir, PathBuf::from("other").join("snippets"));
        assert_eq!(config.output_root, PathBuf::from("dist"));
        assert_eq!(config.only_skill.as_deref(), Some("helper"));
        assert!(!config.tool_version.is_empty());
    }

    #[test]
    fn fatal_errors_render_on_one_line() {
        let missing = DocpackError::missing_root("docs", "/nope/docs");
        assert_eq!(
            fatal_diagnostic(&missing).as_deref(),
            Some("error: docs root not found: /nope/docs")
        );

        let parse = DocpackError::config("failed to parse docpack.toml: TOML parse error\n  |\n1 | [paths\n  |       ^\n");
        let line = fatal_diagnostic(&parse).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.starts_with("error: config error: failed to parse docpack.toml"));

        assert!(fatal_diagnostic(&DocpackError::invariant("duplicate id")).is_none());
    }

    #[test]
    fn config_defaults_without_overrides() {
        let config = resolve_build_config(&AppConfig::default(), &BuildArgs::default()).unwrap();
        assert_eq!(config.docs_root, PathBuf::from("docs"));
        assert_eq!(config.skills_root, PathBuf::from("skills"));
        assert_eq!(config.output_root, PathBuf::from("build/docpack"));
        assert!(!config.skip_bundles);
    }
}
