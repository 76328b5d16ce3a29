use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fence_protocol::{DecisionLevel, ScopeMode};
use std::path::PathBuf;
use std::process::ExitCode;

mod command;
mod config;

const EXIT_ALLOW: u8 = 0;
const EXIT_BLOCK: u8 = 1;
const EXIT_WARN: u8 = 2;
const EXIT_FAILURE: u8 = 3;

#[derive(Parser)]
#[command(name = "fence")]
#[command(about = "Architectural boundary checks for TypeScript workspaces", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a change between two revisions and print the report
    Check(CheckArgs),

    /// Print the module graph summary and import cycles of one revision
    Graph(GraphArgs),

    /// Print the content fingerprint of the working tree
    Fingerprint(RootArgs),

    /// Print the JSON schema of the report
    Schema,
}

#[derive(Args)]
struct RootArgs {
    /// Repository root (defaults to current directory)
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[derive(Args)]
struct CheckArgs {
    /// Base revision; required for diff scope
    #[arg(long)]
    base: Option<String>,

    /// Head revision
    #[arg(long, default_value = "HEAD")]
    head: String,

    #[command(flatten)]
    root: RootArgs,

    /// Diff checks changed files only; full checks every file at head
    #[arg(long, value_enum, default_value_t = ScopeArg::Diff)]
    scope: ScopeArg,

    /// Config file (defaults to fence.toml under the root)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the report here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct GraphArgs {
    #[command(flatten)]
    root: RootArgs,

    /// Revision to read; the working tree when omitted
    #[arg(long)]
    rev: Option<String>,

    /// Config file (defaults to fence.toml under the root)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    Diff,
    Full,
}

impl ScopeArg {
    fn as_domain(self) -> ScopeMode {
        match self {
            Self::Diff => ScopeMode::Diff,
            Self::Full => ScopeMode::Full,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match run(cli.command) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(command: Commands) -> Result<u8> {
    match command {
        Commands::Check(args) => run_check(args),
        Commands::Graph(args) => {
            let summary = command::graph::run(
                &args.root.root,
                args.rev.as_deref(),
                args.config.as_deref(),
            )?;
            command::emit(&serde_json::to_string_pretty(&summary)?, None)?;
            Ok(EXIT_ALLOW)
        }
        Commands::Fingerprint(args) => {
            command::emit(&command::fingerprint(&args.root)?, None)?;
            Ok(EXIT_ALLOW)
        }
        Commands::Schema => {
            command::emit(&command::schema()?, None)?;
            Ok(EXIT_ALLOW)
        }
    }
}

fn run_check(args: CheckArgs) -> Result<u8> {
    let scope = args.scope.as_domain();
    let base = match (args.base, scope) {
        (Some(base), _) => base,
        (None, ScopeMode::Full) => args.head.clone(),
        (None, ScopeMode::Diff) => bail!("--base is required for diff scope"),
    };

    let level = command::check::run(&command::check::CheckOptions {
        root: args.root.root,
        base,
        head: args.head,
        scope,
        config: args.config,
        out: args.out,
    })?;

    Ok(match level {
        DecisionLevel::Allow => EXIT_ALLOW,
        DecisionLevel::Block => EXIT_BLOCK,
        DecisionLevel::Warn => EXIT_WARN,
    })
}
