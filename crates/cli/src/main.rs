mod check;
mod decls;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokopt::{Arg, SliceSource};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "tokopt")]
#[command(
    version,
    about = "Tokenize command-line arguments against declared parameters",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example declarations file
    Init(InitArgs),

    /// Tokenize arguments given after `--`
    Parse(ParseArgs),

    /// Validate a declarations file
    Check(CheckArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Overwrite an existing declarations file
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the declarations file
    #[arg(short, long, default_value = "tokopt.json", value_name = "FILE")]
    decls: PathBuf,

    /// Print matches as a JSON array
    #[arg(long)]
    json: bool,

    /// Allow duplicate names (the first declaration wins)
    #[arg(long)]
    no_check: bool,

    /// Raw arguments to tokenize
    #[arg(value_name = "ARGS", last = true)]
    args: Vec<String>,
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to the declarations file
    #[arg(short, long, default_value = "tokopt.json", value_name = "FILE")]
    decls: PathBuf,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct MatchedArg {
    id: String,
    value: Option<String>,
}

impl From<Arg<'_, String>> for MatchedArg {
    fn from(arg: Arg<'_, String>) -> Self {
        Self {
            id: arg.id,
            value: arg.value.map(|v| v.into_owned()),
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Parse(args) => parse_command(args),
        Commands::Check(args) => check_command(args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;

    let path = decls::decls_path(&dir);
    decls::write_decls(&path, &decls::example_decls(), args.force)?;

    eprintln!("Created: {}", path.display());
    eprintln!("\nTry:");
    eprintln!("  tokopt parse -d {} -- -abc100 --output out.txt notes.txt", path.display());

    Ok(())
}

fn parse_command(args: ParseArgs) -> Result<()> {
    tracing::debug!("executing parse command");

    let params = decls::load_decls(&args.decls)?.to_params()?;
    let parser = if args.no_check {
        tokopt::Parser::new(&params, SliceSource::new(args.args.as_slice()))
    } else {
        tokopt::Parser::checked(&params, SliceSource::new(args.args.as_slice()))
            .with_context(|| format!("invalid declarations: {}", args.decls.display()))?
    };

    let matched = parser
        .map(|res| res.map(MatchedArg::from))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(count = matched.len(), "tokenized arguments");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matched)?);
        return Ok(());
    }

    for arg in &matched {
        match &arg.value {
            Some(value) => println!("{}={}", arg.id, value),
            None => println!("{}", arg.id),
        }
    }

    Ok(())
}

fn check_command(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let params = decls::load_decls(&args.decls)?.to_params()?;
    let report = check::check_decls(&args.decls, &params)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    eprintln!("=== Declaration Check Results ===");
    eprintln!("Declarations: {}", report.decls);
    eprintln!("Total params: {}", report.params);
    if !report.shorts.is_empty() {
        eprintln!("Short: {}", report.shorts.join(" "));
    }
    if !report.longs.is_empty() {
        eprintln!("Long: {}", report.longs.join(" "));
    }
    if !report.value_params.is_empty() {
        eprintln!("Take a value: {}", report.value_params.join(", "));
    }
    match report.positionals.as_slice() {
        [] => eprintln!("Note: no positional parameter, bare values will be rejected"),
        [first] => eprintln!("Positional: {first}"),
        [first, rest @ ..] => eprintln!(
            "Note: only the first positional ({first}) matches; {} unreachable",
            rest.join(", ")
        ),
    }
    eprintln!("OK");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
