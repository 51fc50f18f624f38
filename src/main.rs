use std::process;

use clap::Parser;
use stackcc::{CompileError, CompileResult, generate_assembly};
use tracing_subscriber::EnvFilter;

/// Compile a tiny C-like program into x86-64 assembly on stdout.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
  /// Program text, e.g. "a=3; b=5; return a+b;"
  #[arg(allow_hyphen_values = true)]
  source: String,
}

fn parse_args() -> CompileResult<Cli> {
  Cli::try_parse().map_err(|err| {
    if !err.use_stderr() {
      // --help and --version
      err.exit();
    }
    let program = std::env::args()
      .next()
      .unwrap_or_else(|| "stackcc".to_string());
    CompileError::usage(program)
  })
}

fn run() -> CompileResult<()> {
  let cli = parse_args()?;
  let asm = generate_assembly(&cli.source)?;
  print!("{asm}");
  Ok(())
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .with_writer(std::io::stderr)
    .init();

  if let Err(err) = run() {
    eprintln!("{err}");
    process::exit(1);
  }
}
