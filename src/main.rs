use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::dump_weights::DumpWeightsArgs;
use cli::eval::EvalArgs;
use cli::generate::GenerateArgs;
use cli::presets::PresetsArgs;
use cli::verify::VerifyArgs;

#[derive(Parser)]
#[command(
    name = "paddle-lut",
    version,
    about = "Fixed-point paddle AI: bit-exact inference and lookup table precompute"
)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tabulate a policy over the quantized domain and write blob + manifest
    Generate(GenerateArgs),
    /// Check a blob against its manifest and the policy that produced it
    Verify(VerifyArgs),
    /// Run one state through the normalizer and network, printing every stage
    Eval(EvalArgs),
    /// Write weights as a C header or integer JSON
    DumpWeights(DumpWeightsArgs),
    /// List built-in configurations, or print one as TOML
    Presets(PresetsArgs),
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("paddle_lut={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Generate(args) => cli::generate::cmd_generate(args),
        Command::Verify(args) => cli::verify::cmd_verify(args),
        Command::Eval(args) => cli::eval::cmd_eval(args),
        Command::DumpWeights(args) => cli::dump_weights::cmd_dump_weights(args),
        Command::Presets(args) => cli::presets::cmd_presets(args),
    }
}
