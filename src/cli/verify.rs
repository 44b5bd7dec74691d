use std::path::PathBuf;
use std::process;

use clap::Args;

use paddle_lut::lut::verify::{verify_file, Sampling};

use super::{build_policy, fail, load_config, PolicyKind};

#[derive(Args)]
pub struct VerifyArgs {
    /// Table blob to check
    pub input: PathBuf,
    /// Preset name or configuration .toml the table was generated with
    #[arg(short, long, value_name = "PRESET|FILE")]
    pub config: String,
    /// Weights JSON file, or builtin:<name>
    #[arg(short, long, default_value = "builtin:trained")]
    pub weights: String,
    #[arg(long, value_enum, default_value = "network")]
    pub policy: PolicyKind,
    /// Number of random states to check
    #[arg(long, default_value = "10000")]
    pub samples: usize,
    /// Seed for the sampler
    #[arg(long, default_value = "0")]
    pub seed: u64,
    /// Check every entry instead of sampling
    #[arg(long)]
    pub exhaustive: bool,
}

pub fn cmd_verify(args: VerifyArgs) {
    let config = load_config(&args.config);
    let policy = build_policy(&config, args.policy, &args.weights);
    let sampling = if args.exhaustive {
        Sampling::Exhaustive
    } else {
        Sampling::Random {
            samples: args.samples,
            seed: args.seed,
        }
    };

    let report = verify_file(&config, &args.input, &*policy, sampling)
        .unwrap_or_else(|e| fail(e));
    eprint!("{}", report.format_report());
    if !report.is_ok() {
        process::exit(1);
    }
    eprintln!("OK: {}", args.input.display());
}
