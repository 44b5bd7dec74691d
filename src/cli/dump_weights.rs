use std::path::PathBuf;

use clap::Args;

use paddle_lut::emit;
use paddle_lut::error::LutError;
use paddle_lut::fixed::Rescale;

use super::{fail, include_guard, load_config, load_weights, write_text};

#[derive(Args)]
pub struct DumpWeightsArgs {
    /// Weights JSON file, or builtin:<name>
    #[arg(short, long, default_value = "builtin:trained")]
    pub weights: String,
    /// Configuration to take the rescale from (needed for non-power-of-two scales)
    #[arg(short, long, value_name = "PRESET|FILE")]
    pub config: Option<String>,
    /// Emit the integer JSON layout instead of a C header
    #[arg(long)]
    pub json: bool,
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn cmd_dump_weights(args: DumpWeightsArgs) {
    let weights = load_weights(&args.weights);
    eprintln!(
        "weights S={} max |w|={} blake3 {}",
        weights.scale,
        weights.max_abs(),
        weights.hash()
    );

    if args.json {
        write_text(args.output.as_deref(), &(weights.to_json() + "\n"));
        return;
    }

    let rescale = match &args.config {
        Some(spec) => {
            let config = load_config(spec);
            if config.scale != weights.scale {
                fail(LutError::ScaleMismatch {
                    weights: weights.scale,
                    config: config.scale,
                });
            }
            config.rescale()
        }
        None => Rescale::for_scale(weights.scale, None),
    }
    .unwrap_or_else(|e| fail(e));

    let guard = args
        .output
        .as_deref()
        .map_or_else(|| "WEIGHTS_H".to_string(), |p| include_guard(p, "WEIGHTS_H"));
    write_text(
        args.output.as_deref(),
        &emit::weights_header(&weights, rescale, &guard),
    );
}
