use clap::Args;

use paddle_lut::lut::domain::{QuantizedState, RawState};
use paddle_lut::policy::{Policy, Predictive};

use super::{build_engine, fail, load_config};

#[derive(Args)]
pub struct EvalArgs {
    /// Preset name or configuration .toml
    #[arg(short, long, value_name = "PRESET|FILE")]
    pub config: String,
    /// Weights JSON file, or builtin:<name>
    #[arg(short, long, default_value = "builtin:trained")]
    pub weights: String,
    /// ball_x ball_y ball_vx ball_vy ai_y
    #[arg(num_args = 5, allow_negative_numbers = true, required = true)]
    pub state: Vec<i32>,
    /// Read the values as axis indices instead of raw pixels/velocities
    #[arg(long)]
    pub quantized: bool,
}

pub fn cmd_eval(args: EvalArgs) {
    let config = load_config(&args.config);
    let engine = build_engine(&config, &args.weights);
    let v = &args.state;

    let raw = if args.quantized {
        let mut indices = [0u32; 5];
        for (slot, &x) in indices.iter_mut().zip(v) {
            match u32::try_from(x) {
                Ok(i) => *slot = i,
                Err(_) => {
                    eprintln!("error: axis index {} is negative", x);
                    std::process::exit(1);
                }
            }
        }
        let q = QuantizedState::from_array(indices);
        match config.axes.flat_index(&q) {
            Some(index) => eprintln!("state {} -> index {}", q, index),
            None => {
                eprintln!("error: state {} outside axis steps {:?}", q, config.axes.steps());
                std::process::exit(1);
            }
        }
        config.axes.raw_state(&q)
    } else {
        RawState::new(v[0], v[1], v[2], v[3], v[4])
    };

    let trace = engine.trace(&raw).unwrap_or_else(|e| fail(e));
    eprintln!("raw      {}", raw);
    eprint!("{}", trace.format_report());
    let action = config
        .actions
        .action(trace.decision)
        .map_or("?", |a| a.name());
    println!("{} {}", trace.decision, action);

    let tracker = Predictive::new(config.actions);
    if let Ok(code) = tracker.decide(&raw) {
        eprintln!("predictive {} ({})", code, tracker.action(&raw));
    }
}
