use clap::Args;

use paddle_lut::config::{preset, PRESET_NAMES};

use super::fail;

#[derive(Args)]
pub struct PresetsArgs {
    /// Print one preset as TOML (a starting point for a custom configuration)
    pub name: Option<String>,
}

pub fn cmd_presets(args: PresetsArgs) {
    match args.name {
        Some(name) => match preset(&name) {
            Some(config) => print!("{}", config.to_toml().unwrap_or_else(|e| fail(e))),
            None => {
                eprintln!(
                    "error: unknown preset '{}' (available: {})",
                    name,
                    PRESET_NAMES.join(", ")
                );
                std::process::exit(1);
            }
        },
        None => {
            for name in PRESET_NAMES {
                if let Some(config) = preset(name) {
                    println!("{}", config.format_summary());
                }
            }
        }
    }
}
