use std::path::PathBuf;

use clap::Args;

use paddle_lut::emit;
use paddle_lut::lut;

use super::{build_policy, fail, include_guard, load_config, write_text, PolicyKind};

#[derive(Args)]
pub struct GenerateArgs {
    /// Preset name or configuration .toml
    #[arg(short, long, value_name = "PRESET|FILE")]
    pub config: String,
    /// Weights JSON file, or builtin:<name>
    #[arg(short, long, default_value = "builtin:trained")]
    pub weights: String,
    /// Decision function to tabulate
    #[arg(long, value_enum, default_value = "network")]
    pub policy: PolicyKind,
    /// Output blob; the manifest is written next to it
    #[arg(short, long, default_value = "ai_lut.bin")]
    pub output: PathBuf,
    /// Also write the layout header (LUT_* constants)
    #[arg(long, value_name = "PATH")]
    pub header: Option<PathBuf>,
    /// Also write the table as a C array
    #[arg(long, value_name = "PATH")]
    pub c_array: Option<PathBuf>,
    /// Enumerate on one thread
    #[arg(long)]
    pub serial: bool,
    /// Print the per-action histogram
    #[arg(long)]
    pub stats: bool,
}

pub fn cmd_generate(args: GenerateArgs) {
    let GenerateArgs {
        config,
        weights,
        policy,
        output,
        header,
        c_array,
        serial,
        stats,
    } = args;
    let config = load_config(&config);
    eprintln!("{}", config.format_summary());

    let policy = build_policy(&config, policy, &weights);
    let table = lut::generate(&config, &*policy, !serial).unwrap_or_else(|e| fail(e));
    let manifest_path = table.write(&output).unwrap_or_else(|e| fail(e));
    eprintln!(
        "Wrote {} ({} bytes) and {}",
        output.display(),
        table.blob.len(),
        manifest_path.display()
    );

    if let Some(path) = &header {
        let guard = include_guard(path, "AI_LUT_H");
        write_text(Some(path), &emit::lut_header(&table.manifest, &guard));
    }
    if let Some(path) = &c_array {
        write_text(
            Some(path),
            &emit::lut_array(&table.blob, &table.manifest, "ai_lookup_table"),
        );
    }
    if stats {
        eprintln!("{}", table.histogram().format_report(&config.actions));
    }
}
