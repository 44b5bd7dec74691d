//! C source emitters for the target build: weight arrays, the table layout
//! header, and the table itself as a `const u8` array.

use crate::fixed::Rescale;
use crate::lut::domain::NESTING;
use crate::lut::manifest::Manifest;
use crate::lut::pack::Packing;
use crate::net::{Action, Weights, HIDDEN, INPUTS, OUTPUTS};

/// Values per row of an emitted table array.
const ROW: usize = 20;

/// Line buffer for one generated C file.
struct CWriter {
    output: Vec<String>,
}

impl CWriter {
    fn new(banner: &str) -> Self {
        Self {
            output: vec![format!("// Generated by paddle-lut: {}", banner)],
        }
    }

    fn line(&mut self, s: impl Into<String>) {
        self.output.push(s.into());
    }

    fn blank(&mut self) {
        self.output.push(String::new());
    }

    fn define(&mut self, name: &str, value: impl std::fmt::Display) {
        self.output.push(format!("#define {} {}", name, value));
    }

    fn finish(self) -> String {
        let mut s = self.output.join("\n");
        s.push('\n');
        s
    }
}

fn join(values: &[i32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Weight arrays as `s16` when every value fits 16 bits, `s32` otherwise.
pub fn weights_header(weights: &Weights, rescale: Rescale, guard: &str) -> String {
    let ty = if weights.max_abs() <= i16::MAX as i32 {
        "s16"
    } else {
        "s32"
    };
    let mut c = CWriter::new(&format!("S = {}, rescale {}", weights.scale, rescale));
    c.line(format!("// weights blake3 {}", weights.hash()));
    c.line(format!("#ifndef {}", guard));
    c.line(format!("#define {}", guard));
    c.blank();
    c.line("#include <genesis.h>");
    c.blank();
    c.define("INPUT_SIZE", INPUTS);
    c.define("HIDDEN_SIZE", HIDDEN);
    c.define("OUTPUT_SIZE", OUTPUTS);
    c.define("WEIGHT_SCALE", weights.scale);
    c.blank();

    c.line(format!("const {} weights1[INPUT_SIZE][HIDDEN_SIZE] = {{", ty));
    for (i, row) in weights.w1.iter().enumerate() {
        let sep = if i + 1 < INPUTS { "," } else { "" };
        c.line(format!("    {{{}}}{} // {}", join(row), sep, NESTING[i]));
    }
    c.line("};");
    c.blank();
    c.line(format!(
        "const {} bias1[HIDDEN_SIZE] = {{{}}};",
        ty,
        join(&weights.b1)
    ));
    c.blank();
    c.line(format!("const {} weights2[HIDDEN_SIZE][OUTPUT_SIZE] = {{", ty));
    for (h, row) in weights.w2.iter().enumerate() {
        let sep = if h + 1 < HIDDEN { "," } else { "" };
        c.line(format!("    {{{}}}{}", join(row), sep));
    }
    c.line("};");
    c.blank();
    c.line(format!(
        "const {} bias2[OUTPUT_SIZE] = {{{}}};",
        ty,
        join(&weights.b2)
    ));
    c.blank();
    c.line(format!("#endif // {}", guard));
    c.finish()
}

fn macro_name(name: &str) -> String {
    name.to_ascii_uppercase()
}

/// Layout constants a reader needs to index the blob, and the action codes.
pub fn lut_header(manifest: &Manifest, guard: &str) -> String {
    let mut c = CWriter::new(&format!(
        "{} ({}, {})",
        manifest.name, manifest.policy, manifest.family
    ));
    c.line(format!("// blob blake3 {}", manifest.blob_hash));
    c.line(format!("#ifndef {}", guard));
    c.line(format!("#define {}", guard));
    c.blank();
    for axis in NESTING {
        c.define(
            &format!("LUT_{}_STEPS", macro_name(axis.name())),
            manifest.axes.get(axis).steps,
        );
    }
    c.blank();
    for axis in NESTING {
        let spec = manifest.axes.get(axis);
        let name = macro_name(axis.name());
        c.define(&format!("LUT_{}_OFFSET", name), spec.offset);
        c.define(&format!("LUT_{}_SHIFT", name), spec.stride_shift);
    }
    c.blank();
    c.define("LUT_ENTRIES", manifest.entries);
    c.define("LUT_SIZE", manifest.bytes);
    c.define(
        "LUT_PACKED_2BIT",
        u8::from(manifest.packing == Packing::TwoBit),
    );
    c.blank();
    for action in [Action::Stay, Action::Up, Action::Down] {
        c.define(
            &format!("LUT_ACTION_{}", macro_name(action.name())),
            manifest.actions.code(action),
        );
    }
    c.blank();
    c.line("// idx = (v - OFFSET) >> SHIFT per axis, then");
    c.line(
        "// index = ((((bx * LUT_BALL_Y_STEPS + by) * LUT_BALL_VX_STEPS + vx) \
         * LUT_BALL_VY_STEPS + vy) * LUT_AI_Y_STEPS + ay)",
    );
    match manifest.packing {
        Packing::TwoBit => c.line("// action = (lut[index >> 2] >> (6 - 2 * (index & 3))) & 3"),
        Packing::Byte => c.line("// action = lut[index]"),
    }
    c.blank();
    c.line(format!("#endif // {}", guard));
    c.finish()
}

/// The blob as a C array, `ROW` values per line.
pub fn lut_array(blob: &[u8], manifest: &Manifest, symbol: &str) -> String {
    let mut c = CWriter::new(&format!("{}, {} packing", manifest.name, manifest.packing));
    c.line(format!("// Action codes: {}", manifest.actions));
    c.blank();
    c.line("#include <genesis.h>");
    c.blank();
    c.line(format!("const u8 {}[{}] = {{", symbol, blob.len()));
    let rows = blob.chunks(ROW).count();
    for (r, row) in blob.chunks(ROW).enumerate() {
        let values = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let sep = if r + 1 < rows { "," } else { "" };
        c.line(format!("    {}{}", values, sep));
    }
    c.line("};");
    c.finish()
}
