//! Built-in configurations, one per table generation that shipped.
//!
//! None of them is a default: which normalization and action order the
//! deployed routine uses has to be read off that routine, so callers name a
//! preset explicitly.

use super::PipelineConfig;
use crate::fixed::Reciprocal;
use crate::lut::domain::{Axes, AxisSpec};
use crate::lut::pack::Packing;
use crate::net::{ActionOrder, BitshiftScale, Normalization};

pub const PRESET_NAMES: [&str; 4] = [
    "tile-ratio-v3",
    "tile-ratio-v3.1",
    "direct-bitshift",
    "firmware-1000",
];

pub fn preset(name: &str) -> Option<PipelineConfig> {
    match name {
        "tile-ratio-v3" => Some(tile_ratio_v3()),
        "tile-ratio-v3.1" => Some(tile_ratio_v3_1()),
        "direct-bitshift" => Some(direct_bitshift()),
        "firmware-1000" => Some(firmware_1000()),
        _ => None,
    }
}

/// Full-screen axes at 8 px resolution: 320x224 playfield, velocities -4..=4.
fn screen_axes() -> Axes {
    Axes {
        ball_x: AxisSpec::new(40, 0, 3),
        ball_y: AxisSpec::new(28, 0, 3),
        ball_vx: AxisSpec::new(9, -4, 0),
        ball_vy: AxisSpec::new(9, -4, 0),
        ai_y: AxisSpec::new(28, 0, 3),
    }
}

/// Unpacked 2.5 MB table, tile-ratio inputs with 39/27/27 divisors.
fn tile_ratio_v3() -> PipelineConfig {
    PipelineConfig {
        name: "tile-ratio-v3".to_string(),
        scale: 1024,
        narrow_activations: false,
        packing: Packing::Byte,
        actions: ActionOrder::STAY_UP_DOWN,
        reciprocal: None,
        normalization: Normalization::TileRatio {
            tile_shift: 3,
            ball_x_tiles: 39,
            ball_y_tiles: 27,
            ai_y_tiles: 27,
            velocity_offset: 4,
            velocity_shift: 3,
        },
        axes: screen_axes(),
    }
}

/// 27 KB packed table: 7 ball_x tiles, ball moving toward the AI paddle
/// (vx 1..=4), tile divisors equal to the axis step counts.
fn tile_ratio_v3_1() -> PipelineConfig {
    PipelineConfig {
        name: "tile-ratio-v3.1".to_string(),
        scale: 1024,
        narrow_activations: false,
        packing: Packing::TwoBit,
        actions: ActionOrder::STAY_UP_DOWN,
        reciprocal: None,
        normalization: Normalization::TileRatio {
            tile_shift: 3,
            ball_x_tiles: 7,
            ball_y_tiles: 18,
            ai_y_tiles: 24,
            velocity_offset: 4,
            velocity_shift: 3,
        },
        axes: Axes {
            ball_x: AxisSpec::new(7, 0, 3),
            ball_y: AxisSpec::new(18, 0, 3),
            ball_vx: AxisSpec::new(4, 1, 0),
            ball_vy: AxisSpec::new(9, -4, 0),
            ai_y: AxisSpec::new(24, 0, 3),
        },
    }
}

/// Reciprocal-approximation positions: x * 2/5 as `(x << 1) * 13 >> 6`,
/// y * 4/7 as `y * 37 >> 6`.
fn bitshift_positions() -> (BitshiftScale, BitshiftScale) {
    let x = BitshiftScale {
        pre_shift: 1,
        mul: 13,
        post_shift: 6,
    };
    let y = BitshiftScale {
        pre_shift: 0,
        mul: 37,
        post_shift: 6,
    };
    (x, y)
}

fn direct_bitshift() -> PipelineConfig {
    let (x, y) = bitshift_positions();
    PipelineConfig {
        name: "direct-bitshift".to_string(),
        scale: 1024,
        narrow_activations: false,
        packing: Packing::Byte,
        actions: ActionOrder::UP_STAY_DOWN,
        reciprocal: None,
        normalization: Normalization::DirectBitshift {
            ball_x: x,
            ball_y: y,
            ai_y: y,
            velocity_offset: 0,
            velocity_shift: 4,
        },
        axes: screen_axes(),
    }
}

/// On-target routine with S = 1000 weights: `/1000` as `* 33 >> 15`, hidden
/// and output values held in `s16`.
fn firmware_1000() -> PipelineConfig {
    PipelineConfig {
        name: "firmware-1000".to_string(),
        scale: 1000,
        narrow_activations: true,
        reciprocal: Some(Reciprocal { mul: 33, shift: 15 }),
        ..direct_bitshift()
    }
}
