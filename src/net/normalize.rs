//! Raw game state to network inputs, in integer arithmetic only.
//!
//! Two normalization families have shipped on the target. They are distinct
//! configurations, never interchangeable:
//!
//! - tile-ratio: `tile = px >> tile_shift; norm = (tile * S) / tiles`,
//!   velocity `((v + offset) * S) >> velocity_shift`.
//! - direct-bitshift: `norm = ((px << pre_shift) * mul) >> post_shift`,
//!   velocity `(v + offset) << velocity_shift`.
//!
//! Nothing is clamped here. A raw value outside its axis's declared domain
//! is an error, never wrapped.

use serde::{Deserialize, Serialize};

use super::INPUTS;
use crate::error::{LutError, Result};
use crate::lut::domain::{Axes, Axis, RawState};

/// Position scaling of the direct-bitshift family: `((px << pre_shift) * mul) >> post_shift`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitshiftScale {
    #[serde(default)]
    pub pre_shift: u32,
    pub mul: i32,
    pub post_shift: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "kebab-case")]
pub enum Normalization {
    TileRatio {
        tile_shift: u32,
        ball_x_tiles: i32,
        ball_y_tiles: i32,
        ai_y_tiles: i32,
        velocity_offset: i32,
        velocity_shift: u32,
    },
    DirectBitshift {
        ball_x: BitshiftScale,
        ball_y: BitshiftScale,
        ai_y: BitshiftScale,
        #[serde(default)]
        velocity_offset: i32,
        velocity_shift: u32,
    },
}

impl Normalization {
    pub fn family(&self) -> &'static str {
        match self {
            Normalization::TileRatio { .. } => "tile-ratio",
            Normalization::DirectBitshift { .. } => "direct-bitshift",
        }
    }
}

/// Normalizer bound to a scale and the axes whose domain it enforces.
#[derive(Clone, Debug)]
pub struct Normalizer {
    family: Normalization,
    scale: i32,
    axes: Axes,
}

impl Normalizer {
    /// Validate the family against the axes: divisors are positive, tile-ratio
    /// velocities land on non-negative integers, and no axis extreme
    /// overflows 32 bits.
    pub fn new(family: Normalization, scale: i32, axes: Axes) -> Result<Self> {
        let normalizer = Self {
            family,
            scale,
            axes,
        };

        if let Normalization::TileRatio {
            ball_x_tiles,
            ball_y_tiles,
            ai_y_tiles,
            velocity_offset,
            ..
        } = family
        {
            for (axis, tiles) in [
                (Axis::BallX, ball_x_tiles),
                (Axis::BallY, ball_y_tiles),
                (Axis::AiY, ai_y_tiles),
            ] {
                if tiles <= 0 {
                    return Err(LutError::Config(format!(
                        "{} tile count must be positive, got {}",
                        axis, tiles
                    )));
                }
            }
            for axis in [Axis::BallVx, Axis::BallVy] {
                let min = axes.get(axis).raw_min();
                if min + velocity_offset < 0 {
                    return Err(LutError::Config(format!(
                        "{} offset {} leaves raw velocity {} negative",
                        axis, velocity_offset, min
                    )));
                }
            }
        }

        for axis in [Axis::BallX, Axis::BallY, Axis::AiY] {
            if axes.get(axis).raw_min() < 0 {
                return Err(LutError::Config(format!(
                    "{} is a pixel position and cannot start below zero",
                    axis
                )));
            }
        }

        // Every formula is monotonic, so the axis extremes bound every input.
        for axis in [Axis::BallX, Axis::BallY, Axis::BallVx, Axis::BallVy, Axis::AiY] {
            let spec = axes.get(axis);
            for raw in [spec.raw_min(), spec.raw_max()] {
                if normalizer.checked_input(axis, raw).is_none() {
                    return Err(LutError::Overflow {
                        stage: "normalizer",
                        unit: axis as usize,
                    });
                }
            }
        }

        Ok(normalizer)
    }

    pub fn family(&self) -> &Normalization {
        &self.family
    }

    /// Network inputs for a raw state, in weights1 row order.
    pub fn normalize(&self, raw: &RawState) -> Result<[i32; INPUTS]> {
        self.axes.check_raw(raw)?;
        Ok([
            self.input(Axis::BallX, raw.ball_x),
            self.input(Axis::BallY, raw.ball_y),
            self.input(Axis::BallVx, raw.ball_vx),
            self.input(Axis::BallVy, raw.ball_vy),
            self.input(Axis::AiY, raw.ai_y),
        ])
    }

    #[inline]
    fn input(&self, axis: Axis, raw: i32) -> i32 {
        let scale = self.scale;
        match (&self.family, axis) {
            (
                Normalization::TileRatio {
                    velocity_offset,
                    velocity_shift,
                    ..
                },
                Axis::BallVx | Axis::BallVy,
            ) => ((raw + velocity_offset) * scale) >> velocity_shift,
            (Normalization::TileRatio { tile_shift, .. }, _) => {
                ((raw >> tile_shift) * scale) / self.tiles(axis)
            }
            (
                Normalization::DirectBitshift {
                    velocity_offset,
                    velocity_shift,
                    ..
                },
                Axis::BallVx | Axis::BallVy,
            ) => (raw + velocity_offset) << velocity_shift,
            (Normalization::DirectBitshift { .. }, _) => {
                let s = self.bitshift(axis);
                ((raw << s.pre_shift) * s.mul) >> s.post_shift
            }
        }
    }

    /// `input` with every step checked; used to bound the domain up front.
    fn checked_input(&self, axis: Axis, raw: i32) -> Option<i32> {
        let scale = self.scale;
        match (&self.family, axis) {
            (
                Normalization::TileRatio {
                    velocity_offset,
                    velocity_shift,
                    ..
                },
                Axis::BallVx | Axis::BallVy,
            ) => raw
                .checked_add(*velocity_offset)?
                .checked_mul(scale)?
                .checked_shr(*velocity_shift),
            (Normalization::TileRatio { tile_shift, .. }, _) => raw
                .checked_shr(*tile_shift)?
                .checked_mul(scale)?
                .checked_div(self.tiles(axis)),
            (
                Normalization::DirectBitshift {
                    velocity_offset,
                    velocity_shift,
                    ..
                },
                Axis::BallVx | Axis::BallVy,
            ) => raw
                .checked_add(*velocity_offset)?
                .checked_mul(1i32.checked_shl(*velocity_shift)?),
            (Normalization::DirectBitshift { .. }, _) => {
                let s = self.bitshift(axis);
                raw.checked_mul(1i32.checked_shl(s.pre_shift)?)?
                    .checked_mul(s.mul)?
                    .checked_shr(s.post_shift)
            }
        }
    }

    fn tiles(&self, axis: Axis) -> i32 {
        match self.family {
            Normalization::TileRatio {
                ball_x_tiles,
                ball_y_tiles,
                ai_y_tiles,
                ..
            } => match axis {
                Axis::BallX => ball_x_tiles,
                Axis::BallY => ball_y_tiles,
                _ => ai_y_tiles,
            },
            Normalization::DirectBitshift { .. } => 1,
        }
    }

    fn bitshift(&self, axis: Axis) -> BitshiftScale {
        match self.family {
            Normalization::DirectBitshift {
                ball_x,
                ball_y,
                ai_y,
                ..
            } => match axis {
                Axis::BallX => ball_x,
                Axis::BallY => ball_y,
                _ => ai_y,
            },
            Normalization::TileRatio { .. } => BitshiftScale {
                pre_shift: 0,
                mul: 1,
                post_shift: 0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lut::domain::AxisSpec;

    fn axes() -> Axes {
        Axes {
            ball_x: AxisSpec::new(40, 0, 3),
            ball_y: AxisSpec::new(28, 0, 3),
            ball_vx: AxisSpec::new(9, -4, 0),
            ball_vy: AxisSpec::new(9, -4, 0),
            ai_y: AxisSpec::new(28, 0, 3),
        }
    }

    fn tile_ratio() -> Normalization {
        Normalization::TileRatio {
            tile_shift: 3,
            ball_x_tiles: 39,
            ball_y_tiles: 27,
            ai_y_tiles: 27,
            velocity_offset: 4,
            velocity_shift: 3,
        }
    }

    fn direct() -> Normalization {
        Normalization::DirectBitshift {
            ball_x: BitshiftScale {
                pre_shift: 1,
                mul: 13,
                post_shift: 6,
            },
            ball_y: BitshiftScale {
                pre_shift: 0,
                mul: 37,
                post_shift: 6,
            },
            ai_y: BitshiftScale {
                pre_shift: 0,
                mul: 37,
                post_shift: 6,
            },
            velocity_offset: 0,
            velocity_shift: 4,
        }
    }

    #[test]
    fn tile_ratio_values() {
        let n = Normalizer::new(tile_ratio(), 1024, axes()).unwrap();
        assert_eq!(
            n.normalize(&RawState::new(0, 0, 0, 0, 0)).unwrap(),
            [0, 0, 512, 512, 0]
        );
        assert_eq!(
            n.normalize(&RawState::new(160, 112, 4, -2, 80)).unwrap(),
            [525, 530, 1024, 256, 379]
        );
        // Pixels inside a tile share its value.
        assert_eq!(
            n.normalize(&RawState::new(167, 119, 4, -2, 87)).unwrap(),
            [525, 530, 1024, 256, 379]
        );
    }

    #[test]
    fn direct_bitshift_values() {
        let n = Normalizer::new(direct(), 1024, axes()).unwrap();
        assert_eq!(
            n.normalize(&RawState::new(160, 112, 4, -2, 80)).unwrap(),
            [65, 64, 64, -32, 46]
        );
        assert_eq!(
            n.normalize(&RawState::new(312, 216, -4, 4, 0)).unwrap(),
            [126, 124, -64, 64, 0]
        );
    }

    #[test]
    fn out_of_domain_fails_loudly() {
        let n = Normalizer::new(tile_ratio(), 1024, axes()).unwrap();
        let err = n.normalize(&RawState::new(320, 0, 0, 0, 0)).unwrap_err();
        assert!(matches!(err, LutError::OutOfDomain { axis: Axis::BallX, value: 320, .. }));
        let err = n.normalize(&RawState::new(0, 0, 0, -5, 0)).unwrap_err();
        assert!(matches!(err, LutError::OutOfDomain { axis: Axis::BallVy, .. }));
    }

    #[test]
    fn tile_ratio_rejects_negative_velocity_after_offset() {
        let family = Normalization::TileRatio {
            tile_shift: 3,
            ball_x_tiles: 39,
            ball_y_tiles: 27,
            ai_y_tiles: 27,
            velocity_offset: 2,
            velocity_shift: 3,
        };
        assert!(Normalizer::new(family, 1024, axes()).is_err());
    }

    #[test]
    fn zero_tile_count_rejected() {
        let family = Normalization::TileRatio {
            tile_shift: 3,
            ball_x_tiles: 0,
            ball_y_tiles: 27,
            ai_y_tiles: 27,
            velocity_offset: 4,
            velocity_shift: 3,
        };
        assert!(matches!(
            Normalizer::new(family, 1024, axes()),
            Err(LutError::Config(_))
        ));
    }

    #[test]
    fn overflowing_constants_rejected() {
        let family = Normalization::DirectBitshift {
            ball_x: BitshiftScale {
                pre_shift: 20,
                mul: 4096,
                post_shift: 0,
            },
            ball_y: BitshiftScale {
                pre_shift: 0,
                mul: 37,
                post_shift: 6,
            },
            ai_y: BitshiftScale {
                pre_shift: 0,
                mul: 37,
                post_shift: 6,
            },
            velocity_offset: 0,
            velocity_shift: 4,
        };
        assert!(matches!(
            Normalizer::new(family, 1024, axes()),
            Err(LutError::Overflow { stage: "normalizer", .. })
        ));
    }

    #[test]
    fn family_names() {
        assert_eq!(tile_ratio().family(), "tile-ratio");
        assert_eq!(direct().family(), "direct-bitshift");
    }
}
