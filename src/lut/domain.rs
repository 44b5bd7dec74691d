//! The quantized input domain and its flat index.
//!
//! Nesting order, outermost to innermost: ball_x, ball_y, ball_vx, ball_vy,
//! ai_y (ai_y varies fastest). The embedded reader computes
//! `index = index * next_axis_steps + next_axis_value` in exactly this order,
//! so the order is fixed here once and recorded in every manifest.

use serde::{Deserialize, Serialize};

use crate::error::{LutError, Result};

/// One of the five state axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    BallX,
    BallY,
    BallVx,
    BallVy,
    AiY,
}

/// Canonical nesting, outermost first.
pub const NESTING: [Axis; 5] = [Axis::BallX, Axis::BallY, Axis::BallVx, Axis::BallVy, Axis::AiY];

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Axis::BallX => "ball_x",
            Axis::BallY => "ball_y",
            Axis::BallVx => "ball_vx",
            Axis::BallVy => "ball_vy",
            Axis::AiY => "ai_y",
        }
    }

    pub fn from_name(name: &str) -> Option<Axis> {
        NESTING.iter().copied().find(|a| a.name() == name)
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Step count of an axis and how an index maps back to a representative raw
/// value: `raw = offset + (index << stride_shift)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub steps: u32,
    #[serde(default)]
    pub offset: i32,
    #[serde(default)]
    pub stride_shift: u32,
}

impl AxisSpec {
    pub const fn new(steps: u32, offset: i32, stride_shift: u32) -> Self {
        Self {
            steps,
            offset,
            stride_shift,
        }
    }

    /// Representative raw value for an axis index.
    #[inline]
    pub fn raw(&self, index: u32) -> i32 {
        self.offset + ((index as i32) << self.stride_shift)
    }

    /// Smallest raw value inside the declared domain.
    pub fn raw_min(&self) -> i32 {
        self.offset
    }

    /// Largest raw value inside the declared domain: the last cell's top edge.
    pub fn raw_max(&self) -> i32 {
        self.offset + ((self.steps as i32) << self.stride_shift) - 1
    }

    fn validate(&self, axis: Axis) -> Result<()> {
        if self.steps == 0 {
            return Err(LutError::Config(format!("{} has zero steps", axis)));
        }
        if self.stride_shift > 16 {
            return Err(LutError::Config(format!(
                "{} stride shift {} is larger than any screen",
                axis, self.stride_shift
            )));
        }
        let span = (self.steps as i64) << self.stride_shift;
        if self.offset as i64 + span - 1 > i16::MAX as i64 || (self.offset as i64) < i16::MIN as i64
        {
            return Err(LutError::Config(format!(
                "{} raw domain does not fit the target's 16-bit registers",
                axis
            )));
        }
        Ok(())
    }
}

/// Axis indices of one table cell. The only input a table cell is computed from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct QuantizedState {
    pub ball_x: u32,
    pub ball_y: u32,
    pub ball_vx: u32,
    pub ball_vy: u32,
    pub ai_y: u32,
}

impl QuantizedState {
    /// Indices in nesting order.
    pub fn to_array(self) -> [u32; 5] {
        [self.ball_x, self.ball_y, self.ball_vx, self.ball_vy, self.ai_y]
    }

    pub fn from_array(a: [u32; 5]) -> Self {
        Self {
            ball_x: a[0],
            ball_y: a[1],
            ball_vx: a[2],
            ball_vy: a[3],
            ai_y: a[4],
        }
    }
}

impl std::fmt::Display for QuantizedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(bx={}, by={}, vx={}, vy={}, ay={})",
            self.ball_x, self.ball_y, self.ball_vx, self.ball_vy, self.ai_y
        )
    }
}

/// Game-native state: pixel positions and velocity units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawState {
    pub ball_x: i32,
    pub ball_y: i32,
    pub ball_vx: i32,
    pub ball_vy: i32,
    pub ai_y: i32,
}

impl RawState {
    pub fn new(ball_x: i32, ball_y: i32, ball_vx: i32, ball_vy: i32, ai_y: i32) -> Self {
        Self {
            ball_x,
            ball_y,
            ball_vx,
            ball_vy,
            ai_y,
        }
    }

    pub fn get(&self, axis: Axis) -> i32 {
        match axis {
            Axis::BallX => self.ball_x,
            Axis::BallY => self.ball_y,
            Axis::BallVx => self.ball_vx,
            Axis::BallVy => self.ball_vy,
            Axis::AiY => self.ai_y,
        }
    }
}

impl std::fmt::Display for RawState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(ball_x={}, ball_y={}, ball_vx={}, ball_vy={}, ai_y={})",
            self.ball_x, self.ball_y, self.ball_vx, self.ball_vy, self.ai_y
        )
    }
}

/// The five axes of the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axes {
    pub ball_x: AxisSpec,
    pub ball_y: AxisSpec,
    pub ball_vx: AxisSpec,
    pub ball_vy: AxisSpec,
    pub ai_y: AxisSpec,
}

impl Axes {
    pub fn get(&self, axis: Axis) -> &AxisSpec {
        match axis {
            Axis::BallX => &self.ball_x,
            Axis::BallY => &self.ball_y,
            Axis::BallVx => &self.ball_vx,
            Axis::BallVy => &self.ball_vy,
            Axis::AiY => &self.ai_y,
        }
    }

    /// Step counts in nesting order.
    pub fn steps(&self) -> [u32; 5] {
        NESTING.map(|a| self.get(a).steps)
    }

    /// Check every axis and that the flat index fits a 32-bit target index.
    pub fn validate(&self) -> Result<()> {
        for axis in NESTING {
            self.get(axis).validate(axis)?;
        }
        let total = self
            .steps()
            .iter()
            .try_fold(1u32, |acc, &s| acc.checked_mul(s))
            .ok_or_else(|| {
                LutError::Config("table has more entries than a 32-bit index can address".into())
            })?;
        debug_assert!(total > 0);
        Ok(())
    }

    /// Number of table entries: the product of all step counts.
    pub fn entries(&self) -> usize {
        self.steps().iter().map(|&s| s as usize).product()
    }

    /// Entries per outer-axis (ball_x) value.
    pub fn slice_len(&self) -> usize {
        self.steps()[1..].iter().map(|&s| s as usize).product()
    }

    pub fn contains(&self, q: &QuantizedState) -> bool {
        q.to_array()
            .iter()
            .zip(self.steps())
            .all(|(&i, steps)| i < steps)
    }

    /// Flat table index of a state. `None` if any index is out of range.
    pub fn flat_index(&self, q: &QuantizedState) -> Option<usize> {
        if !self.contains(q) {
            return None;
        }
        let index = q
            .to_array()
            .iter()
            .zip(self.steps())
            .fold(0usize, |index, (&value, steps)| {
                index * steps as usize + value as usize
            });
        Some(index)
    }

    /// Inverse of `flat_index`: peel off axes innermost first.
    pub fn decode(&self, mut index: usize) -> Option<QuantizedState> {
        if index >= self.entries() {
            return None;
        }
        let steps = self.steps();
        let mut out = [0u32; 5];
        for k in (0..5).rev() {
            let s = steps[k] as usize;
            out[k] = (index % s) as u32;
            index /= s;
        }
        Some(QuantizedState::from_array(out))
    }

    /// Representative raw values fed to the normalizer for a state.
    pub fn raw_state(&self, q: &QuantizedState) -> RawState {
        RawState {
            ball_x: self.ball_x.raw(q.ball_x),
            ball_y: self.ball_y.raw(q.ball_y),
            ball_vx: self.ball_vx.raw(q.ball_vx),
            ball_vy: self.ball_vy.raw(q.ball_vy),
            ai_y: self.ai_y.raw(q.ai_y),
        }
    }

    /// Check a raw state against every axis's declared domain.
    pub fn check_raw(&self, raw: &RawState) -> Result<()> {
        for axis in NESTING {
            let spec = self.get(axis);
            let value = raw.get(axis);
            if value < spec.raw_min() || value > spec.raw_max() {
                return Err(LutError::OutOfDomain {
                    axis,
                    value,
                    min: spec.raw_min(),
                    max: spec.raw_max(),
                });
            }
        }
        Ok(())
    }
}
