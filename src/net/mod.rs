//! The 5 → 8 → 3 paddle network in scaled-integer arithmetic.
//!
//! Inputs, in weights1 row order: ball_x, ball_y, ball_vx, ball_vy, ai_y.
//! Outputs: one score per decision code, argmax wins.

pub mod eval;
pub mod normalize;
pub mod select;
pub mod weights;

pub const INPUTS: usize = 5;
pub const HIDDEN: usize = 8;
pub const OUTPUTS: usize = 3;

pub use eval::{ForwardTrace, Network};
pub use normalize::{BitshiftScale, Normalization, Normalizer};
pub use select::{select, Action, ActionOrder};
pub use weights::Weights;
