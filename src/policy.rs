//! What a table cell is computed from.
//!
//! The enumerator and verifier only see a [`Policy`]: a pure function from a
//! representative raw state to a decision code. The network [`Engine`] is the
//! production policy; [`Predictive`] is the analytic intercept tracker the
//! firmware falls back to, tabulated through the same pipeline.
//!
//! [`Engine`]: crate::engine::Engine

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lut::domain::RawState;
use crate::net::{Action, ActionOrder};

/// Pure decision function over raw game state. Must be deterministic and
/// safe to call from several rayon workers at once.
pub trait Policy: Sync {
    fn decide(&self, raw: &RawState) -> Result<u8>;

    /// Short name for logs and manifests.
    fn describe(&self) -> String;

    /// Content hash of the parameters behind the decisions, if any.
    fn weights_hash(&self) -> Option<String> {
        None
    }
}

/// Extrapolates the ball to the paddle column, folds the path off the top
/// and bottom walls, and steers the paddle center toward it with a dead zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predictive {
    /// x coordinate of the AI paddle face.
    pub intercept_x: i32,
    /// Playfield height; the ball path reflects at 0 and here.
    pub field_height: i32,
    /// Half the paddle height.
    pub paddle_half: i32,
    pub dead_zone: i32,
    pub actions: ActionOrder,
}

impl Predictive {
    /// Tracker tuned for the 320x224 playfield and 48 px paddle.
    pub fn new(actions: ActionOrder) -> Self {
        Self {
            intercept_x: 290,
            field_height: 224,
            paddle_half: 24,
            dead_zone: 8,
            actions,
        }
    }

    /// Ball y when it reaches the paddle column, or its current y if it is
    /// moving away.
    pub fn intercept_y(&self, raw: &RawState) -> i32 {
        if raw.ball_vx <= 0 {
            return raw.ball_y;
        }
        let time = (self.intercept_x - raw.ball_x) / raw.ball_vx;
        let mut y = raw.ball_y + raw.ball_vy * time;
        while y < 0 || y > self.field_height {
            if y < 0 {
                y = -y;
            }
            if y > self.field_height {
                y = 2 * self.field_height - y;
            }
        }
        y
    }

    pub fn action(&self, raw: &RawState) -> Action {
        let diff = self.intercept_y(raw) - (raw.ai_y + self.paddle_half);
        if diff < -self.dead_zone {
            Action::Up
        } else if diff > self.dead_zone {
            Action::Down
        } else {
            Action::Stay
        }
    }
}

impl Policy for Predictive {
    fn decide(&self, raw: &RawState) -> Result<u8> {
        Ok(self.actions.code(self.action(raw)))
    }

    fn describe(&self) -> String {
        format!(
            "predictive (intercept x={}, dead zone {})",
            self.intercept_x, self.dead_zone
        )
    }
}
