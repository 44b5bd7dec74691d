//! Decision selection and the meaning of decision codes.

use serde::{Deserialize, Serialize};

use super::OUTPUTS;

/// Argmax over the output scores. Strict `>` in a left-to-right scan, so a
/// tie goes to the lowest index.
#[inline]
pub fn select(scores: &[i32; OUTPUTS]) -> u8 {
    let mut best = 0usize;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] {
            best = i;
        }
    }
    best as u8
}

/// Paddle action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Stay,
    Up,
    Down,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Stay => "stay",
            Action::Up => "up",
            Action::Down => "down",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What each decision code (output neuron index) means on the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionOrder(pub [Action; OUTPUTS]);

impl ActionOrder {
    /// 0 = stay, 1 = up, 2 = down.
    pub const STAY_UP_DOWN: ActionOrder = ActionOrder([Action::Stay, Action::Up, Action::Down]);
    /// 0 = up, 1 = stay, 2 = down.
    pub const UP_STAY_DOWN: ActionOrder = ActionOrder([Action::Up, Action::Stay, Action::Down]);

    pub fn action(&self, code: u8) -> Option<Action> {
        self.0.get(code as usize).copied()
    }

    pub fn code(&self, action: Action) -> u8 {
        self.0
            .iter()
            .position(|&a| a == action)
            .map_or(0, |i| i as u8)
    }

    /// Every action appears exactly once.
    pub fn is_permutation(&self) -> bool {
        [Action::Stay, Action::Up, Action::Down]
            .iter()
            .all(|a| self.0.iter().filter(|&b| b == a).count() == 1)
    }
}

impl std::fmt::Display for ActionOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}={}", i, a))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_maximum_wins() {
        assert_eq!(select(&[5231, 5357, 5263]), 1);
        assert_eq!(select(&[-4702, -4788, -4485]), 2);
        assert_eq!(select(&[10, -1, 3]), 0);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        assert_eq!(select(&[7, 7, 7]), 0);
        assert_eq!(select(&[1, 5, 5]), 1);
        assert_eq!(select(&[5, 1, 5]), 0);
        assert_eq!(select(&[i32::MIN, i32::MIN, i32::MIN]), 0);
    }

    #[test]
    fn action_order_lookup() {
        let order = ActionOrder::UP_STAY_DOWN;
        assert_eq!(order.action(0), Some(Action::Up));
        assert_eq!(order.action(3), None);
        assert_eq!(order.code(Action::Stay), 1);
        assert_eq!(ActionOrder::STAY_UP_DOWN.code(Action::Stay), 0);
        assert_eq!(order.to_string(), "0=up 1=stay 2=down");
    }

    #[test]
    fn permutation_check() {
        assert!(ActionOrder::STAY_UP_DOWN.is_permutation());
        assert!(!ActionOrder([Action::Up, Action::Up, Action::Down]).is_permutation());
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&ActionOrder::STAY_UP_DOWN).unwrap();
        assert_eq!(json, r#"["stay","up","down"]"#);
    }
}
