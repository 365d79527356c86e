//! Discrete steering actions.

/// Index into a Q-table row.
pub type ActionId = usize;

pub const N_ACTIONS: usize = 7;

/// Steering angle (degrees) for each action id. Positive steers right.
pub const STEERING_ANGLES: [f64; N_ACTIONS] = [-30.0, -15.0, -10.0, 0.0, 10.0, 15.0, 30.0];

/// Panics if `action >= N_ACTIONS`; ids come from the policy, never from input.
#[inline]
pub fn index_to_angle(action: ActionId) -> f64 {
    STEERING_ANGLES[action]
}

/// Exact inverse of `index_to_angle`; `None` for angles outside the table.
pub fn angle_to_index(angle: f64) -> Option<ActionId> {
    STEERING_ANGLES.iter().position(|&a| a == angle)
}

/// Turning direction of a steering angle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Steer {
    Left,
    Straight,
    Right,
}

impl Steer {
    pub fn of_action(action: ActionId) -> Self {
        let angle = index_to_angle(action);
        if angle > 0.0 {
            Steer::Right
        } else if angle < 0.0 {
            Steer::Left
        } else {
            Steer::Straight
        }
    }
}
