use rand::seq::SliceRandom;
use rand::Rng;

use super::actions::{ActionId, N_ACTIONS};
use super::table::QRow;

/// Argmax over `row`, ties broken uniformly at random among all maximizers.
pub fn greedy_action<R: Rng>(row: &QRow, rng: &mut R) -> ActionId {
    let best = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let maximizers: Vec<ActionId> = (0..N_ACTIONS).filter(|&a| row[a] == best).collect();
    // Empty only if the row holds NaN everywhere; fall back to a uniform pick.
    maximizers
        .choose(rng)
        .copied()
        .unwrap_or_else(|| rng.gen_range(0..N_ACTIONS))
}

/// With probability `epsilon` a uniformly random action, otherwise greedy.
pub fn epsilon_greedy<R: Rng>(row: &QRow, epsilon: f64, rng: &mut R) -> ActionId {
    if rng.gen::<f64>() < epsilon {
        rng.gen_range(0..N_ACTIONS)
    } else {
        greedy_action(row, rng)
    }
}
