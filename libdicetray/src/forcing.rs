//! Forced outcomes.
//!
//! The physics never changes. After a hidden prediction pass tells us which
//! face each die lands on, the printed labels are rotated so that face
//! carries the requested number; replaying the same throw then shows it.

use log::{debug, warn};

use crate::body::DieInstance;
use crate::die::DieType;

/// Label offset that turns `predicted` into `desired` on a `die`.
///
/// `None` when either value can never appear on that die; such requests
/// are skipped rather than clamped onto some other face.
pub fn label_offset(die: DieType, predicted: i32, desired: i32) -> Option<i32> {
    let from = die.label_index(predicted)? as i32;
    let to = die.label_index(desired)? as i32;
    Some(to - from)
}

/// Relabel `dice` so that each shows its requested value, given the values
/// `predicted` for them. Missing or illegal requests leave that die alone.
///
/// Returns how many dice were relabeled; a die already showing its
/// requested value is not counted.
pub fn apply_forcing(dice: &mut [DieInstance], predicted: &[i32], requested: &[i32]) -> usize {
    let mut forced = 0;
    for ((die, &predicted), &desired) in dice.iter_mut().zip(predicted).zip(requested) {
        match label_offset(die.die_type, predicted, desired) {
            Some(0) => debug!("{} already lands on {desired}", die.die_type),
            Some(offset) => {
                debug!(
                    "forcing {}: predicted {predicted}, desired {desired}, offset {offset}",
                    die.die_type
                );
                die.mesh.relabel(offset);
                forced += 1;
            }
            None => warn!(
                "{} cannot show {desired}; keeping its natural result {predicted}",
                die.die_type
            ),
        }
    }
    forced
}
