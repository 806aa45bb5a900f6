//! Settle detection.

use crate::body::{DieInstance, RigidBody};
use crate::config::BoxConfig;
use crate::Real;

/// Decides when dice have stopped and when a throw is over.
///
/// A die settles after `required_steps` consecutive steps with every
/// velocity component under the epsilons. Settled dice are no longer
/// checked. A throw finishes when every die has settled or `max_seconds`
/// of simulated time have passed, however the steps were sized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleDetector {
    pub linear_epsilon: Real,
    pub angular_epsilon: Real,
    pub required_steps: u32,
    pub max_seconds: Real,
    /// Half a fixed step, so summed `f32` steps still meet the ceiling.
    pub time_slack: Real,
}

impl SettleDetector {
    pub fn from_config(config: &BoxConfig) -> Self {
        Self {
            linear_epsilon: config.settle_linear_epsilon,
            angular_epsilon: config.settle_angular_epsilon,
            required_steps: config.settle_steps.max(1),
            max_seconds: config.max_sim_seconds,
            time_slack: config.timestep * 0.5,
        }
    }

    pub fn is_still(&self, body: &RigidBody) -> bool {
        body.velocity.iter().all(|c| c.abs() < self.linear_epsilon)
            && body.angular_velocity.iter().all(|c| c.abs() < self.angular_epsilon)
    }

    /// Record the state after step number `iteration` (1-based), taken once
    /// `simulated` seconds have passed, and report whether the throw is
    /// finished.
    pub fn observe(&self, dice: &mut [DieInstance], iteration: u32, simulated: Real) -> bool {
        for die in dice.iter_mut().filter(|d| !d.is_settled()) {
            if self.is_still(&die.body) {
                die.still_steps += 1;
                if die.still_steps >= self.required_steps {
                    die.settled_since = Some(iteration);
                }
            } else {
                die.still_steps = 0;
            }
        }
        self.is_finished(dice, simulated)
    }

    pub fn is_finished(&self, dice: &[DieInstance], simulated: Real) -> bool {
        simulated + self.time_slack >= self.max_seconds
            || dice.iter().all(DieInstance::is_settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use crate::die::DieType;
    use crate::kinematics::ThrowRequest;
    use crate::template::DieTemplate;
    use nalgebra::{Point3, Vector3};

    fn resting_die() -> DieInstance {
        let template = DieTemplate::build(DieType::D6, &Theme::default(), 1.0).unwrap();
        let request = ThrowRequest {
            die_type: DieType::D6,
            position: Point3::new(0.0, 1.0, 0.0),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            axis: Vector3::y(),
            angle: 0.0,
        };
        DieInstance::spawn(template.mesh, template.hull, &request)
    }

    fn detector() -> SettleDetector {
        SettleDetector::from_config(&BoxConfig::default())
    }

    #[test]
    fn test_needs_three_consecutive_still_steps() {
        let detector = detector();
        let mut dice = vec![resting_die()];
        assert!(!detector.observe(&mut dice, 1, 0.0));
        assert!(!detector.observe(&mut dice, 2, 0.0));
        assert!(detector.observe(&mut dice, 3, 0.0));
        assert_eq!(dice[0].settled_since, Some(3));
    }

    #[test]
    fn test_motion_resets_the_counter() {
        let detector = detector();
        let mut dice = vec![resting_die()];
        detector.observe(&mut dice, 1, 0.0);
        detector.observe(&mut dice, 2, 0.0);
        dice[0].body.angular_velocity = Vector3::new(0.0, 0.6, 0.0);
        assert!(!detector.observe(&mut dice, 3, 0.0));
        assert_eq!(dice[0].still_steps, 0);
        dice[0].body.angular_velocity = Vector3::zeros();
        assert!(!detector.observe(&mut dice, 4, 0.0));
        assert!(!detector.observe(&mut dice, 5, 0.0));
        assert!(detector.observe(&mut dice, 6, 0.0));
    }

    #[test]
    fn test_settled_dice_are_not_rechecked() {
        let detector = detector();
        let mut dice = vec![resting_die(), resting_die()];
        dice[1].body.velocity = Vector3::new(1.0, 0.0, 0.0);
        for i in 1..=3 {
            assert!(!detector.observe(&mut dice, i, 0.0));
        }
        assert_eq!(dice[0].settled_since, Some(3));
        dice[0].body.velocity = Vector3::new(5.0, 0.0, 0.0);
        dice[1].body.velocity = Vector3::zeros();
        for i in 4..=5 {
            assert!(!detector.observe(&mut dice, i, 0.0));
        }
        assert!(detector.observe(&mut dice, 6, 0.0));
        assert_eq!(dice[0].settled_since, Some(3));
    }

    #[test]
    fn test_ceiling_finishes_a_moving_throw() {
        let detector = detector();
        let mut dice = vec![resting_die()];
        dice[0].body.velocity = Vector3::new(0.0, 0.0, 3.0);
        assert!(!detector.observe(&mut dice, 599, 9.98));
        assert!(detector.observe(&mut dice, 600, 10.0));
        assert!(!dice[0].is_settled());
    }

    #[test]
    fn test_ceiling_is_simulated_time_not_steps() {
        let detector = detector();
        let mut dice = vec![resting_die()];
        dice[0].body.velocity = Vector3::new(0.0, 0.0, 3.0);
        // Short partial steps: many more than 600 before ten seconds pass.
        assert!(!detector.observe(&mut dice, 1000, 1000.0 / 144.0));
        assert!(detector.observe(&mut dice, 1440, 10.0));
    }
}
