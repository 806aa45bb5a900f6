//! The dice box: runs throws from notation to settled, resolved values.
//!
//! One throw at a time. A roll with requested results first runs a hidden
//! prediction pass, relabels the dice, then replays the identical throw as
//! the visible pass.

use log::{debug, warn};
use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::body::DieInstance;
use crate::camera::{Camera, ScreenAnchor};
use crate::config::{BoxConfig, StepMode, Theme};
use crate::die::DieType;
use crate::error::DiceError;
use crate::forcing::apply_forcing;
use crate::kinematics::{plan_throw, ThrowVector};
use crate::notation::RollNotation;
use crate::outcome::resolve;
use crate::template::TemplateCache;
use crate::world::ThrowSimulator;
use crate::Real;

/// Identifies one throw; frame callbacks carrying an older id are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

/// Result of a finished throw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub dice: Vec<DieType>,
    pub values: Vec<i32>,
    pub constant: i32,
    /// Sum of `values` plus `constant`.
    pub total: i32,
    /// Simulation steps of the visible pass.
    pub iterations: u32,
    /// Number of dice whose labels were rewritten.
    pub forced: usize,
}

/// What a frame callback did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Rolling,
    /// The throw finished on this frame and `on_complete` has run.
    Finished,
    /// The id does not belong to the active throw; nothing happened.
    Stale,
}

type OnComplete = Box<dyn FnOnce(&RollOutcome)>;

struct ActiveRun {
    id: RunId,
    sim: ThrowSimulator,
    constant: i32,
    forced: usize,
    step_mode: StepMode,
    on_complete: OnComplete,
}

pub struct DiceBox {
    config: BoxConfig,
    templates: TemplateCache,
    camera: Camera,
    rng: Pcg32,
    next_run: u64,
    active: Option<ActiveRun>,
    /// Dice of the last finished throw, kept until the box is cleared.
    resting: Vec<DieInstance>,
}

impl DiceBox {
    /// Seeds from `config.seed`, or from the OS when unset.
    pub fn new(config: BoxConfig, theme: Theme) -> Self {
        let seed = config.seed.unwrap_or_else(|| OsRng.next_u64());
        Self::with_seed(config, theme, seed)
    }

    pub fn with_seed(config: BoxConfig, theme: Theme, seed: u64) -> Self {
        debug!("dice box seeded with {seed}");
        Self {
            templates: TemplateCache::new(theme, config.die_radius),
            camera: Camera::new(config.camera),
            rng: Pcg32::seed_from_u64(seed),
            next_run: 0,
            active: None,
            resting: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &BoxConfig {
        &self.config
    }

    pub fn theme(&self) -> &Theme {
        self.templates.theme()
    }

    /// Change the theme; die templates are rebuilt on the next roll.
    pub fn set_theme(&mut self, theme: Theme) {
        self.templates.set_theme(theme);
    }

    pub fn is_rolling(&self) -> bool {
        self.active.is_some()
    }

    /// A click-style throw drawn from the box's generator.
    pub fn random_throw(&mut self) -> ThrowVector {
        ThrowVector::random(&mut self.rng, &self.config)
    }

    /// Start a throw of `notation`'s dice.
    ///
    /// Returns `Ok(None)` without doing anything while another throw is in
    /// flight. `throw` defaults to a random click-style throw. When the
    /// notation carries requested results, the prediction pass runs here,
    /// synchronously. `on_complete` runs once, from the `animate` call that
    /// finishes the throw.
    pub fn roll<F>(
        &mut self,
        notation: &RollNotation,
        throw: Option<ThrowVector>,
        on_complete: F,
    ) -> Result<Option<RunId>, DiceError>
    where
        F: FnOnce(&RollOutcome) + 'static,
    {
        if let Some(active) = &self.active {
            debug!("roll rejected: run {:?} still in flight", active.id);
            return Ok(None);
        }

        let mut templates = Vec::with_capacity(notation.die_set.len());
        for &die in &notation.die_set {
            templates.push(self.templates.get(die)?.clone());
        }

        let throw = throw.unwrap_or_else(|| self.random_throw());
        let requests = plan_throw(&notation.die_set, &throw, &self.config, &mut self.rng);
        let mut dice: Vec<DieInstance> = templates
            .into_iter()
            .zip(&requests)
            .map(|(template, request)| DieInstance::spawn(template.mesh, template.hull, request))
            .collect();

        let mut step_mode = self.config.step_mode;
        let mut forced = 0;
        if let Some(requested) = &notation.requested_results {
            if requested.len() != dice.len() {
                debug!(
                    "{} requested results for {} dice; extras are ignored",
                    requested.len(),
                    dice.len()
                );
            }
            let mut prediction = ThrowSimulator::new(&self.config, dice.clone());
            let steps = prediction.run_to_rest();
            let predicted = prediction
                .dice()
                .iter()
                .map(|d| resolve(d).map(|r| r.value))
                .collect::<Result<Vec<_>, _>>()?;
            debug!("prediction pass: {predicted:?} after {steps} steps");
            forced = apply_forcing(&mut dice, &predicted, requested);
            // Whole fixed steps replay the prediction exactly.
            step_mode = StepMode::Fixed;
        }

        self.next_run += 1;
        let id = RunId(self.next_run);
        debug!("run {id:?}: throwing {} dice", dice.len());
        self.resting.clear();
        self.active = Some(ActiveRun {
            id,
            sim: ThrowSimulator::new(&self.config, dice),
            constant: notation.constant,
            forced,
            step_mode,
            on_complete: Box::new(on_complete),
        });
        Ok(Some(id))
    }

    /// Frame callback: advance the visible pass by `elapsed` seconds.
    pub fn animate(&mut self, run: RunId, elapsed: Real) -> Result<RunState, DiceError> {
        match self.active.as_mut() {
            Some(active) if active.id == run => {
                active.sim.advance(elapsed, active.step_mode);
                if !active.sim.is_finished() {
                    return Ok(RunState::Rolling);
                }
            }
            _ => {
                warn!("ignoring frame for stale run {run:?}");
                return Ok(RunState::Stale);
            }
        }
        match self.active.take() {
            Some(active) => {
                self.complete(active)?;
                Ok(RunState::Finished)
            }
            None => Ok(RunState::Stale),
        }
    }

    /// Roll and fast-forward the visible pass; `None` if a throw is already
    /// in flight.
    pub fn roll_to_completion(
        &mut self,
        notation: &RollNotation,
        throw: Option<ThrowVector>,
    ) -> Result<Option<RollOutcome>, DiceError> {
        if self.roll(notation, throw, |_| {})?.is_none() {
            return Ok(None);
        }
        match self.active.take() {
            Some(mut active) => {
                active.sim.run_to_rest();
                self.complete(active).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Cancel the active throw and remove every die from the box.
    pub fn clear(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("run {:?} cancelled", active.id);
        }
        self.resting.clear();
    }

    /// Dice currently in the box: the throw in flight, or the last one.
    pub fn dice(&self) -> &[DieInstance] {
        match &self.active {
            Some(active) => active.sim.dice(),
            None => &self.resting,
        }
    }

    pub fn screen_positions(&self) -> Vec<ScreenAnchor> {
        self.dice()
            .iter()
            .filter_map(|d| self.camera.anchor(&d.body.position, d.die_type))
            .collect()
    }

    fn complete(&mut self, active: ActiveRun) -> Result<RollOutcome, DiceError> {
        let iterations = active.sim.iteration();
        let dice = active.sim.into_dice();
        let values = dice
            .iter()
            .map(|d| resolve(d).map(|r| r.value))
            .collect::<Result<Vec<_>, _>>()?;
        let outcome = RollOutcome {
            dice: dice.iter().map(|d| d.die_type).collect(),
            total: values.iter().sum::<i32>() + active.constant,
            values,
            constant: active.constant,
            iterations,
            forced: active.forced,
        };
        debug!(
            "run {:?} finished after {iterations} steps: {:?}",
            active.id, outcome.values
        );
        self.resting = dice;
        (active.on_complete)(&outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn dice_box(seed: u64) -> DiceBox {
        DiceBox::with_seed(BoxConfig::default(), Theme::default(), seed)
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let notation = parse("2d6+1d20+1d10+3");
        let a = dice_box(8).roll_to_completion(&notation, None).unwrap().unwrap();
        let b = dice_box(8).roll_to_completion(&notation, None).unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.values.len(), 4);
        assert_eq!(a.total, a.values.iter().sum::<i32>() + 3);
        assert_eq!(a.forced, 0);
    }

    #[test]
    fn test_values_are_in_range() {
        let notation = parse("1d4+1d6+1d8+1d9+1d10+1d12+1d20+1d100");
        let outcome = dice_box(21).roll_to_completion(&notation, None).unwrap().unwrap();
        for (die, value) in outcome.dice.iter().zip(&outcome.values) {
            assert!(die.label_index(*value).is_some(), "{die} showed {value}");
        }
    }

    #[test]
    fn test_requested_results_are_shown() {
        let notation = parse("1d20+1d6+1d10+1d4+1d100 @ 17 2 3 1 40");
        let outcome = dice_box(3).roll_to_completion(&notation, None).unwrap().unwrap();
        assert_eq!(outcome.values, vec![17, 2, 3, 1, 40]);
        assert_eq!(outcome.total, 63);
    }

    #[test]
    fn test_forced_throw_follows_the_natural_trajectory() {
        let natural = dice_box(12)
            .roll_to_completion(&parse("2d8"), None)
            .unwrap()
            .unwrap();
        let forced = dice_box(12)
            .roll_to_completion(&parse("2d8 @ 1 8"), None)
            .unwrap()
            .unwrap();
        assert_eq!(forced.values, vec![1, 8]);
        assert_eq!(forced.iterations, natural.iterations);
    }

    #[test]
    fn test_illegal_request_keeps_natural_result() {
        let natural = dice_box(5)
            .roll_to_completion(&parse("1d6"), None)
            .unwrap()
            .unwrap();
        let skipped = dice_box(5)
            .roll_to_completion(&parse("1d6 @ 9"), None)
            .unwrap()
            .unwrap();
        assert_eq!(skipped.values, natural.values);
        assert_eq!(skipped.forced, 0);
    }

    #[test]
    fn test_animated_forced_roll_with_uneven_frames() {
        let mut dice_box = dice_box(77);
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let run = dice_box
            .roll(&parse("3d6 @ 6 6 6"), None, move |outcome| {
                *sink.borrow_mut() = Some(outcome.clone());
            })
            .unwrap()
            .unwrap();
        let frames = [0.011, 0.023, 0.016, 0.034, 0.002];
        let mut i = 0;
        while dice_box.animate(run, frames[i % frames.len()]).unwrap() == RunState::Rolling {
            i += 1;
        }
        let outcome = seen.borrow().clone().unwrap();
        assert_eq!(outcome.values, vec![6, 6, 6]);
        assert!(!dice_box.is_rolling());
    }

    #[test]
    fn test_concurrent_roll_is_rejected() {
        let mut dice_box = dice_box(1);
        let notation = parse("1d20");
        let run = dice_box.roll(&notation, None, |_| {}).unwrap();
        assert!(run.is_some());
        assert!(dice_box.roll(&notation, None, |_| {}).unwrap().is_none());
        assert!(dice_box.roll_to_completion(&notation, None).unwrap().is_none());
        assert_eq!(dice_box.dice().len(), 1);
    }

    #[test]
    fn test_callback_runs_exactly_once() {
        let mut dice_box = dice_box(4);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let run = dice_box
            .roll(&parse("1d12"), None, move |_| counter.set(counter.get() + 1))
            .unwrap()
            .unwrap();
        while dice_box.animate(run, 1.0 / 30.0).unwrap() != RunState::Finished {}
        assert_eq!(dice_box.animate(run, 1.0 / 30.0).unwrap(), RunState::Stale);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_clear_cancels_the_run() {
        let mut dice_box = dice_box(9);
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let run = dice_box
            .roll(&parse("2d10"), None, move |_| counter.set(counter.get() + 1))
            .unwrap()
            .unwrap();
        dice_box.animate(run, 0.05).unwrap();
        dice_box.clear();
        assert!(dice_box.dice().is_empty());
        assert_eq!(dice_box.animate(run, 0.05).unwrap(), RunState::Stale);
        assert_eq!(calls.get(), 0);
        // The box accepts a new throw right away.
        assert!(dice_box.roll(&parse("1d6"), None, |_| {}).unwrap().is_some());
    }

    #[test]
    fn test_screen_positions_follow_dice() {
        let mut dice_box = dice_box(2);
        let outcome = dice_box
            .roll_to_completion(&parse("1d4+1d20"), None)
            .unwrap()
            .unwrap();
        let anchors = dice_box.screen_positions();
        assert_eq!(anchors.len(), 2);
        assert_eq!(anchors[0].die_type, DieType::D4);
        assert_eq!(anchors[1].die_type, DieType::D20);
        let viewport = dice_box.config().camera;
        for anchor in anchors {
            assert!(anchor.x > 0.0 && anchor.x < viewport.viewport_width);
            assert!(anchor.y > 0.0 && anchor.y < viewport.viewport_height);
        }
        assert_eq!(outcome.dice, vec![DieType::D4, DieType::D20]);
    }

    #[test]
    fn test_empty_roll_finishes_immediately() {
        let outcome = dice_box(0)
            .roll_to_completion(&parse("+5"), None)
            .unwrap()
            .unwrap();
        assert!(outcome.values.is_empty());
        assert_eq!(outcome.total, 5);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_theme_change_applies_to_next_roll() {
        let mut dice_box = dice_box(6);
        dice_box.roll_to_completion(&parse("1d6"), None).unwrap();
        dice_box.set_theme(Theme {
            bevel: 0.0,
            ..Theme::default()
        });
        dice_box.roll_to_completion(&parse("1d6"), None).unwrap();
        assert_eq!(dice_box.dice()[0].mesh.triangle_count(), 12);
    }
}
