//! Sequencer state machine
//!
//! States are the stage indices `0..N` plus the terminal `Halted`. The
//! stage only moves forward: to the next index, back to 0 when a looping
//! choreography restarts, or to `Halted`.
//!
//! Settle delays and the loop cooldown are scheduled resumes rather than
//! sleeps. While one is pending the completion check is suspended, but the
//! caller keeps running the axes.

use super::actions::{Action, Actions};
use crate::config::{Choreography, PoseCommand};

/// Current stage of the choreography
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Executing (or about to execute) the pose at this index
    Index(u8),
    /// Choreography finished; no further motion is issued
    Halted,
}

impl Stage {
    /// Raw encoding of `Halted`
    pub const HALTED_RAW: i16 = -1;

    /// Stage index, unless halted
    pub fn index(self) -> Option<u8> {
        match self {
            Stage::Index(i) => Some(i),
            Stage::Halted => None,
        }
    }

    /// Check if the choreography has halted
    pub fn is_halted(self) -> bool {
        self == Stage::Halted
    }

    /// Integer encoding: the index, or -1 when halted
    pub fn as_raw(self) -> i16 {
        match self {
            Stage::Index(i) => i as i16,
            Stage::Halted => Self::HALTED_RAW,
        }
    }
}

/// A scheduled resume the sequencer is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pending {
    /// Nothing scheduled; the completion check is live
    None,
    /// Stage entered, pose is issued once the settle time has elapsed
    Settle { stage: u8, resume_at_ms: u64 },
    /// Looping choreography restarts at stage 0 after the cooldown
    Cooldown { resume_at_ms: u64 },
}

/// Sequencer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerState {
    stage: Stage,
    pending: Pending,
    started: bool,
    laps: u32,
}

impl Default for SequencerState {
    fn default() -> Self {
        Self {
            stage: Stage::Index(0),
            pending: Pending::None,
            started: false,
            laps: 0,
        }
    }
}

impl SequencerState {
    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Scheduled resume, if any
    pub fn pending(&self) -> Pending {
        self.pending
    }

    /// Check if `start()` has been called
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of completed passes through a looping choreography
    pub fn laps(&self) -> u32 {
        self.laps
    }
}

/// Choreography stage sequencer
#[derive(Debug, Clone)]
pub struct Sequencer {
    state: SequencerState,
    choreography: Choreography,
    looping: bool,
    loop_cooldown_ms: u32,
}

impl Sequencer {
    /// Create a sequencer at stage 0, not yet started
    pub fn new(choreography: Choreography, looping: bool, loop_cooldown_ms: u32) -> Self {
        Self {
            state: SequencerState::default(),
            choreography,
            looping,
            loop_cooldown_ms,
        }
    }

    /// Current state
    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    /// The choreography being executed
    pub fn choreography(&self) -> &Choreography {
        &self.choreography
    }

    /// Pose for a stage index
    pub fn pose(&self, stage: u8) -> Option<&PoseCommand> {
        self.choreography.get(stage)
    }

    /// Check if the choreography has halted
    pub fn is_halted(&self) -> bool {
        self.state.stage.is_halted()
    }

    /// Check if a settle delay or cooldown is pending
    pub fn is_pending(&self) -> bool {
        self.state.pending != Pending::None
    }

    /// Enter stage 0
    ///
    /// Calling this more than once has no effect.
    pub fn start(&mut self, now_ms: u64) -> Actions {
        let mut actions = Actions::new();
        if self.state.started {
            return actions;
        }
        self.state.started = true;
        self.enter(0, now_ms, &mut actions);
        actions
    }

    /// Run one completion check
    ///
    /// `at_rest` must be true only when both axes report zero distance to
    /// go. Repeated calls with `at_rest == false` never change the stage.
    pub fn tick(&mut self, now_ms: u64, at_rest: bool) -> Actions {
        let mut actions = Actions::new();
        if !self.state.started || self.is_halted() {
            return actions;
        }

        match self.state.pending {
            Pending::Settle {
                stage,
                resume_at_ms,
            } => {
                if now_ms >= resume_at_ms {
                    self.state.pending = Pending::None;
                    let _ = actions.push(Action::ApplyPose(stage));
                }
                return actions;
            }
            Pending::Cooldown { resume_at_ms } => {
                if now_ms >= resume_at_ms {
                    self.state.pending = Pending::None;
                    self.state.laps = self.state.laps.saturating_add(1);
                    self.enter(0, now_ms, &mut actions);
                }
                return actions;
            }
            Pending::None => {}
        }

        if !at_rest {
            return actions;
        }

        let _ = actions.push(Action::Reconcile);

        let next = match self.state.stage {
            Stage::Index(i) => i as usize + 1,
            Stage::Halted => return actions,
        };

        if next < self.choreography.len() {
            self.enter(next as u8, now_ms, &mut actions);
        } else if self.looping {
            let resume_at_ms = now_ms + self.loop_cooldown_ms as u64;
            self.state.pending = Pending::Cooldown { resume_at_ms };
            let _ = actions.push(Action::BeginCooldown { resume_at_ms });
        } else {
            self.state.stage = Stage::Halted;
            let _ = actions.push(Action::Halt);
        }

        actions
    }

    /// Enter a stage and either apply its pose or schedule the settle
    fn enter(&mut self, stage: u8, now_ms: u64, actions: &mut Actions) {
        let delay_ms = match self.choreography.get(stage) {
            Some(pose) => pose.delay_ms,
            None => {
                // Only reachable with an empty choreography
                self.state.stage = Stage::Halted;
                let _ = actions.push(Action::Halt);
                return;
            }
        };

        self.state.stage = Stage::Index(stage);
        let _ = actions.push(Action::EnterStage(stage));

        if delay_ms == 0 {
            let _ = actions.push(Action::ApplyPose(stage));
        } else {
            self.state.pending = Pending::Settle {
                stage,
                resume_at_ms: now_ms + delay_ms as u64,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoseCommand;
    use proptest::prelude::*;

    fn three_stages() -> Choreography {
        Choreography::from_poses(&[
            PoseCommand::new("a").right(58.0),
            PoseCommand::new("b").after_ms(2000).left(-25.0),
            PoseCommand::new("c").left(10.0).right(10.0),
        ])
        .unwrap()
    }

    fn actions(list: &[Action]) -> Actions {
        Actions::from_slice(list).unwrap()
    }

    #[test]
    fn test_start_enters_stage_zero() {
        let mut seq = Sequencer::new(three_stages(), false, 0);
        assert!(!seq.state().is_started());

        let out = seq.start(0);
        assert_eq!(out, actions(&[Action::EnterStage(0), Action::ApplyPose(0)]));
        assert_eq!(seq.stage(), Stage::Index(0));

        // Second start is ignored
        assert!(seq.start(5).is_empty());
    }

    #[test]
    fn test_tick_before_start_is_noop() {
        let mut seq = Sequencer::new(three_stages(), false, 0);
        assert!(seq.tick(0, true).is_empty());
        assert_eq!(seq.stage(), Stage::Index(0));
    }

    #[test]
    fn test_waits_while_axes_move() {
        let mut seq = Sequencer::new(three_stages(), false, 0);
        seq.start(0);

        for t in 0..100 {
            assert!(seq.tick(t, false).is_empty());
        }
        assert_eq!(seq.stage(), Stage::Index(0));
    }

    #[test]
    fn test_completion_reconciles_then_advances() {
        let mut seq = Sequencer::new(three_stages(), false, 0);
        seq.start(0);

        // Stage 1 has a 2 s settle delay
        let out = seq.tick(1_000, true);
        assert_eq!(out, actions(&[Action::Reconcile, Action::EnterStage(1)]));
        assert_eq!(seq.stage(), Stage::Index(1));
        assert_eq!(
            seq.state().pending(),
            Pending::Settle {
                stage: 1,
                resume_at_ms: 3_000
            }
        );
    }

    #[test]
    fn test_settle_delay_defers_pose() {
        let mut seq = Sequencer::new(three_stages(), false, 0);
        seq.start(0);
        seq.tick(1_000, true);

        // At rest during the settle: no completion check, no advance
        assert!(seq.tick(2_999, true).is_empty());
        assert_eq!(seq.stage(), Stage::Index(1));

        assert_eq!(seq.tick(3_000, true), actions(&[Action::ApplyPose(1)]));
        assert!(!seq.is_pending());
    }

    #[test]
    fn test_halts_after_last_stage() {
        let mut seq = Sequencer::new(three_stages(), false, 0);
        seq.start(0);
        seq.tick(0, true);
        seq.tick(2_000, true);
        assert_eq!(
            seq.tick(2_001, true),
            actions(&[Action::Reconcile, Action::EnterStage(2), Action::ApplyPose(2)])
        );

        assert_eq!(seq.tick(2_002, true), actions(&[Action::Reconcile, Action::Halt]));
        assert_eq!(seq.stage(), Stage::Halted);
        assert_eq!(seq.stage().as_raw(), -1);

        // Halted is terminal
        for t in 3_000..3_010 {
            assert!(seq.tick(t, true).is_empty());
        }
        assert!(seq.is_halted());
    }

    #[test]
    fn test_looping_restarts_after_cooldown() {
        let single = Choreography::from_poses(&[PoseCommand::new("only").left(5.0)]).unwrap();
        let mut seq = Sequencer::new(single, true, 10_000);
        seq.start(0);

        assert_eq!(
            seq.tick(100, true),
            actions(&[
                Action::Reconcile,
                Action::BeginCooldown {
                    resume_at_ms: 10_100
                }
            ])
        );
        // Stage holds its index during the cooldown
        assert_eq!(seq.stage(), Stage::Index(0));
        assert!(seq.tick(10_099, true).is_empty());

        assert_eq!(
            seq.tick(10_100, true),
            actions(&[Action::EnterStage(0), Action::ApplyPose(0)])
        );
        assert_eq!(seq.state().laps(), 1);
    }

    #[test]
    fn test_empty_choreography_halts_on_start() {
        let mut seq = Sequencer::new(Choreography::new(), true, 0);
        assert_eq!(seq.start(0), actions(&[Action::Halt]));
        assert!(seq.is_halted());
    }

    #[test]
    fn test_stage_raw_encoding() {
        assert_eq!(Stage::Index(7).as_raw(), 7);
        assert_eq!(Stage::Index(7).index(), Some(7));
        assert_eq!(Stage::Halted.index(), None);
    }

    proptest! {
        #[test]
        fn prop_stage_only_moves_forward(
            looping in any::<bool>(),
            ticks in proptest::collection::vec((0u64..3_000, any::<bool>()), 1..200),
        ) {
            let mut seq = Sequencer::new(three_stages(), looping, 500);
            let mut now = 0u64;
            seq.start(now);
            let last = (seq.choreography().len() - 1) as u8;

            for (dt, at_rest) in ticks {
                now += dt;
                let before = seq.stage();
                let out = seq.tick(now, at_rest);
                let after = seq.stage();

                let allowed = match (before, after) {
                    (a, b) if a == b => true,
                    (Stage::Index(a), Stage::Index(b)) => b == a + 1 || (looping && a == last && b == 0),
                    (Stage::Index(a), Stage::Halted) => !looping && a == last,
                    _ => false,
                };
                prop_assert!(allowed, "{:?} -> {:?}", before, after);

                // Reconciliation is only requested at rest
                if out.contains(&Action::Reconcile) {
                    prop_assert!(at_rest);
                }
            }
        }
    }
}
