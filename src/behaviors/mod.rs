//! Recovery behaviors and the server that drives them
pub mod backup_free_space;

use tracing::{info, warn};

use crate::error::BehaviorError;
use crate::interfaces::BehaviorContext;
use crate::lifecycle::{Behavior, BehaviorState, Status};

pub use self::backup_free_space::{BackupFreeSpace, MotionCommand};

/// Final result of one goal
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded { cycles: usize },
    Failed { cycles: usize, error: BehaviorError },
}

/// Hosts a single behavior: configures it, starts goals and ticks it until a
/// terminal status.
pub struct BehaviorServer<B: Behavior> {
    behavior: B,
    ctx: BehaviorContext,
    cycles: usize,
    outcome: Option<Outcome>,
}

impl<B: Behavior> BehaviorServer<B> {
    /// Create a new server around a behavior
    pub fn new(behavior: B, ctx: BehaviorContext) -> Self {
        BehaviorServer {
            behavior,
            ctx,
            cycles: 0,
            outcome: None,
        }
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// Result of the last finished goal
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Whether a goal is in progress
    pub fn is_active(&self) -> bool {
        self.behavior.state() == BehaviorState::Running
    }

    pub fn configure(&mut self) -> Result<(), BehaviorError> {
        self.behavior.configure(&self.ctx)
    }

    /// Accept a new goal and run the behavior's decision phase
    pub fn start(&mut self, command: &B::Command) -> Result<(), BehaviorError> {
        if self.is_active() {
            warn!("{} already has a goal in progress", self.behavior.name());
            return Err(BehaviorError::InvalidTransition {
                state: BehaviorState::Running,
                operation: "run",
            });
        }
        self.cycles = 0;
        self.outcome = None;
        info!("Running {}", self.behavior.name());
        match self.behavior.run(&self.ctx, command) {
            Ok(_) => Ok(()),
            Err(error) => {
                warn!("{} failed to start: {}", self.behavior.name(), error);
                self.outcome = Some(Outcome::Failed {
                    cycles: 0,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Run one control cycle. Returns the outcome once the goal has finished.
    pub fn tick(&mut self) -> Option<Outcome> {
        if !self.is_active() {
            return self.outcome.clone();
        }
        self.cycles += 1;
        let outcome = match self.behavior.cycle_update(&self.ctx) {
            Ok(Status::Running) => return None,
            Ok(Status::Succeeded) => {
                info!("{} completed successfully", self.behavior.name());
                Outcome::Succeeded {
                    cycles: self.cycles,
                }
            }
            Err(error) => {
                warn!("{} failed: {}", self.behavior.name(), error);
                Outcome::Failed {
                    cycles: self.cycles,
                    error,
                }
            }
        };
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }

    /// Tick until the goal finishes or `max_cycles` is reached, calling `between`
    /// after each running cycle
    pub fn run_to_completion<F: FnMut()>(
        &mut self,
        max_cycles: usize,
        mut between: F,
    ) -> Option<Outcome> {
        for _ in 0..max_cycles {
            if let Some(outcome) = self.tick() {
                return Some(outcome);
            }
            between();
        }
        None
    }

    pub fn cleanup(&mut self) {
        self.behavior.cleanup();
        self.outcome = None;
        self.cycles = 0;
    }
}
