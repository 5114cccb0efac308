//! Lifecycle management for recovery behaviors

use crate::error::BehaviorError;
use crate::interfaces::BehaviorContext;

/// Result of a behavior phase that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More cycles expected
    Running,
    /// Phase complete
    Succeeded,
}

/// State of a behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorState {
    Unconfigured,
    Configured,
    Running,
    Succeeded,
    Failed,
}

impl BehaviorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BehaviorState::Succeeded | BehaviorState::Failed)
    }
}

/// Trait for behaviors driven through configure, run and per-cycle updates
pub trait Behavior: Send {
    /// Goal accepted by `run`
    type Command;

    /// Name used in logs
    fn name(&self) -> &str;

    /// Current state
    fn state(&self) -> BehaviorState;

    /// Read parameters and acquire collaborators
    fn configure(&mut self, ctx: &BehaviorContext) -> Result<(), BehaviorError>;

    /// One-shot decision phase for a new goal
    fn run(
        &mut self,
        ctx: &BehaviorContext,
        command: &Self::Command,
    ) -> Result<Status, BehaviorError>;

    /// Called once per control tick after `run` succeeded
    fn cycle_update(&mut self, ctx: &BehaviorContext) -> Result<Status, BehaviorError>;

    /// Release collaborators and drop any goal state
    fn cleanup(&mut self);
}

/// Base state tracking shared by behavior implementations
#[derive(Debug, Clone)]
pub struct BehaviorBase {
    pub name: String,
    state: BehaviorState,
}

impl BehaviorBase {
    /// Create a new behavior base
    pub fn new(name: &str) -> Self {
        BehaviorBase {
            name: name.to_string(),
            state: BehaviorState::Unconfigured,
        }
    }

    /// Get the current state
    pub fn get_state(&self) -> BehaviorState {
        self.state
    }

    /// Set the state
    pub fn set_state(&mut self, state: BehaviorState) {
        self.state = state;
    }

    /// Fail with `InvalidTransition` unless the current state is one of `allowed`
    pub fn require(
        &self,
        allowed: &[BehaviorState],
        operation: &'static str,
    ) -> Result<(), BehaviorError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(BehaviorError::InvalidTransition {
                state: self.state,
                operation,
            })
        }
    }

    /// Record the outcome of a phase and pass it through
    pub fn settle(
        &mut self,
        result: Result<Status, BehaviorError>,
    ) -> Result<Status, BehaviorError> {
        match &result {
            Ok(Status::Running) => self.state = BehaviorState::Running,
            Ok(Status::Succeeded) => self.state = BehaviorState::Succeeded,
            Err(BehaviorError::InvalidTransition { .. }) => {}
            Err(_) => self.state = BehaviorState::Failed,
        }
        result
    }
}
