// servitor/src/core/control.rs

//! Signals steps return to the executor, and the phases a call moves through.

use std::fmt;

/// Signal from a step indicating whether the call should go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Run the next step.
  Continue,
  /// End the call successfully now. Remaining steps are skipped;
  /// after-success actions still run.
  Success,
}

/// What every step, wrapper and rollback returns.
///
/// Framework errors (`ServiceError`, `Failure`) travel inside the `anyhow::Error`
/// and are recovered by the executor; anything else is a foreign error that is
/// either mapped by a `fail_on` handler or reported as unhandled.
pub type StepResult = anyhow::Result<StepControl>;

/// Phase of a single call, for tracing and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
  Initialized,
  InputsBound,
  InputsValidated,
  Running { step: String },
  /// A step requested early success.
  Succeeded,
  Failed,
  Completed,
}

impl fmt::Display for CallState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CallState::Initialized => f.write_str("initialized"),
      CallState::InputsBound => f.write_str("inputs_bound"),
      CallState::InputsValidated => f.write_str("inputs_validated"),
      CallState::Running { step } => write!(f, "running({})", step),
      CallState::Succeeded => f.write_str("succeeded"),
      CallState::Failed => f.write_str("failed"),
      CallState::Completed => f.write_str("completed"),
    }
  }
}
