// servitor/src/core/step.rs

//! Steps and the stages that group them.

use super::context::Context;
use super::control::StepResult;
use std::fmt;
use std::sync::Arc;

/// Body of a step.
pub type StepFn = Arc<dyn Fn(&mut Context) -> StepResult + Send + Sync + 'static>;

/// Runs around a stage's steps. The second argument proceeds into the steps;
/// not calling it skips them.
pub type WrapperFn =
  Arc<dyn Fn(&mut Context, &mut dyn FnMut(&mut Context) -> StepResult) -> StepResult + Send + Sync + 'static>;

/// Receives the error a stage raised. Its own result replaces the stage's.
pub type RollbackFn = Arc<dyn Fn(&mut Context, &anyhow::Error) -> StepResult + Send + Sync + 'static>;

/// Gate for a step or stage: a fixed flag or a check against the call context.
#[derive(Clone)]
pub enum Condition {
  Literal(bool),
  Dynamic(Arc<dyn Fn(&Context) -> bool + Send + Sync + 'static>),
}

impl Condition {
  pub fn when(f: impl Fn(&Context) -> bool + Send + Sync + 'static) -> Self {
    Condition::Dynamic(Arc::new(f))
  }

  pub(crate) fn evaluate(&self, ctx: &Context) -> bool {
    match self {
      Condition::Literal(flag) => *flag,
      Condition::Dynamic(f) => f(ctx),
    }
  }
}

impl From<bool> for Condition {
  fn from(flag: bool) -> Self {
    Condition::Literal(flag)
  }
}

impl fmt::Debug for Condition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Condition::Literal(flag) => write!(f, "Literal({})", flag),
      Condition::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
    }
  }
}

/// `only_if` / `only_unless` attached to a step or stage.
#[derive(Clone, Debug)]
pub(crate) struct Guard {
  condition: Condition,
  opposite: bool,
}

impl Guard {
  /// True when the guarded unit should run.
  pub(crate) fn allows(&self, ctx: &Context) -> bool {
    self.condition.evaluate(ctx) != self.opposite
  }
}

/// One unit of execution logic.
#[derive(Clone)]
pub struct Step {
  pub(crate) name: String,
  pub(crate) position: Option<usize>,
  pub(crate) run: StepFn,
  pub(crate) guard: Option<Guard>,
}

impl Step {
  pub fn new(name: impl Into<String>, f: impl Fn(&mut Context) -> StepResult + Send + Sync + 'static) -> Self {
    Self {
      name: name.into(),
      position: None,
      run: Arc::new(f),
      guard: None,
    }
  }

  /// Explicit run order. Inside a stage block it orders the block's steps;
  /// on a step declared on its own it places that step's stage among the
  /// service's stages. Steps without one are numbered after everything
  /// declared before them.
  pub fn position(mut self, position: usize) -> Self {
    self.position = Some(position);
    self
  }

  pub fn only_if(mut self, condition: impl Into<Condition>) -> Self {
    self.guard = Some(Guard {
      condition: condition.into(),
      opposite: false,
    });
    self
  }

  pub fn only_unless(mut self, condition: impl Into<Condition>) -> Self {
    self.guard = Some(Guard {
      condition: condition.into(),
      opposite: true,
    });
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn get_position(&self) -> Option<usize> {
    self.position
  }

  pub(crate) fn allows(&self, ctx: &Context) -> bool {
    self.guard.as_ref().map_or(true, |g| g.allows(ctx))
  }
}

impl fmt::Debug for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Step")
      .field("name", &self.name)
      .field("position", &self.position)
      .field("guard", &self.guard)
      .finish()
  }
}

/// Ordered group of steps sharing an optional wrapper and rollback.
#[derive(Clone)]
pub struct Stage {
  /// Run order among the service's stages. Filled in at build time when unset.
  pub(crate) position: Option<usize>,
  pub(crate) steps: Vec<Step>,
  pub(crate) wrapper: Option<WrapperFn>,
  pub(crate) rollback: Option<RollbackFn>,
  pub(crate) guard: Option<Guard>,
}

impl Stage {
  pub(crate) fn single(step: Step) -> Self {
    Self {
      position: step.position,
      steps: vec![step],
      wrapper: None,
      rollback: None,
      guard: None,
    }
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  pub fn position(&self) -> Option<usize> {
    self.position
  }

  pub fn has_wrapper(&self) -> bool {
    self.wrapper.is_some()
  }

  pub fn has_rollback(&self) -> bool {
    self.rollback.is_some()
  }

  pub(crate) fn allows(&self, ctx: &Context) -> bool {
    self.guard.as_ref().map_or(true, |g| g.allows(ctx))
  }

  /// Fills in missing positions starting after `taken` and orders the steps.
  /// Returns the new count of positioned steps.
  pub(crate) fn assign_positions(&mut self, taken: usize) -> usize {
    let mut counter = taken;
    for step in &mut self.steps {
      counter += 1;
      if step.position.is_none() {
        step.position = Some(counter);
      }
    }
    self.steps.sort_by_key(|s| s.position.unwrap_or(usize::MAX));
    counter
  }
}

impl fmt::Debug for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Stage")
      .field("position", &self.position)
      .field("steps", &self.steps)
      .field("wrapper_present", &self.wrapper.is_some())
      .field("rollback_present", &self.rollback.is_some())
      .field("guard", &self.guard)
      .finish()
  }
}

/// Collects the steps of one `stage` block.
#[derive(Default)]
pub struct StageBuilder {
  steps: Vec<Step>,
  wrapper: Option<WrapperFn>,
  rollback: Option<RollbackFn>,
  guard: Option<Guard>,
}

impl StageBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn make(
    &mut self,
    name: impl Into<String>,
    f: impl Fn(&mut Context) -> StepResult + Send + Sync + 'static,
  ) -> &mut Self {
    self.steps.push(Step::new(name, f));
    self
  }

  pub fn make_step(&mut self, step: Step) -> &mut Self {
    self.steps.push(step);
    self
  }

  pub fn wrap_in(
    &mut self,
    f: impl Fn(&mut Context, &mut dyn FnMut(&mut Context) -> StepResult) -> StepResult + Send + Sync + 'static,
  ) -> &mut Self {
    self.wrapper = Some(Arc::new(f));
    self
  }

  pub fn rollback(&mut self, f: impl Fn(&mut Context, &anyhow::Error) -> StepResult + Send + Sync + 'static) -> &mut Self {
    self.rollback = Some(Arc::new(f));
    self
  }

  pub fn only_if(&mut self, condition: impl Into<Condition>) -> &mut Self {
    self.guard = Some(Guard {
      condition: condition.into(),
      opposite: false,
    });
    self
  }

  pub fn only_unless(&mut self, condition: impl Into<Condition>) -> &mut Self {
    self.guard = Some(Guard {
      condition: condition.into(),
      opposite: true,
    });
    self
  }

  pub(crate) fn build(self) -> Stage {
    Stage {
      position: None,
      steps: self.steps,
      wrapper: self.wrapper,
      rollback: self.rollback,
      guard: self.guard,
    }
  }
}
