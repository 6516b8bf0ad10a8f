// servitor/src/service/hooks.rs

//! Registration of call hooks, after-success actions and `fail_on` rescue
//! mappings on a `ServiceBuilder`.

use super::definition::ServiceBuilder;
use crate::core::context::Context;
use crate::core::control::StepResult;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

/// Wraps the running phase of every call: all stages plus after-success actions.
///
/// An implementation proceeds by invoking `proceed`, and may inspect or replace
/// its result. Not invoking it short-circuits the call.
pub trait CallHook: Send + Sync {
  fn name(&self) -> &str {
    "call_hook"
  }

  fn around(&self, ctx: &mut Context, proceed: &mut dyn FnMut(&mut Context) -> StepResult) -> StepResult;
}

type AroundFn = dyn Fn(&mut Context, &mut dyn FnMut(&mut Context) -> StepResult) -> StepResult + Send + Sync;

/// `CallHook` backed by a closure.
pub(crate) struct FnHook {
  name: String,
  f: Box<AroundFn>,
}

impl CallHook for FnHook {
  fn name(&self) -> &str {
    &self.name
  }

  fn around(&self, ctx: &mut Context, proceed: &mut dyn FnMut(&mut Context) -> StepResult) -> StepResult {
    (self.f)(ctx, proceed)
  }
}

pub(crate) type AfterActionFn = Arc<dyn Fn(&mut Context) -> anyhow::Result<()> + Send + Sync>;

/// Runs once the stages finished successfully, lowest priority first.
#[derive(Clone)]
pub(crate) struct AfterAction {
  pub(crate) priority: i32,
  pub(crate) name: String,
  pub(crate) action: AfterActionFn,
}

impl fmt::Debug for AfterAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AfterAction")
      .field("priority", &self.priority)
      .field("name", &self.name)
      .finish()
  }
}

type RescueMatcher = Arc<dyn Fn(&anyhow::Error) -> Option<String> + Send + Sync>;

/// Maps one foreign error type to a failure message.
#[derive(Clone)]
pub(crate) struct RescueHandler {
  pub(crate) error_type: &'static str,
  matcher: RescueMatcher,
}

impl RescueHandler {
  fn for_type<E, F>(f: F) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
    F: Fn(&E) -> String + Send + Sync + 'static,
  {
    let matcher: RescueMatcher = Arc::new(move |error: &anyhow::Error| {
      error
        .downcast_ref::<E>()
        .or_else(|| error.chain().find_map(|cause| cause.downcast_ref::<E>()))
        .map(|matched| f(matched))
    });
    Self {
      error_type: std::any::type_name::<E>(),
      matcher,
    }
  }

  /// The mapped message, when `error` is (or wraps) the handled type.
  pub(crate) fn try_map(&self, error: &anyhow::Error) -> Option<String> {
    (self.matcher)(error)
  }
}

impl fmt::Debug for RescueHandler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RescueHandler").field("error_type", &self.error_type).finish()
  }
}

impl ServiceBuilder {
  /// Turns errors of type `E` raised by a step into a `base` failure with the
  /// message `f` returns. The original error text goes to `meta["original_exception"]`.
  ///
  /// Later registrations are checked first.
  pub fn fail_on<E>(mut self, f: impl Fn(&E) -> String + Send + Sync + 'static) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    event!(Level::TRACE, service = %self.name, error_type = %std::any::type_name::<E>(), "Rescue mapping registered.");
    self.rescues.push(RescueHandler::for_type::<E, _>(f));
    self
  }

  /// Adds a hook around the running phase. The first hook added is outermost.
  pub fn around(mut self, hook: impl CallHook + 'static) -> Self {
    self.hooks.push(Arc::new(hook));
    self
  }

  pub fn around_with(
    mut self,
    name: impl Into<String>,
    f: impl Fn(&mut Context, &mut dyn FnMut(&mut Context) -> StepResult) -> StepResult + Send + Sync + 'static,
  ) -> Self {
    self.hooks.push(Arc::new(FnHook {
      name: name.into(),
      f: Box::new(f),
    }));
    self
  }

  /// Registers an action run after a successful run of the stages, including one
  /// ended early by `success`. Actions run by ascending `priority`; equal
  /// priorities keep registration order.
  pub fn after_success(
    mut self,
    priority: i32,
    name: impl Into<String>,
    f: impl Fn(&mut Context) -> anyhow::Result<()> + Send + Sync + 'static,
  ) -> Self {
    self.after_actions.push(AfterAction {
      priority,
      name: name.into(),
      action: Arc::new(f),
    });
    self
  }
}
