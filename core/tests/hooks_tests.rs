// tests/hooks_tests.rs
mod common;
use common::*;
use servitor::{attr, CallHook, Context, ServiceBuilder, StepControl, StepResult, Value, ValueType};
use std::sync::atomic::Ordering;

struct Recording {
  label: &'static str,
  trail: Trail,
}

impl CallHook for Recording {
  fn name(&self) -> &str {
    self.label
  }

  fn around(&self, ctx: &mut Context, proceed: &mut dyn FnMut(&mut Context) -> StepResult) -> StepResult {
    self.trail.push(format!("{}:before", self.label));
    let result = proceed(ctx);
    self.trail.push(format!("{}:after", self.label));
    result
  }
}

#[test]
fn first_registered_hook_is_outermost() {
  setup_tracing();
  let trail = Trail::default();
  let in_step = trail.clone();
  let service = ServiceBuilder::new("Hooked")
    .around(Recording {
      label: "outer",
      trail: trail.clone(),
    })
    .around(Recording {
      label: "inner",
      trail: trail.clone(),
    })
    .make("work", move |_| {
      in_step.push("work");
      Ok(StepControl::Continue)
    })
    .build()
    .unwrap();

  assert!(service.call(()).unwrap().is_success());
  assert_eq!(
    trail.entries(),
    vec!["outer:before", "inner:before", "work", "inner:after", "outer:after"]
  );
}

#[test]
fn hook_can_short_circuit_the_call() {
  setup_tracing();
  let runs = counter();
  let seen = runs.clone();
  let service = ServiceBuilder::new("Gate")
    .input(attr("open").types(ValueType::Boolean))
    .output(attr("status").types(ValueType::String))
    .around_with("gate", |ctx, proceed| {
      if ctx.input("open")?.query() {
        return proceed(ctx);
      }
      ctx.set_output("status", "closed")?;
      Ok(StepControl::Success)
    })
    .make("work", move |ctx| {
      seen.fetch_add(1, Ordering::SeqCst);
      ctx.set_output("status", "done")?;
      Ok(StepControl::Continue)
    })
    .build()
    .unwrap();

  let closed = service.call([("open", false)]).unwrap();
  assert_eq!(closed.output("status"), Some(&Value::from("closed")));
  assert_eq!(count(&runs), 0);

  let open = service.call([("open", true)]).unwrap();
  assert_eq!(open.output("status"), Some(&Value::from("done")));
  assert_eq!(count(&runs), 1);
}

#[test]
fn hook_sees_step_errors() {
  setup_tracing();
  let trail = Trail::default();
  let recorded = trail.clone();
  let service = ServiceBuilder::new("Observed")
    .around_with("observer", move |ctx, proceed| {
      let result = proceed(ctx);
      if let Err(error) = &result {
        recorded.push(format!("observed: {}", error));
      }
      result
    })
    .make("explode", |_| Err(TestError::Storage.into()))
    .build()
    .unwrap();

  assert!(service.call(()).is_err());
  assert_eq!(trail.entries(), vec!["observed: Storage unavailable"]);
}

#[test]
fn after_success_actions_run_by_priority() {
  setup_tracing();
  let trail = Trail::default();
  let (a, b, c) = (trail.clone(), trail.clone(), trail.clone());
  let service = ServiceBuilder::new("Notifier")
    .make("work", |_| Ok(StepControl::Continue))
    .after_success(20, "audit", move |_| {
      a.push("audit");
      Ok(())
    })
    .after_success(10, "notify", move |_| {
      b.push("notify");
      Ok(())
    })
    .after_success(20, "archive", move |_| {
      c.push("archive");
      Ok(())
    })
    .build()
    .unwrap();

  assert!(service.call(()).unwrap().is_success());
  assert_eq!(trail.entries(), vec!["notify", "audit", "archive"]);
}

#[test]
fn after_success_runs_after_early_success_but_not_after_failure() {
  setup_tracing();
  let runs = counter();
  let seen = runs.clone();
  let service = ServiceBuilder::new("Shortcut")
    .input(attr("cached").types(ValueType::Boolean))
    .make("maybe_finish", |ctx| {
      if ctx.input("cached")?.query() {
        return ctx.success();
      }
      ctx.fail(servitor::Failure::new("cache miss"))
    })
    .after_success(0, "count", move |_| {
      seen.fetch_add(1, Ordering::SeqCst);
      Ok(())
    })
    .build()
    .unwrap();

  assert!(service.call([("cached", true)]).unwrap().is_success());
  assert_eq!(count(&runs), 1);
  assert!(service.call([("cached", false)]).unwrap().is_failure());
  assert_eq!(count(&runs), 1);
}

#[test]
fn after_success_action_can_write_outputs_and_fail_the_call() {
  setup_tracing();
  let service = ServiceBuilder::new("Stamped")
    .input(attr("reject").types(ValueType::Boolean))
    .output(attr("stamp").types(ValueType::String))
    .make("work", |_| Ok(StepControl::Continue))
    .after_success(0, "stamp", |ctx| {
      if ctx.input("reject")?.query() {
        anyhow::bail!(servitor::Failure::new("stamp rejected"));
      }
      ctx.set_output("stamp", "ok")?;
      Ok(())
    })
    .build()
    .unwrap();

  let stamped = service.call([("reject", false)]).unwrap();
  assert_eq!(stamped.output("stamp"), Some(&Value::from("ok")));

  let rejected = service.call([("reject", true)]).unwrap();
  assert_eq!(rejected.error().unwrap().message(), "stamp rejected");
}
