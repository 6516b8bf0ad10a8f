// tests/error_handling_tests.rs
mod common;
use common::*;
use servitor::{attr, Failure, ServiceBuilder, ServiceError, StepControl, Value, ValueType, DEFAULT_FAILURE_TYPE};

#[test]
fn failure_defaults_to_base_type_and_keeps_meta() {
  setup_tracing();
  let outcome = invoice_checker().call([("invoice_number", "BB-1")]).unwrap();
  assert!(outcome.is_failure_of(DEFAULT_FAILURE_TYPE));
  match outcome.error() {
    Some(ServiceError::Failure(failure)) => {
      assert_eq!(failure.service, "InvoiceChecker");
      assert_eq!(failure.message, "bad");
    }
    other => panic!("Expected a failure, got {:?}", other),
  }

  let typed = ServiceBuilder::new("Typed")
    .make("refuse", |ctx| {
      ctx.fail(Failure::new("limit reached").of_type("quota").with_meta("limit", 3))
    })
    .build()
    .unwrap();
  let outcome = typed.call(()).unwrap();
  assert!(outcome.is_failure_of("quota"));
  assert!(!outcome.is_failure_of(DEFAULT_FAILURE_TYPE));
  assert_eq!(
    outcome.error().unwrap().meta().and_then(|m| m.get("limit")),
    Some(&Value::from(3))
  );
}

#[test]
fn fail_helpers_raise_namespaced_attribute_errors() {
  setup_tracing();
  let service = ServiceBuilder::new("Helpers")
    .input(attr("which").types(ValueType::String))
    .make("fail", |ctx| {
      let which = ctx.input("which")?.to_string();
      match which.as_str() {
        "input" => ctx.fail_input("which", "Input refused"),
        "internal" => ctx.fail_internal("cache", "Cache is stale"),
        "output" => ctx.fail_output("report", "Report is empty"),
        _ => Ok(StepControl::Continue),
      }
    })
    .build()
    .unwrap();

  let input = service.call([("which", "input")]).unwrap();
  assert!(input.is_failure_of("input"));
  assert_eq!(input.error().unwrap().attribute_name(), Some("which"));
  assert_eq!(input.error().unwrap().message(), "Input refused");

  let internal = service.call([("which", "internal")]).unwrap();
  assert!(internal.is_failure_of("internal"));
  assert_eq!(internal.error().unwrap().attribute_name(), Some("cache"));

  let output = service.call([("which", "output")]).unwrap();
  assert!(output.is_failure_of("output"));
  assert!(output.is_failure_of("all"));
}

#[test]
fn fail_on_maps_foreign_errors_to_base_failures() {
  setup_tracing();
  let service = ServiceBuilder::new("Charger")
    .fail_on::<TestError>(|e| format!("Charge failed: {}", e))
    .make("charge", |_| Err(TestError::Gateway("card declined".to_string()).into()))
    .build()
    .unwrap();

  let outcome = service.call(()).unwrap();
  assert!(outcome.is_failure_of(DEFAULT_FAILURE_TYPE));
  let error = outcome.error().unwrap();
  assert_eq!(error.message(), "Charge failed: Payment gateway refused: card declined");
  assert_eq!(
    error.meta().and_then(|m| m.get("original_exception")),
    Some(&Value::from("Payment gateway refused: card declined"))
  );
}

#[test]
fn fail_on_matches_wrapped_errors_and_prefers_latest_mapping() {
  setup_tracing();
  let service = ServiceBuilder::new("Charger")
    .fail_on::<TestError>(|_| "first mapping".to_string())
    .fail_on::<TestError>(|_| "latest mapping".to_string())
    .make("charge", |_| {
      Err(anyhow::Error::new(TestError::Storage).context("while saving the charge"))
    })
    .build()
    .unwrap();

  let outcome = service.call(()).unwrap();
  assert_eq!(outcome.error().unwrap().message(), "latest mapping");
}

#[test]
fn unmapped_foreign_error_is_returned_as_err() {
  setup_tracing();
  let service = ServiceBuilder::new("Fragile")
    .make("explode", |_| Err(TestError::Storage.into()))
    .build()
    .unwrap();

  let error = service.call(()).unwrap_err();
  assert!(matches!(error, ServiceError::Unhandled { .. }));
  assert_eq!(error.service(), "Fragile");
  assert_eq!(error.to_string(), "[Fragile] Storage unavailable");
  let source = error.unhandled_error().unwrap();
  assert_eq!(source.downcast_ref::<TestError>(), Some(&TestError::Storage));
}

#[test]
fn call_strict_returns_framework_errors_as_err() {
  setup_tracing();
  let error = invoice_checker().call_strict([("invoice_number", "BB-1")]).unwrap_err();
  assert!(matches!(error, ServiceError::Failure(_)));

  let error = doubler().call_strict(()).unwrap_err();
  assert!(matches!(error, ServiceError::Input { .. }));

  let outcome = doubler().call_strict([("number", 2)]).unwrap();
  assert_eq!(outcome.output("number"), Some(&Value::from(4)));
}

#[test]
fn fail_result_reraises_a_nested_failure() {
  setup_tracing();
  let checker = invoice_checker();
  let service = ServiceBuilder::new("Billing")
    .input(attr("invoice_number").types(ValueType::String))
    .make("check_invoice", move |ctx| {
      let number = ctx.input("invoice_number")?.clone();
      let nested = checker.call([("invoice_number", number)])?;
      ctx.fail_result(&nested)
    })
    .build()
    .unwrap();

  let outcome = service.call([("invoice_number", "BB-1")]).unwrap();
  match outcome.error() {
    Some(ServiceError::Failure(failure)) => {
      assert_eq!(failure.service, "Billing");
      assert_eq!(failure.failure_type, DEFAULT_FAILURE_TYPE);
      assert_eq!(failure.message, "bad");
    }
    other => panic!("Expected a failure, got {:?}", other),
  }

  assert!(service.call([("invoice_number", "AA-1")]).unwrap().is_success());
}

#[test]
fn nested_attribute_errors_keep_their_namespace() {
  setup_tracing();
  let inner = doubler();
  let service = ServiceBuilder::new("Outer")
    .make("call_inner", move |ctx| {
      let nested = inner.call(())?;
      ctx.fail_result(&nested)
    })
    .build()
    .unwrap();

  let outcome = service.call(()).unwrap();
  assert!(outcome.is_failure_of("input"));
  assert_eq!(outcome.error().unwrap().message(), "[Doubler] Required input `number` is missing");
}
