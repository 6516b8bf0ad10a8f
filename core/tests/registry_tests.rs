// tests/registry_tests.rs
mod common;
use common::*;
use servitor::{RegistryError, ServiceError, ServiceRegistry, Value};
use std::sync::Arc;
use std::thread;

#[test]
fn registers_and_calls_services_by_name() {
  setup_tracing();
  let registry = ServiceRegistry::new();
  registry.register(doubler()).unwrap();
  registry.register_as("checker", invoice_checker()).unwrap();

  assert_eq!(registry.len(), 2);
  assert_eq!(registry.names(), vec!["Doubler", "checker"]);
  assert!(registry.contains("checker"));
  assert!(!registry.contains("InvoiceChecker"));

  let outcome = registry.call("Doubler", [("number", 21)]).unwrap();
  assert_eq!(outcome.output("number"), Some(&Value::from(42)));

  let failed = registry.call("checker", [("invoice_number", "BB-1")]).unwrap();
  assert!(failed.is_failure());
}

#[test]
fn unknown_name_is_not_found() {
  setup_tracing();
  let registry = ServiceRegistry::new();
  match registry.call("Missing", ()) {
    Err(RegistryError::NotFound { name }) => assert_eq!(name, "Missing"),
    other => panic!("Expected NotFound, got {:?}", other),
  }
}

#[test]
fn duplicate_registration_is_rejected() {
  setup_tracing();
  let registry = ServiceRegistry::new();
  registry.register(doubler()).unwrap();
  match registry.register(doubler()) {
    Err(RegistryError::AlreadyRegistered { name }) => assert_eq!(name, "Doubler"),
    other => panic!("Expected AlreadyRegistered, got {:?}", other),
  }
}

#[test]
fn finalized_registry_rejects_new_services() {
  setup_tracing();
  let registry = ServiceRegistry::new();
  registry.register(doubler()).unwrap();
  registry.finalize();
  assert!(registry.is_finalized());

  let err = registry.register(invoice_checker()).unwrap_err();
  assert_eq!(
    err.to_string(),
    "Service registry is finalized; cannot register `InvoiceChecker`"
  );
  assert!(registry.call("Doubler", [("number", 1)]).is_ok());
}

#[test]
fn unhandled_errors_surface_as_service_errors() {
  setup_tracing();
  let registry = ServiceRegistry::new();
  let fragile = servitor::ServiceBuilder::new("Fragile")
    .make("explode", |_| Err(TestError::Storage.into()))
    .build()
    .unwrap();
  registry.register(fragile).unwrap();

  match registry.call("Fragile", ()) {
    Err(RegistryError::Service(ServiceError::Unhandled { service, .. })) => assert_eq!(service, "Fragile"),
    other => panic!("Expected an unhandled service error, got {:?}", other),
  }
}

#[test]
fn registry_is_shared_across_threads() {
  setup_tracing();
  let registry = Arc::new(ServiceRegistry::new());
  registry.register(doubler()).unwrap();

  let handles: Vec<_> = (0..4)
    .map(|n| {
      let registry = Arc::clone(&registry);
      thread::spawn(move || {
        registry
          .call("Doubler", [("number", n)])
          .unwrap()
          .output("number")
          .and_then(Value::as_i64)
      })
    })
    .collect();

  let mut results: Vec<i64> = handles.into_iter().filter_map(|h| h.join().unwrap()).collect();
  results.sort();
  assert_eq!(results, vec![0, 2, 4, 6]);
}
