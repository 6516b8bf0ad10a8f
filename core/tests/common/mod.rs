// tests/common/mod.rs
#![allow(dead_code)] // Not every test file uses every helper.

use once_cell::sync::Lazy;
use servitor::{attr, Service, ServiceBuilder, StepControl, ValueType};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Mutex,
};
use tracing::Level;

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Payment gateway refused: {0}")]
  Gateway(String),

  #[error("Storage unavailable")]
  Storage,
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// Records which steps ran, in order.
#[derive(Clone, Default)]
pub struct Trail(Arc<Mutex<Vec<String>>>);

impl Trail {
  pub fn push(&self, entry: impl Into<String>) {
    if let Ok(mut guard) = self.0.lock() {
      guard.push(entry.into());
    }
  }

  pub fn entries(&self) -> Vec<String> {
    self.0.lock().map(|g| g.clone()).unwrap_or_default()
  }
}

pub fn counter() -> Arc<AtomicUsize> {
  Arc::new(AtomicUsize::new(0))
}

pub fn count(counter: &AtomicUsize) -> usize {
  counter.load(Ordering::SeqCst)
}

// --- Sample services ---

/// `number: Integer` in, `number * 2` out.
pub fn doubler() -> Service {
  ServiceBuilder::new("Doubler")
    .input(attr("number").types(ValueType::Integer))
    .output(attr("number").types(ValueType::Integer))
    .make("double", |ctx| {
      let number = ctx.input("number")?.as_i64().unwrap_or_default();
      ctx.set_output("number", number * 2)?;
      Ok(StepControl::Continue)
    })
    .build()
    .expect("doubler builds")
}

/// Fails with a base failure unless the invoice number starts with `AA`.
pub fn invoice_checker() -> Service {
  ServiceBuilder::new("InvoiceChecker")
    .input(attr("invoice_number").types(ValueType::String))
    .output(attr("invoice_number").types(ValueType::String))
    .make("check_prefix", |ctx| {
      let number = ctx.input("invoice_number")?.as_str().unwrap_or_default().to_string();
      if !number.starts_with("AA") {
        return ctx.fail(servitor::Failure::new("bad"));
      }
      ctx.set_output("invoice_number", number)?;
      Ok(StepControl::Continue)
    })
    .build()
    .expect("invoice checker builds")
}
