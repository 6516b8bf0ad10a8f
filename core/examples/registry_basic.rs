// servitor/examples/registry_basic.rs

use servitor::{attr, RegistryError, ServiceBuilder, ServiceRegistry, StepControl, Value, ValueType};
use std::sync::Arc;
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();
  info!("--- Service Registry Example ---");

  let registry = Arc::new(ServiceRegistry::new());

  let slugify = ServiceBuilder::new("Slugify")
    .input(attr("title").types(ValueType::String).prepare(|v| v.to_string().trim().to_lowercase().into()))
    .output(attr("slug").types(ValueType::String).required(true))
    .make("slugify", |ctx| {
      let slug = ctx.input("title")?.to_string().split_whitespace().collect::<Vec<_>>().join("-");
      ctx.set_output("slug", slug)?;
      Ok(StepControl::Continue)
    })
    .build()?;

  let word_count = ServiceBuilder::new("WordCount")
    .input(attr("text").types(ValueType::String))
    .output(attr("words").types(ValueType::Integer).min(0))
    .make("count", |ctx| {
      let words = ctx.input("text")?.to_string().split_whitespace().count();
      ctx.set_output("words", Value::try_from(words)?)?;
      Ok(StepControl::Continue)
    })
    .build()?;

  registry.register(slugify)?;
  registry.register_as("text.words", word_count)?;
  registry.finalize();
  info!(services = ?registry.names(), "Registry ready.");

  let outcome = registry.call("Slugify", [("title", "  Hello Service Objects ")])?;
  info!(slug = ?outcome.output("slug"), "Slugified.");

  let worker = {
    let registry = Arc::clone(&registry);
    std::thread::spawn(move || registry.call("text.words", [("text", "one two three")]))
  };
  match worker.join() {
    Ok(Ok(outcome)) => info!(words = ?outcome.output("words"), "Counted on another thread."),
    Ok(Err(e)) => warn!(%e, "Worker call failed."),
    Err(_) => warn!("Worker thread panicked."),
  }

  match registry.call("Translate", ()) {
    Err(RegistryError::NotFound { name }) => warn!(%name, "No such service."),
    other => info!(?other, "Unexpected result."),
  }

  let late = ServiceBuilder::new("Late").build()?;
  if let Err(e) = registry.register(late) {
    warn!(%e, "Late registration rejected.");
  }

  Ok(())
}
