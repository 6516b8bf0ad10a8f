// servitor/examples/basic_service.rs

use servitor::{attr, ServiceBuilder, StepControl, Value, ValueType};
use tracing::info;

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Basic Service Example ---");

  // 1. Declare the service: attributes first, then the steps in run order.
  let build_greeting = ServiceBuilder::new("BuildGreeting")
    .input(attr("first_name").types(ValueType::String))
    .input(attr("middle_name").types(ValueType::String).optional())
    .input(attr("last_name").types(ValueType::String))
    .input(attr("language").types(ValueType::String).optional().default("en"))
    .internal(attr("full_name").types(ValueType::String))
    .output(attr("greeting").types(ValueType::String).required(true))
    .make("assemble_full_name", |ctx| {
      let parts: Vec<String> = ["first_name", "middle_name", "last_name"]
        .iter()
        .filter_map(|name| ctx.input(name).ok())
        .filter(|value| value.is_present())
        .map(ToString::to_string)
        .collect();
      ctx.set_internal("full_name", parts.join(" "))?;
      Ok(StepControl::Continue)
    })
    .make("greet", |ctx| {
      let salutation = match ctx.input("language")?.as_str() {
        Some("de") => "Hallo",
        Some("fr") => "Bonjour",
        _ => "Hello",
      };
      let greeting = format!("{}, {}!", salutation, ctx.internal("full_name")?);
      ctx.set_output("greeting", greeting)?;
      Ok(StepControl::Continue)
    })
    .build()?;

  // 2. Successful call.
  let outcome = build_greeting.call([("first_name", "John"), ("last_name", "Fowler")])?;
  info!(?outcome, "Call with defaults.");
  if let Some(Value::String(greeting)) = outcome.output("greeting") {
    info!("Greeting: {}", greeting);
  }

  // 3. Explicit optional input.
  let outcome = build_greeting.call([
    ("first_name", "Anna"),
    ("middle_name", "Maria"),
    ("last_name", "Schmidt"),
    ("language", "de"),
  ])?;
  info!(greeting = ?outcome.output("greeting"), "Call with all inputs.");

  // 4. Missing required input: the outcome carries the input error.
  build_greeting
    .call([("first_name", "John")])?
    .on_success(|outputs| info!(count = outputs.len(), "Unexpected success."))
    .on_failure_of("input", |error| info!(message = %error.message(), "Input rejected."));

  Ok(())
}
