// servitor/examples/validation_rules.rs

use servitor::{attr, Message, Schema, SchemaField, ServiceBuilder, StepControl, ValidationMode, Value, ValueType};
use tracing::{info, warn};

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Validation Rules Example ---");

  let address = Schema::new()
    .field("street", SchemaField::new(ValueType::String))
    .field("city", SchemaField::new(ValueType::String))
    .field("country", SchemaField::new(ValueType::String).optional().default("NO"));

  let register_user = ServiceBuilder::new("RegisterUser")
    .configure(|config| {
      config.set_validation_mode(ValidationMode::AllErrors);
    })
    .input(attr("email").types(ValueType::String).format("email"))
    .input(attr("password").types(ValueType::String).format("password"))
    .input(
      attr("age")
        .types(ValueType::Integer)
        .min(18)
        .max(130),
    )
    .input(
      attr("plan")
        .types(ValueType::String)
        .inclusion(vec!["free", "pro", "team"])
        .optional()
        .default("free"),
    )
    .input(attr("interests").types(ValueType::Array).consists_of(ValueType::String))
    .input(attr("address").types(ValueType::Hash).schema(address))
    .input(
      attr("invite_code")
        .types(ValueType::String)
        .must("be_known_code", |value, _| Ok(value.as_str().map_or(false, |c| c.starts_with("INV-"))))
        .optional(),
    )
    .input(
      attr("nickname")
        .types(ValueType::String)
        .required_message(Message::dynamic(|ctx| format!("Pick a `{}` first", ctx.attribute.name()))),
    )
    .output(attr("summary").types(ValueType::Hash))
    .make("summarize", |ctx| {
      let summary = Value::hash([
        ("email", ctx.input("email")?.clone()),
        ("plan", ctx.input("plan")?.clone()),
        ("country", ctx.input("address")?.get("country").cloned().unwrap_or_default()),
      ]);
      ctx.set_output("summary", summary)?;
      Ok(StepControl::Continue)
    })
    .build()?;

  let valid = register_user.call([
    ("email", Value::from("ann@example.com")),
    ("password", Value::from("Secret123")),
    ("age", Value::from(34)),
    ("interests", Value::array(["rust", "hiking"])),
    ("address", Value::hash([("street", "Main St 1"), ("city", "Oslo")])),
    ("nickname", Value::from("ann")),
  ])?;
  info!(summary = ?valid.output("summary"), "Registered.");

  let invalid = register_user.call([
    ("email", Value::from("not-an-email")),
    ("password", Value::from("short")),
    ("age", Value::from(12)),
    ("plan", Value::from("enterprise")),
    ("interests", Value::array([Value::from("rust"), Value::from(7)])),
    ("address", Value::hash([("street", Value::from("Main St 1")), ("city", Value::from(42))])),
    ("invite_code", Value::from("FREE")),
  ])?;

  if let Some(errors) = invalid.error().and_then(|e| e.meta()).and_then(|m| m.get("errors")) {
    for message in errors.as_slice().unwrap_or_default() {
      warn!("{}", message);
    }
  }

  Ok(())
}
