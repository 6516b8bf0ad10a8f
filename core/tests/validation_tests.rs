// tests/validation_tests.rs
mod common;
use common::*;
use regex::Regex;
use servitor::{
  attr, Message, MustRule, Schema, SchemaField, Service, ServiceBuilder, ServiceOutcome, StepControl, StructuredRule,
  Value, ValueType,
};

/// Builds a service with one input `name` that copies it to an `Any` output.
fn echo(service: &str, input: servitor::AttributeBuilder) -> Service {
  let name = input.name().to_string();
  let read_as = name.clone();
  ServiceBuilder::new(service)
    .input(input)
    .output(attr("echo").types(ValueType::Any))
    .make("copy", move |ctx| {
      let value = ctx.input(&read_as)?.clone();
      ctx.set_output("echo", value)?;
      Ok(StepControl::Continue)
    })
    .build()
    .unwrap_or_else(|e| panic!("{} should build: {}", name, e))
}

fn message_of(outcome: &ServiceOutcome) -> String {
  outcome.error().map(|e| e.message()).unwrap_or_default()
}

#[test]
fn missing_required_input_names_the_attribute() {
  setup_tracing();
  let outcome = doubler().call(()).unwrap();
  assert!(outcome.is_failure_of("input"));
  assert_eq!(message_of(&outcome), "[Doubler] Required input `number` is missing");
  assert_eq!(outcome.error().unwrap().attribute_name(), Some("number"));
}

#[test]
fn blank_string_counts_as_missing() {
  setup_tracing();
  let service = echo("Greeter", attr("name").types(ValueType::String));
  let outcome = service.call([("name", "")]).unwrap();
  assert_eq!(message_of(&outcome), "[Greeter] Required input `name` is missing");
}

#[test]
fn custom_required_message_is_used() {
  setup_tracing();
  let service = echo(
    "Greeter",
    attr("name")
      .types(ValueType::String)
      .required_message(Message::dynamic(|ctx| format!("Please provide `{}`", ctx.attribute.name()))),
  );
  let outcome = service.call(()).unwrap();
  assert_eq!(message_of(&outcome), "Please provide `name`");
}

#[test]
fn optional_input_default_is_visible_to_steps() {
  setup_tracing();
  let service = echo("Localized", attr("locale").types(ValueType::String).optional().default("en"));

  let omitted = service.call(()).unwrap();
  assert_eq!(omitted.output("echo"), Some(&Value::from("en")));

  let blank = service.call([("locale", "")]).unwrap();
  assert_eq!(blank.output("echo"), Some(&Value::from("en")));

  let given = service.call([("locale", "de")]).unwrap();
  assert_eq!(given.output("echo"), Some(&Value::from("de")));
}

#[test]
fn absent_optional_input_skips_all_checks() {
  setup_tracing();
  let service = echo(
    "OptionalEmail",
    attr("email").types(ValueType::String).optional().format("email"),
  );
  let outcome = service.call(()).unwrap();
  assert!(outcome.is_success());
  assert_eq!(outcome.output("email"), None);
  assert_eq!(outcome.output("echo"), Some(&Value::Nil));
}

#[test]
fn any_listed_type_passes_and_others_list_expected_types() {
  setup_tracing();
  let service = echo("Pricing", attr("amount").types([ValueType::Integer, ValueType::Float]));

  assert!(service.call([("amount", 5)]).unwrap().is_success());
  assert!(service.call([("amount", 5.5)]).unwrap().is_success());

  let outcome = service.call([("amount", "five")]).unwrap();
  assert_eq!(
    message_of(&outcome),
    "[Pricing] Wrong type of input `amount`, expected `Integer, Float`, got `String`"
  );
  let meta = outcome.error().unwrap().meta().unwrap();
  assert_eq!(meta.get("expected_type"), Some(&Value::from("Integer, Float")));
  assert_eq!(meta.get("given_type"), Some(&Value::from("String")));
}

#[test]
fn must_rule_default_message_shows_the_value() {
  setup_tracing();
  let service = echo(
    "Codes",
    attr("code")
      .types(ValueType::String)
      .must("be_uppercase", |value, _| Ok(value.as_str().map_or(false, |s| s == s.to_uppercase()))),
  );
  assert!(service.call([("code", "ABC")]).unwrap().is_success());

  let outcome = service.call([("code", "abc")]).unwrap();
  assert_eq!(message_of(&outcome), "[Codes] Input `code` must \"be_uppercase\", got `\"abc\"`");
}

#[test]
fn must_rule_custom_message() {
  setup_tracing();
  let service = echo(
    "Codes",
    attr("code").types(ValueType::String).must_rule(
      MustRule::new("be_short", |value, _| Ok(value.size().unwrap_or(0) <= 3))
        .message(Message::dynamic(|ctx| format!("`{}` is too long: {}", ctx.attribute.name(), ctx.value))),
    ),
  );
  let outcome = service.call([("code", "ABCDE")]).unwrap();
  assert_eq!(message_of(&outcome), "`code` is too long: ABCDE");
}

#[test]
fn raising_predicate_becomes_syntax_error() {
  setup_tracing();
  let service = echo(
    "Fragile",
    attr("n").types(ValueType::Integer).must("be_checked", |_, _| Err(anyhow::anyhow!("boom"))),
  );
  let outcome = service.call([("n", 1)]).unwrap();
  assert!(outcome.is_failure_of("input"));
  assert_eq!(message_of(&outcome), "[Fragile] Syntax error inside `be_checked` of `n` input: boom");
  assert_eq!(
    outcome.error().unwrap().meta().and_then(|m| m.get("original_exception")),
    Some(&Value::from("boom"))
  );
}

#[test]
fn format_checks_strings_and_rejects_other_types() {
  setup_tracing();
  let service = echo("Signup", attr("email").types([ValueType::String, ValueType::Integer]).format("email"));

  assert!(service.call([("email", "ann@example.com")]).unwrap().is_success());

  let mismatch = service.call([("email", "ann")]).unwrap();
  assert_eq!(
    message_of(&mismatch),
    "[Signup] Input `email` with value `ann` does not match `email` format"
  );

  let wrong_type = service.call([("email", 42)]).unwrap();
  assert_eq!(
    message_of(&wrong_type),
    "[Signup] Input `email` must be a String for `email` format validation"
  );
}

#[test]
fn format_catalogue_entries() {
  setup_tracing();
  let check = |format: &str, value: &str| {
    echo("Formats", attr("value").types(ValueType::String).format(format))
      .call([("value", value)])
      .unwrap()
      .is_success()
  };

  assert!(check("uuid", "018f4c5e-9a7b-7c1d-8e2f-3a4b5c6d7e8f"));
  assert!(!check("uuid", "not-a-uuid"));
  assert!(check("date", "2024-02-29"));
  assert!(!check("date", "2023-02-29"));
  assert!(check("time", "12:30"));
  assert!(check("datetime", "2024-01-15T12:30:00"));
  assert!(check("duration", "P1DT2H"));
  assert!(!check("duration", "PT"));
  assert!(check("password", "Secret123"));
  assert!(!check("password", "secret"));
  assert!(check("boolean", "TRUE"));
  assert!(check("boolean", "1"));
  assert!(!check("boolean", "false"));
  assert!(!check("boolean", "0"));
  assert!(!check("boolean", "off"));
}

#[test]
fn format_pattern_can_be_overridden_per_attribute() {
  setup_tracing();
  let pattern = Regex::new(r"^[A-Z]{3}$").unwrap();
  let service = echo(
    "Currency",
    attr("currency")
      .types(ValueType::String)
      .format(StructuredRule::new().is("iso_code").pattern(pattern).message("Not an ISO code")),
  );
  assert!(service.call([("currency", "EUR")]).unwrap().is_success());
  assert_eq!(message_of(&service.call([("currency", "euro")]).unwrap()), "Not an ISO code");
}

#[test]
fn min_and_max_compare_numbers_by_value_and_collections_by_size() {
  setup_tracing();
  let numbers = echo("Bounds", attr("n").types(ValueType::Integer).min(1).max(10));
  assert!(numbers.call([("n", 10)]).unwrap().is_success());
  assert_eq!(
    message_of(&numbers.call([("n", 11)]).unwrap()),
    "[Bounds] Input `n` received value `11`, which is greater than `10`"
  );
  assert_eq!(
    message_of(&numbers.call([("n", 0)]).unwrap()),
    "[Bounds] Input `n` received value `0`, which is less than `1`"
  );

  let strings = echo("Bounds", attr("nickname").types(ValueType::String).min(3));
  assert_eq!(
    message_of(&strings.call([("nickname", "ab")]).unwrap()),
    "[Bounds] Input `nickname` received value `\"ab\"`, which is less than `3`"
  );
}

#[test]
fn multiple_of_checks_integers_and_floats() {
  setup_tracing();
  let service = echo("Packs", attr("quantity").types(ValueType::Numeric).multiple_of(5));
  assert!(service.call([("quantity", 15)]).unwrap().is_success());
  assert!(service.call([("quantity", 7.5)]).unwrap().is_failure());
  assert_eq!(
    message_of(&service.call([("quantity", 12)]).unwrap()),
    "[Packs] Input `quantity` has the value `12`, which is not a multiple of `5`"
  );

  let halves = echo("Halves", attr("step").types(ValueType::Float).multiple_of(0.5));
  assert!(halves.call([("step", 2.5)]).unwrap().is_success());
}

#[test]
fn inclusion_accepts_lists_and_ranges() {
  setup_tracing();
  let levels = echo("Levels", attr("level").types(ValueType::String).inclusion(vec!["low", "high"]));
  assert!(levels.call([("level", "high")]).unwrap().is_success());
  assert_eq!(
    message_of(&levels.call([("level", "mid")]).unwrap()),
    "[Levels] Wrong value in `level`, must be one of `[\"low\", \"high\"]`, got `\"mid\"`"
  );

  let ratings = echo("Ratings", attr("stars").types(ValueType::Integer).inclusion(1..=5));
  assert!(ratings.call([("stars", 5)]).unwrap().is_success());
  assert!(ratings.call([("stars", 6)]).unwrap().is_failure());
}

#[test]
fn inclusion_runs_before_must_rules() {
  setup_tracing();
  let service = echo(
    "Ordered",
    attr("level")
      .types(ValueType::String)
      .must("be_long", |value, _| Ok(value.size().unwrap_or(0) > 10))
      .inclusion(vec!["low", "high"]),
  );
  let outcome = service.call([("level", "mid")]).unwrap();
  assert!(message_of(&outcome).starts_with("[Ordered] Wrong value in `level`"));
}

#[test]
fn target_checks_the_value_against_allowed_targets() {
  setup_tracing();
  let service = echo(
    "Dispatch",
    attr("handler").types(ValueType::Symbol).target(vec![Value::symbol("email"), Value::symbol("sms")]),
  );
  assert!(service.call([("handler", Value::symbol("sms"))]).unwrap().is_success());
  assert_eq!(
    message_of(&service.call([("handler", Value::symbol("fax"))]).unwrap()),
    "[Dispatch] Input `handler` has wrong target, expected `[:email, :sms]`, got `:fax`"
  );
}

#[test]
fn consists_of_reports_missing_and_mistyped_elements() {
  setup_tracing();
  let service = echo(
    "Tags",
    attr("tags").types(ValueType::Array).consists_of(ValueType::String),
  );
  assert!(service.call([("tags", Value::array(["a", "b"]))]).unwrap().is_success());
  assert!(service
    .call([("tags", Value::array([Value::array(["a"]), Value::from("b")]))])
    .unwrap()
    .is_success());

  let blank = service.call([("tags", Value::array(["a", ""]))]).unwrap();
  assert_eq!(message_of(&blank), "[Tags] Required element in input collection `tags` is missing");

  let mixed = service
    .call([("tags", Value::array([Value::from("a"), Value::from(1)]))])
    .unwrap();
  assert_eq!(
    message_of(&mixed),
    "[Tags] Wrong element type in input collection `tags`, expected `String`, got `Integer`"
  );
  let meta = mixed.error().unwrap().meta().unwrap();
  assert_eq!(meta.get("index"), Some(&Value::from(1)));
}

#[test]
fn schema_checks_keys_and_applies_defaults() {
  setup_tracing();
  let schema = Schema::new()
    .field("name", SchemaField::new(ValueType::String))
    .field("age", SchemaField::new(ValueType::Integer).optional().default(18))
    .field(
      "address",
      SchemaField::nested(Schema::new().field("city", SchemaField::new(ValueType::String))),
    );
  let service = echo("Profiles", attr("user").types(ValueType::Hash).schema(schema));

  let valid = Value::hash([
    ("name", Value::from("Ann")),
    ("address", Value::hash([("city", "Oslo")])),
  ]);
  let outcome = service.call([("user", valid)]).unwrap();
  assert!(outcome.is_success());
  let echoed = outcome.output("echo").unwrap();
  assert_eq!(echoed.get("age"), Some(&Value::from(18)));

  let wrong = Value::hash([("name", Value::from(5)), ("address", Value::hash([("city", "Oslo")]))]);
  let outcome = service.call([("user", wrong)]).unwrap();
  assert_eq!(
    message_of(&outcome),
    "[Profiles] Wrong type in input hash `user`, expected `String` for `name`, got `Integer`"
  );

  let nested = Value::hash([("name", Value::from("Ann")), ("address", Value::hash([("city", 1)]))]);
  let outcome = service.call([("user", nested)]).unwrap();
  let meta = outcome.error().unwrap().meta().unwrap();
  assert_eq!(meta.get("key_path"), Some(&Value::from("address.city")));
}

#[test]
fn prepare_and_alias_shape_what_steps_see() {
  setup_tracing();
  let service = ServiceBuilder::new("Balance")
    .input(
      attr("balance")
        .types(ValueType::Integer)
        .prepare(|value| Value::from(value.as_i64().unwrap_or_default() * 100))
        .as_name("balance_cents"),
    )
    .output(attr("cents").types(ValueType::Integer))
    .make("copy", |ctx| {
      let cents = ctx.input("balance_cents")?.clone();
      ctx.set_output("cents", cents)?;
      Ok(StepControl::Continue)
    })
    .build()
    .unwrap();

  let outcome = service.call([("balance", 12)]).unwrap();
  assert_eq!(outcome.output("cents"), Some(&Value::Integer(1200)));
}

#[test]
fn rule_predicate_replaces_an_options_condition() {
  setup_tracing();
  let service = echo(
    "Custom",
    attr("n")
      .types(ValueType::Integer)
      .min(servitor::RuleConfig::predicate(|value, _| Ok(value.as_i64() == Some(42)))),
  );
  assert!(service.call([("n", 42)]).unwrap().is_success());
  assert!(service.call([("n", 43)]).unwrap().is_failure());
}

#[test]
fn output_allows_nil_when_declared() {
  setup_tracing();
  let service = ServiceBuilder::new("Nullable")
    .output(attr("note").types([ValueType::String, ValueType::Nil]).format("email"))
    .make("clear", |ctx| {
      ctx.set_output("note", Value::Nil)?;
      Ok(StepControl::Continue)
    })
    .build()
    .unwrap();
  assert!(service.call(()).unwrap().is_success());
}

#[test]
fn wide_unsigned_integers_convert_only_when_they_fit() {
  setup_tracing();
  assert_eq!(Value::try_from(42usize), Ok(Value::Integer(42)));
  assert_eq!(Value::try_from(i64::MAX as u64), Ok(Value::Integer(i64::MAX)));
  assert!(Value::try_from(u64::MAX).is_err());
  assert!(Value::try_from(i64::MAX as u64 + 1).is_err());
  assert_eq!(Value::from(u32::MAX), Value::Integer(4_294_967_295));
  assert_eq!(Value::count(3), Value::Integer(3));

  let service = ServiceBuilder::new("Counted")
    .output(attr("total").types(ValueType::Integer).min(0))
    .make("assign", |ctx| {
      ctx.set_output("total", Value::try_from(7u64)?)?;
      Ok(StepControl::Continue)
    })
    .build()
    .unwrap();
  assert_eq!(service.call(()).unwrap().output("total"), Some(&Value::Integer(7)));
}
