// servitor/src/options/format.rs

//! `format` (`check_format` on internals): string values checked against a named
//! format from a catalogue.
//!
//! A catalogue entry has an optional regex `pattern` and an optional `validator`;
//! both must accept the value. Either can be overridden per attribute through the
//! structured form, which also allows formats the catalogue does not know.

use super::{blank_allowed, CheckOutcome, DynamicOption, OptionDeclaration, RuleInput};
use crate::attributes::rule::{MessageContext, OptionBody, Properties, Property, ValidatorFn};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
    .expect("uuid pattern compiles")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
  )
  .expect("email pattern compiles")
});

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^P(?:\d+Y)?(?:\d+M)?(?:\d+W)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:[.,]\d+)?S)?)?$")
    .expect("duration pattern compiles")
});

static BOOLEAN_PATTERN: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)^(true|false|0|1)$").expect("boolean pattern compiles"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%Y%m%d", "%d %B %Y", "%B %d, %Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// One named format.
#[derive(Clone, Default)]
pub struct FormatEntry {
  pub pattern: Option<Regex>,
  pub validator: Option<ValidatorFn>,
}

impl FormatEntry {
  pub fn pattern(pattern: Regex) -> Self {
    Self {
      pattern: Some(pattern),
      validator: None,
    }
  }

  pub fn validator(validator: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
    Self {
      pattern: None,
      validator: Some(Arc::new(validator)),
    }
  }

  pub fn with_validator(mut self, validator: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
    self.validator = Some(Arc::new(validator));
    self
  }

  fn accepts(&self, text: &str, value: &Value) -> bool {
    let pattern_ok = self.pattern.as_ref().map_or(true, |p| p.is_match(text));
    pattern_ok && self.validator.as_ref().map_or(true, |v| v(value))
  }

  fn is_usable(&self) -> bool {
    self.pattern.is_some() || self.validator.is_some()
  }
}

impl fmt::Debug for FormatEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FormatEntry")
      .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
      .field("validator_present", &self.validator.is_some())
      .finish()
  }
}

/// The `format` option with its catalogue of known formats.
#[derive(Clone, Debug)]
pub struct Format {
  formats: IndexMap<String, FormatEntry>,
}

impl Default for Format {
  fn default() -> Self {
    let mut formats = IndexMap::new();
    formats.insert("uuid".to_string(), FormatEntry::pattern(UUID_PATTERN.clone()));
    formats.insert("email".to_string(), FormatEntry::pattern(EMAIL_PATTERN.clone()));
    formats.insert("password".to_string(), FormatEntry::validator(|v| v.as_str().map_or(false, is_password)));
    formats.insert(
      "duration".to_string(),
      FormatEntry::pattern(DURATION_PATTERN.clone()).with_validator(|v| v.as_str().map_or(false, is_duration)),
    );
    formats.insert("date".to_string(), FormatEntry::validator(|v| v.as_str().map_or(false, parses_as_date)));
    formats.insert("time".to_string(), FormatEntry::validator(|v| v.as_str().map_or(false, parses_as_time)));
    formats.insert(
      "datetime".to_string(),
      FormatEntry::validator(|v| v.as_str().map_or(false, parses_as_datetime)),
    );
    // The pattern admits every spelling; only the truthy ones pass.
    formats.insert(
      "boolean".to_string(),
      FormatEntry::pattern(BOOLEAN_PATTERN.clone())
        .with_validator(|v| v.as_str().map_or(false, |s| s.eq_ignore_ascii_case("true") || s == "1")),
    );
    Self { formats }
  }
}

impl Format {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds or replaces a catalogue entry.
  pub fn with_format(mut self, name: impl Into<String>, entry: FormatEntry) -> Self {
    self.formats.insert(name.into(), entry);
    self
  }

  pub fn format_names(&self) -> impl Iterator<Item = &str> {
    self.formats.keys().map(String::as_str)
  }

  /// Catalogue entry merged with per-attribute `pattern` / `validator` overrides.
  fn entry_for(&self, name: &str, properties: &Properties) -> FormatEntry {
    let mut entry = self.formats.get(name).cloned().unwrap_or_default();
    if let Some(Property::Pattern(pattern)) = properties.get("pattern") {
      entry.pattern = Some(pattern.clone());
    }
    if let Some(Property::Validator(validator)) = properties.get("validator") {
      entry.validator = Some(validator.clone());
    }
    entry
  }
}

fn format_name(body: Option<&OptionBody>) -> Option<&str> {
  body.and_then(OptionBody::as_value).and_then(Value::as_str)
}

impl DynamicOption for Format {
  fn code(&self) -> &str {
    "be_in_format"
  }

  fn verify(&self, declaration: &OptionDeclaration<'_>) -> Result<(), String> {
    let name = format_name(declaration.body);
    let known = name.map_or(false, |n| self.entry_for(n, declaration.properties).is_usable());
    if known {
      return Ok(());
    }
    Err(format!(
      "[{}] Unknown `{}` format specified for {} `{}`",
      declaration.service,
      name.unwrap_or_default(),
      declaration.kind().label(),
      declaration.attribute.name()
    ))
  }

  fn condition(&self, input: &RuleInput<'_>) -> CheckOutcome {
    if blank_allowed(input.attribute, input.value) {
      return CheckOutcome::Pass;
    }
    let Value::String(text) = input.value else {
      return CheckOutcome::fail_because("wrong_type").with_meta("given_type", input.value.type_name());
    };
    let Some(name) = format_name(input.body) else {
      return CheckOutcome::fail();
    };
    CheckOutcome::from_bool(self.entry_for(name, input.properties).accepts(text, input.value))
  }

  fn message(&self, ctx: &MessageContext<'_>) -> String {
    let format = format_name(ctx.option_value).unwrap_or_default();
    match ctx.reason {
      Some("wrong_type") => format!(
        "[{}] {} `{}` must be a String for `{}` format validation",
        ctx.service,
        ctx.attribute.kind().title(),
        ctx.attribute.name(),
        format
      ),
      _ => format!(
        "[{}] {} `{}` with value `{}` does not match `{}` format",
        ctx.service,
        ctx.attribute.kind().title(),
        ctx.attribute.name(),
        ctx.value,
        format
      ),
    }
  }
}

/// 8 to 16 characters with at least one digit, one lower-case and one upper-case letter.
fn is_password(text: &str) -> bool {
  let length = text.chars().count();
  (8..=16).contains(&length)
    && text.chars().any(|c| c.is_ascii_digit())
    && text.chars().any(|c| c.is_ascii_lowercase())
    && text.chars().any(|c| c.is_ascii_uppercase())
}

/// The pattern admits `P` and `PT` alone; a duration needs at least one component.
fn is_duration(text: &str) -> bool {
  text.len() > 1 && !text.ends_with('T') && text.chars().any(|c| c.is_ascii_digit())
}

fn parses_as_date(text: &str) -> bool {
  let text = text.trim();
  DATE_FORMATS.iter().any(|f| NaiveDate::parse_from_str(text, f).is_ok())
}

fn parses_as_datetime(text: &str) -> bool {
  let text = text.trim();
  DateTime::parse_from_rfc3339(text).is_ok()
    || DateTime::parse_from_rfc2822(text).is_ok()
    || DATETIME_FORMATS.iter().any(|f| NaiveDateTime::parse_from_str(text, f).is_ok())
    || parses_as_date(text)
}

fn parses_as_time(text: &str) -> bool {
  let trimmed = text.trim();
  TIME_FORMATS.iter().any(|f| NaiveTime::parse_from_str(trimmed, f).is_ok()) || parses_as_datetime(trimmed)
}
