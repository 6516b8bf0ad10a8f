// servitor/src/attributes/builder.rs

//! The fixed declaration API for attributes and its resolution into [`AttributeSpec`].

use crate::attributes::kind::AttributeKind;
use crate::attributes::rule::{IntoTypes, Message, MustRule, PrepareFn, Properties, RuleConfig};
use crate::attributes::spec::{AttributeSpec, ResolvedRule};
use crate::config::Configuration;
use crate::error::ServiceError;
use crate::options::{option_key, OptionDeclaration, OptionHelper, RulePhase};
use crate::value::{Value, ValueType};
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

/// Shorthand helpers may expand into further helpers; this bounds the expansion.
const MAX_HELPER_EXPANSIONS: usize = 32;

#[derive(Clone)]
enum DeclaredOption {
  /// Written through a sugar method; the key depends on the namespace.
  Canonical { name: &'static str, config: RuleConfig },
  /// Written through `option(key, ...)`; the key is used as is.
  Keyed { key: String, config: RuleConfig },
  Must(MustRule),
}

impl DeclaredOption {
  fn key(&self, kind: AttributeKind) -> String {
    match self {
      DeclaredOption::Canonical { name, .. } => option_key(kind, name).to_string(),
      DeclaredOption::Keyed { key, .. } => key.clone(),
      DeclaredOption::Must(_) => "must".to_string(),
    }
  }
}

/// Declares one attribute. The namespace is decided by the `ServiceBuilder` method
/// it is passed to (`input`, `internal`, `output`).
#[derive(Clone)]
pub struct AttributeBuilder {
  name: String,
  types: Vec<ValueType>,
  required: Option<bool>,
  required_message: Option<Message>,
  default: Option<Value>,
  prepare: Option<PrepareFn>,
  alias: Option<String>,
  helpers: Vec<String>,
  options: Vec<DeclaredOption>,
}

/// Starts an attribute declaration.
pub fn attr(name: impl Into<String>) -> AttributeBuilder {
  AttributeBuilder::new(name)
}

impl AttributeBuilder {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      types: Vec::new(),
      required: None,
      required_message: None,
      default: None,
      prepare: None,
      alias: None,
      helpers: Vec::new(),
      options: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn types(mut self, types: impl IntoTypes) -> Self {
    self.types = types.into_types();
    self
  }

  /// Inputs are required unless told otherwise; internals and outputs are not.
  pub fn required(mut self, required: bool) -> Self {
    self.required = Some(required);
    self
  }

  pub fn required_message(mut self, message: impl Into<Message>) -> Self {
    self.required = Some(true);
    self.required_message = Some(message.into());
    self
  }

  pub fn optional(self) -> Self {
    self.required(false)
  }

  pub fn default(mut self, value: impl Into<Value>) -> Self {
    self.default = Some(value.into());
    self
  }

  /// Input-only transformer applied after the value validated.
  pub fn prepare(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
    self.prepare = Some(Arc::new(f));
    self
  }

  /// Input-only: exposes the value to steps under `alias`.
  pub fn as_name(mut self, alias: impl Into<String>) -> Self {
    self.alias = Some(alias.into());
    self
  }

  /// Applies a registered shorthand helper, such as `optional`.
  pub fn helper(mut self, name: impl Into<String>) -> Self {
    self.helpers.push(name.into());
    self
  }

  pub fn must(
    self,
    code: impl Into<String>,
    predicate: impl Fn(&Value, &AttributeSpec) -> anyhow::Result<bool> + Send + Sync + 'static,
  ) -> Self {
    self.must_rule(MustRule::new(code, predicate))
  }

  pub fn must_rule(mut self, rule: MustRule) -> Self {
    self.options.push(DeclaredOption::Must(rule));
    self
  }

  pub fn inclusion(self, config: impl Into<RuleConfig>) -> Self {
    self.canonical("inclusion", config.into())
  }

  pub fn format(self, config: impl Into<RuleConfig>) -> Self {
    self.canonical("format", config.into())
  }

  pub fn min(self, config: impl Into<RuleConfig>) -> Self {
    self.canonical("min", config.into())
  }

  pub fn max(self, config: impl Into<RuleConfig>) -> Self {
    self.canonical("max", config.into())
  }

  pub fn multiple_of(self, config: impl Into<RuleConfig>) -> Self {
    self.canonical("multiple_of", config.into())
  }

  pub fn consists_of(self, config: impl Into<RuleConfig>) -> Self {
    self.canonical("consists_of", config.into())
  }

  pub fn schema(self, config: impl Into<RuleConfig>) -> Self {
    self.canonical("schema", config.into())
  }

  pub fn target(self, config: impl Into<RuleConfig>) -> Self {
    self.canonical("target", config.into())
  }

  /// Any registered option by its literal key, e.g. `option("check_format", "uuid")`.
  pub fn option(mut self, key: impl Into<String>, config: impl Into<RuleConfig>) -> Self {
    self.options.push(DeclaredOption::Keyed {
      key: key.into(),
      config: config.into(),
    });
    self
  }

  fn canonical(mut self, name: &'static str, config: RuleConfig) -> Self {
    self.options.push(DeclaredOption::Canonical { name, config });
    self
  }

  /// Normalizes the declaration against the namespace's option helpers.
  pub(crate) fn resolve(
    self,
    kind: AttributeKind,
    service: &str,
    config: &Configuration,
  ) -> Result<AttributeSpec, ServiceError> {
    let registry = config.option_helpers(kind);
    let configuration_error = |message: String| ServiceError::configuration(service, message);

    let builder = self.expand_helpers(kind, service, config)?;
    let AttributeBuilder {
      name,
      types,
      required,
      required_message,
      default,
      prepare,
      alias,
      helpers: _,
      options,
    } = builder;

    if types.is_empty() {
      return Err(configuration_error(format!(
        "[{}] {} `{}` must declare at least one type",
        service,
        kind.title(),
        name
      )));
    }

    if kind != AttributeKind::Input {
      let input_only = [
        ("default", default.is_some()),
        ("prepare", prepare.is_some()),
        ("as", alias.is_some()),
      ];
      if let Some((option, _)) = input_only.iter().find(|(_, present)| *present) {
        return Err(configuration_error(format!(
          "[{}] {} `{}` cannot use the `{}` option; it is only available for inputs",
          service,
          kind.title(),
          name,
          option
        )));
      }
    }

    let required = required.unwrap_or(kind == AttributeKind::Input);
    if kind == AttributeKind::Input && required && default.is_some() {
      return Err(conflict(service, &name, "required_vs_default"));
    }

    let mut spec = AttributeSpec {
      kind,
      name,
      alias,
      types,
      required,
      required_message,
      default,
      prepare,
      rules: Vec::new(),
    };

    let mut rules = Vec::with_capacity(options.len());
    for declared in options {
      let key = declared.key(kind);
      let config_value = match declared {
        DeclaredOption::Must(rule) => {
          rules.push(ResolvedRule {
            option_name: key,
            code: rule.code,
            phase: RulePhase::Must,
            option: None,
            predicate: Some(rule.predicate),
            body: None,
            message: rule.message,
            properties: Properties::new(),
          });
          continue;
        }
        DeclaredOption::Canonical { config, .. } | DeclaredOption::Keyed { config, .. } => config,
      };

      let option = match registry.get(&key) {
        Some(OptionHelper::Dynamic(option)) => option.clone(),
        // Equivalent helpers were expanded already.
        Some(OptionHelper::Equivalent(_)) => continue,
        None => {
          return Err(configuration_error(format!(
            "[{}] Unknown option `{}` for {} `{}`",
            service,
            key,
            kind.label(),
            spec.name
          )))
        }
      };

      let (body, message, properties, predicate) = match config_value {
        RuleConfig::Literal(body) => (Some(body), None, Properties::new(), None),
        RuleConfig::Structured(rule) => (rule.is, rule.message, rule.properties, None),
        RuleConfig::Predicate(predicate) => (None, None, Properties::new(), Some(predicate)),
      };

      if predicate.is_none() {
        let declaration = OptionDeclaration {
          service,
          attribute: &spec,
          option_name: &key,
          body: body.as_ref(),
          properties: &properties,
          collection_mode_types: config.collection_mode_types(),
          hash_mode_types: config.hash_mode_types(),
        };
        option.verify(&declaration).map_err(configuration_error)?;
      }

      rules.push(ResolvedRule {
        option_name: key,
        code: option.code().to_string(),
        phase: option.phase(),
        option: Some(option),
        predicate,
        body,
        message,
        properties,
      });
    }

    // Stable: same-phase rules keep declaration order.
    rules.sort_by_key(|rule| rule.phase);
    spec.rules = rules;

    if kind == AttributeKind::Input {
      check_input_conflicts(&spec, service, config)?;
    }

    event!(Level::TRACE, service, attribute = %spec.name, kind = %kind, options = ?spec.option_names(), "Attribute resolved.");
    Ok(spec)
  }

  /// Runs shorthand helpers and equivalent-helper options until none are left.
  fn expand_helpers(mut self, kind: AttributeKind, service: &str, config: &Configuration) -> Result<Self, ServiceError> {
    let registry = config.option_helpers(kind);

    for _ in 0..MAX_HELPER_EXPANSIONS {
      let helpers = std::mem::take(&mut self.helpers);
      let options = std::mem::take(&mut self.options);
      let mut expanded_any = false;
      let mut remaining = Vec::with_capacity(options.len());

      for helper_name in helpers {
        match registry.get(&helper_name) {
          Some(OptionHelper::Equivalent(expand)) => {
            self = expand(self);
            expanded_any = true;
          }
          Some(OptionHelper::Dynamic(_)) => {
            return Err(ServiceError::configuration(
              service,
              format!(
                "[{}] Option helper `{}` of {} `{}` needs a value; pass it through `option`",
                service,
                helper_name,
                kind.label(),
                self.name
              ),
            ))
          }
          None => {
            return Err(ServiceError::configuration(
              service,
              format!(
                "[{}] Unknown option helper `{}` for {} `{}`",
                service,
                helper_name,
                kind.label(),
                self.name
              ),
            ))
          }
        }
      }

      for declared in options {
        let expand = match (&declared, registry.get(&declared.key(kind))) {
          (DeclaredOption::Must(_), _) => None,
          (_, Some(OptionHelper::Equivalent(expand))) => Some(expand.clone()),
          _ => None,
        };
        match expand {
          Some(expand) => {
            if !is_literal_false(&declared) {
              self = expand(self);
              expanded_any = true;
            }
          }
          None => remaining.push(declared),
        }
      }

      // Expansions may have appended options of their own; they go after the originals.
      remaining.append(&mut self.options);
      self.options = remaining;

      if !expanded_any && self.helpers.is_empty() {
        return Ok(self);
      }
    }

    Err(ServiceError::configuration(
      service,
      format!(
        "[{}] Option helpers of {} `{}` keep expanding into each other",
        service,
        kind.label(),
        self.name
      ),
    ))
  }
}

fn is_literal_false(declared: &DeclaredOption) -> bool {
  match declared {
    DeclaredOption::Canonical { config, .. } | DeclaredOption::Keyed { config, .. } => matches!(
      config,
      RuleConfig::Literal(crate::attributes::rule::OptionBody::Value(Value::Boolean(false)))
    ),
    DeclaredOption::Must(_) => false,
  }
}

fn conflict(service: &str, name: &str, code: &str) -> ServiceError {
  ServiceError::configuration(
    service,
    format!("[{}] Conflict in `{}` input options: `{}`", service, name, code),
  )
}

fn check_input_conflicts(spec: &AttributeSpec, service: &str, config: &Configuration) -> Result<(), ServiceError> {
  let has_inclusion = spec.has_phase(RulePhase::Inclusion);
  let is_collection = spec.types().iter().any(|t| config.collection_mode_types().contains(t));
  let is_hash = spec.types().iter().any(|t| config.hash_mode_types().contains(t));

  let code = if spec.has_prepare() && has_inclusion {
    Some("prepare_vs_inclusion")
  } else if spec.has_prepare() && spec.has_phase(RulePhase::Must) {
    Some("prepare_vs_must")
  } else if is_collection && has_inclusion {
    Some("collection_vs_inclusion")
  } else if is_hash && has_inclusion {
    Some("object_vs_inclusion")
  } else {
    None
  };

  match code {
    Some(code) => Err(conflict(service, spec.name(), code)),
    None => Ok(()),
  }
}

impl fmt::Debug for AttributeBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let keys: Vec<String> = self
      .options
      .iter()
      .map(|o| match o {
        DeclaredOption::Canonical { name, .. } => (*name).to_string(),
        DeclaredOption::Keyed { key, .. } => key.clone(),
        DeclaredOption::Must(rule) => format!("must:{}", rule.code),
      })
      .collect();
    f.debug_struct("AttributeBuilder")
      .field("name", &self.name)
      .field("types", &self.types)
      .field("required", &self.required)
      .field("default", &self.default)
      .field("helpers", &self.helpers)
      .field("options", &keys)
      .finish()
  }
}
