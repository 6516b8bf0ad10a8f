// servitor/src/error.rs

//! Error taxonomy for service definitions and calls.
//!
//! Attribute errors (`Input`, `Internal`, `Output`) and business `Failure`s are the
//! framework's own kinds: `Service::call` turns them into a failed outcome. A
//! `Configuration` error means the service definition itself is broken and is always
//! returned as `Err`. `Unhandled` wraps foreign errors that no `fail_on` mapping matched.

use crate::value::{Meta, Value};
use anyhow::Error as AnyhowError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure type used when a step does not name one.
pub const DEFAULT_FAILURE_TYPE: &str = "base";

/// A business-level failure raised by a step via `Context::fail` and friends.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
  /// Name of the service that raised the failure. Filled in by the context when empty.
  pub service: String,
  pub failure_type: String,
  pub message: String,
  pub meta: Meta,
}

impl Failure {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      service: String::new(),
      failure_type: DEFAULT_FAILURE_TYPE.to_string(),
      message: message.into(),
      meta: Meta::new(),
    }
  }

  pub fn of_type(mut self, failure_type: impl Into<String>) -> Self {
    self.failure_type = failure_type.into();
    self
  }

  pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.meta.insert(key.into(), value.into());
    self
  }

  pub fn with_meta_map(mut self, meta: Meta) -> Self {
    self.meta.extend(meta);
    self
  }

  pub(crate) fn owned_by(mut self, service: &str) -> Self {
    if self.service.is_empty() {
      self.service = service.to_string();
    }
    self
  }
}

impl fmt::Display for Failure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

impl std::error::Error for Failure {}

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
  #[error("{message}")]
  Input {
    service: String,
    input_name: Option<String>,
    message: String,
    meta: Meta,
  },

  #[error("{message}")]
  Internal {
    service: String,
    internal_name: Option<String>,
    message: String,
    meta: Meta,
  },

  #[error("{message}")]
  Output {
    service: String,
    output_name: Option<String>,
    message: String,
    meta: Meta,
  },

  #[error("{0}")]
  Failure(Failure),

  #[error("{message}")]
  Configuration { service: String, message: String },

  // Not a `#[source]`: anyhow::Error does not implement std::error::Error.
  #[error("[{service}] {error}")]
  Unhandled { service: String, error: Arc<AnyhowError> },
}

impl ServiceError {
  pub fn configuration(service: &str, message: impl Into<String>) -> Self {
    ServiceError::Configuration {
      service: service.to_string(),
      message: message.into(),
    }
  }

  pub fn service(&self) -> &str {
    match self {
      ServiceError::Input { service, .. }
      | ServiceError::Internal { service, .. }
      | ServiceError::Output { service, .. }
      | ServiceError::Configuration { service, .. }
      | ServiceError::Unhandled { service, .. } => service,
      ServiceError::Failure(failure) => &failure.service,
    }
  }

  pub fn message(&self) -> String {
    match self {
      ServiceError::Input { message, .. }
      | ServiceError::Internal { message, .. }
      | ServiceError::Output { message, .. }
      | ServiceError::Configuration { message, .. } => message.clone(),
      ServiceError::Failure(failure) => failure.message.clone(),
      ServiceError::Unhandled { error, .. } => error.to_string(),
    }
  }

  pub fn meta(&self) -> Option<&Meta> {
    match self {
      ServiceError::Input { meta, .. } | ServiceError::Internal { meta, .. } | ServiceError::Output { meta, .. } => {
        Some(meta)
      }
      ServiceError::Failure(failure) => Some(&failure.meta),
      _ => None,
    }
  }

  /// Type tag used by `ServiceOutcome::is_failure_of`.
  ///
  /// Attribute errors report their namespace; failures report their own type.
  pub fn failure_type(&self) -> &str {
    match self {
      ServiceError::Input { .. } => "input",
      ServiceError::Internal { .. } => "internal",
      ServiceError::Output { .. } => "output",
      ServiceError::Failure(failure) => &failure.failure_type,
      ServiceError::Configuration { .. } => "configuration",
      ServiceError::Unhandled { .. } => "unhandled",
    }
  }

  /// Name of the attribute an attribute error is about, if any.
  pub fn attribute_name(&self) -> Option<&str> {
    match self {
      ServiceError::Input { input_name: name, .. }
      | ServiceError::Internal { internal_name: name, .. }
      | ServiceError::Output { output_name: name, .. } => name.as_deref(),
      _ => None,
    }
  }

  pub fn as_failure(&self) -> Option<&Failure> {
    match self {
      ServiceError::Failure(failure) => Some(failure),
      _ => None,
    }
  }

  pub fn unhandled_error(&self) -> Option<&AnyhowError> {
    match self {
      ServiceError::Unhandled { error, .. } => Some(error.as_ref()),
      _ => None,
    }
  }

  /// True for the kinds `Service::call` folds into a failed outcome.
  pub fn is_recoverable(&self) -> bool {
    !matches!(self, ServiceError::Configuration { .. } | ServiceError::Unhandled { .. })
  }

  /// Pulls a framework error back out of an `anyhow::Error` returned by a step.
  ///
  /// Returns the original error untouched when it is foreign.
  pub(crate) fn recover(err: AnyhowError) -> Result<ServiceError, AnyhowError> {
    match err.downcast::<ServiceError>() {
      Ok(service_err) => Ok(service_err),
      Err(err) => err.downcast::<Failure>().map(ServiceError::Failure),
    }
  }
}

impl From<Failure> for ServiceError {
  fn from(failure: Failure) -> Self {
    ServiceError::Failure(failure)
  }
}

pub type ServiceResult<T, E = ServiceError> = std::result::Result<T, E>;

/// Errors raised by `ServiceRegistry`.
#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("Service `{name}` is already registered")]
  AlreadyRegistered { name: String },

  #[error("Service registry is finalized; cannot register `{name}`")]
  Finalized { name: String },

  #[error("Service not found: {name}")]
  NotFound { name: String },

  #[error(transparent)]
  Service(#[from] ServiceError),
}
