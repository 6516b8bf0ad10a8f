// servitor/src/registry.rs

//! Defines `ServiceRegistry`, a name-keyed store of built services that can be
//! shared across threads and called by name.

use crate::error::RegistryError;
use crate::outcome::ServiceOutcome;
use crate::service::{Arguments, Service};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{event, instrument, Level};

#[derive(Default)]
pub struct ServiceRegistry {
  services: RwLock<HashMap<String, Service>>,
  finalized: RwLock<bool>,
}

impl ServiceRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `service` under its own name.
  pub fn register(&self, service: Service) -> Result<(), RegistryError> {
    let name = service.name().to_string();
    self.register_as(name, service)
  }

  /// Registers `service` under an explicit key.
  pub fn register_as(&self, name: impl Into<String>, service: Service) -> Result<(), RegistryError> {
    let name = name.into();
    if *self.finalized.read() {
      event!(Level::WARN, %name, "Registration rejected: registry is finalized.");
      return Err(RegistryError::Finalized { name });
    }
    let mut services = self.services.write();
    if services.contains_key(&name) {
      return Err(RegistryError::AlreadyRegistered { name });
    }
    event!(Level::DEBUG, %name, service = %service.name(), "Registering service.");
    services.insert(name, service);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<Service> {
    self.services.read().get(name).cloned()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.services.read().contains_key(name)
  }

  /// Looks up and calls a service. Failures the service folds into its outcome
  /// come back as `Ok`.
  #[instrument(name = "ServiceRegistry::call", skip(self, arguments), err(Display))]
  pub fn call(&self, name: &str, arguments: impl Into<Arguments>) -> Result<ServiceOutcome, RegistryError> {
    // Clone out of the lock so a long call never blocks registration reads.
    let service = self.get(name).ok_or_else(|| {
      event!(Level::ERROR, "No service registered under this name.");
      RegistryError::NotFound { name: name.to_string() }
    })?;
    Ok(service.call(arguments)?)
  }

  /// Freezes the registry; later registrations fail.
  pub fn finalize(&self) {
    *self.finalized.write() = true;
  }

  pub fn is_finalized(&self) -> bool {
    *self.finalized.read()
  }

  /// Registered names, sorted.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.services.read().keys().cloned().collect();
    names.sort();
    names
  }

  pub fn len(&self) -> usize {
    self.services.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.services.read().is_empty()
  }
}

impl std::fmt::Debug for ServiceRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ServiceRegistry")
      .field("services", &self.names())
      .field("finalized", &self.is_finalized())
      .finish()
  }
}
