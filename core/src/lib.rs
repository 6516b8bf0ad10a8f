// servitor/src/lib.rs

//! Servitor: a declarative service-object framework for Rust.
//!
//! A service declares typed attributes and an ordered list of steps, then runs
//! them per call and hands back a structured success or failure:
//!  - Inputs, internals and outputs with type lists and composable rules
//!    (`inclusion`, `must`, `format`, `min`/`max`, `multiple_of`, `consists_of`,
//!    `schema`, `target`), checked at binding or at assignment time.
//!  - Pluggable option helpers per namespace, configured globally or per service.
//!  - Steps grouped in stages with conditions, wrappers and rollbacks.
//!  - Early success, business failures and `fail_on` mappings for foreign errors.
//!  - Call hooks, prioritised after-success actions and a name-keyed registry.
//!
//! ```ignore
//! use servitor::{attr, ServiceBuilder, ValueType};
//!
//! let double = ServiceBuilder::new("Double")
//!   .input(attr("number").types(ValueType::Integer))
//!   .output(attr("number").types(ValueType::Integer))
//!   .make("double", |ctx| {
//!     let n = ctx.input("number")?.as_i64().unwrap_or_default();
//!     ctx.set_output("number", n * 2)?;
//!     Ok(servitor::StepControl::Continue)
//!   })
//!   .build()?;
//!
//! let outcome = double.call([("number", 3)])?;
//! assert_eq!(outcome.output("number"), Some(&6.into()));
//! ```

pub mod attributes;
pub mod config;
pub mod core;
pub mod error;
pub mod options;
pub mod outcome;
pub mod registry;
pub mod service;
mod validation;
pub mod value;

// --- Re-exports for the Public API ---

pub use crate::attributes::{
  attr, AttributeBuilder, AttributeKind, AttributeSpec, Message, MessageContext, MustRule, Property, RuleConfig,
  Schema, SchemaField, StructuredRule,
};
pub use crate::config::{configure, reset_configuration, Configuration, ValidationMode};
pub use crate::core::{CallState, Condition, Context, StageBuilder, Step, StepControl, StepResult};
pub use crate::error::{Failure, RegistryError, ServiceError, ServiceResult, DEFAULT_FAILURE_TYPE};
pub use crate::options::{CheckOutcome, DynamicOption, OptionHelper, RuleInput};
pub use crate::outcome::{Outputs, ServiceOutcome};
pub use crate::registry::ServiceRegistry;
pub use crate::service::{Arguments, CallHook, Service, ServiceBuilder, ServiceInfo};
pub use crate::value::{Meta, ObjectRef, Value, ValueRange, ValueType};
