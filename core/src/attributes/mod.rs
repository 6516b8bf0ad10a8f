// servitor/src/attributes/mod.rs

pub mod builder;
pub mod collection;
pub mod kind;
pub mod rule;
pub mod schema;
pub mod spec;

pub use builder::{attr, AttributeBuilder};
pub use collection::{AttributeCollection, RESERVED_NAMES};
pub use kind::AttributeKind;
pub use rule::{
  IntoTypes, Message, MessageContext, MustRule, OptionBody, PredicateFn, PrepareFn, Properties, Property, RuleConfig,
  StructuredRule, ValidatorFn,
};
pub use schema::{Schema, SchemaField};
pub use spec::AttributeSpec;
