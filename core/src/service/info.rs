// servitor/src/service/info.rs

use super::definition::Service;
use crate::attributes::collection::AttributeCollection;
use crate::attributes::spec::AttributeSpec;
use crate::value::{Value, ValueType};

/// Read-only description of a built service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfo {
  pub name: String,
  pub inputs: Vec<AttributeInfo>,
  pub internals: Vec<AttributeInfo>,
  pub outputs: Vec<AttributeInfo>,
  /// Step names in run order.
  pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
  pub name: String,
  pub access_name: String,
  pub types: Vec<ValueType>,
  pub required: bool,
  pub default: Option<Value>,
  pub options: Vec<String>,
}

impl From<&AttributeSpec> for AttributeInfo {
  fn from(spec: &AttributeSpec) -> Self {
    Self {
      name: spec.name().to_string(),
      access_name: spec.access_name().to_string(),
      types: spec.types().to_vec(),
      required: spec.is_required(),
      default: spec.default_value().cloned(),
      options: spec.option_names().into_iter().map(str::to_string).collect(),
    }
  }
}

fn describe(collection: &AttributeCollection) -> Vec<AttributeInfo> {
  collection.iter().map(AttributeInfo::from).collect()
}

impl Service {
  pub fn info(&self) -> ServiceInfo {
    let definition = &self.definition;
    ServiceInfo {
      name: definition.name.clone(),
      inputs: describe(&definition.inputs),
      internals: describe(&definition.internals),
      outputs: describe(&definition.outputs),
      steps: definition
        .stages
        .iter()
        .flat_map(|stage| stage.steps.iter().map(|step| step.name.clone()))
        .collect(),
    }
  }
}
