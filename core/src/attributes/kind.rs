// servitor/src/attributes/kind.rs

//! The three attribute namespaces and the wording each uses in messages.

use crate::error::ServiceError;
use crate::value::Meta;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
  Input,
  Internal,
  Output,
}

impl AttributeKind {
  /// Short namespace name: `input`, `internal`, `output`.
  pub fn namespace(self) -> &'static str {
    match self {
      AttributeKind::Input => "input",
      AttributeKind::Internal => "internal",
      AttributeKind::Output => "output",
    }
  }

  /// Lower-case noun used mid-sentence, e.g. "Wrong type of internal attribute `x`".
  pub fn label(self) -> &'static str {
    match self {
      AttributeKind::Input => "input",
      AttributeKind::Internal => "internal attribute",
      AttributeKind::Output => "output attribute",
    }
  }

  /// Sentence-initial form of [`label`](Self::label).
  pub fn title(self) -> &'static str {
    match self {
      AttributeKind::Input => "Input",
      AttributeKind::Internal => "Internal attribute",
      AttributeKind::Output => "Output attribute",
    }
  }

  pub fn collection_label(self) -> &'static str {
    match self {
      AttributeKind::Input => "input collection",
      AttributeKind::Internal => "internal attribute collection",
      AttributeKind::Output => "output attribute collection",
    }
  }

  pub fn hash_label(self) -> &'static str {
    match self {
      AttributeKind::Input => "input hash",
      AttributeKind::Internal => "internal attribute hash",
      AttributeKind::Output => "output attribute hash",
    }
  }

  /// Builds the namespace-appropriate attribute error.
  pub(crate) fn error(self, service: &str, name: &str, message: String, meta: Meta) -> ServiceError {
    let service = service.to_string();
    let name = Some(name.to_string());
    match self {
      AttributeKind::Input => ServiceError::Input {
        service,
        input_name: name,
        message,
        meta,
      },
      AttributeKind::Internal => ServiceError::Internal {
        service,
        internal_name: name,
        message,
        meta,
      },
      AttributeKind::Output => ServiceError::Output {
        service,
        output_name: name,
        message,
        meta,
      },
    }
  }
}

impl fmt::Display for AttributeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.namespace())
  }
}
