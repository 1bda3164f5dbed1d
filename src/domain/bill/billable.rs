use serde::{Deserialize, Serialize};
use std::fmt;

use super::value_objects::ValueObjectError;

/// Anything a bill or an invoice line can be attached to.
///
/// Implementors expose a stable opaque identifier and a type tag; together
/// they identify the entity across storage and rendering.
pub trait Billable {
  fn billable_id(&self) -> String;
  fn billable_type(&self) -> &str;

  fn to_billable_ref(&self) -> Result<BillableRef, ValueObjectError> {
    BillableRef::new(self.billable_id(), self.billable_type())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillableRef {
  id: String,
  #[serde(rename = "type")]
  kind: String,
}

impl BillableRef {
  pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Result<Self, ValueObjectError> {
    let id = id.into().trim().to_string();
    let kind = kind.into().trim().to_string();
    if id.is_empty() {
      return Err(ValueObjectError::InvalidBillable(
        "Billable id cannot be empty".to_string(),
      ));
    }
    if kind.is_empty() {
      return Err(ValueObjectError::InvalidBillable(
        "Billable type cannot be empty".to_string(),
      ));
    }
    if id.len() > 255 || kind.len() > 255 {
      return Err(ValueObjectError::InvalidBillable(
        "Billable id and type cannot exceed 255 characters".to_string(),
      ));
    }
    Ok(Self { id, kind })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn kind(&self) -> &str {
    &self.kind
  }
}

impl Billable for BillableRef {
  fn billable_id(&self) -> String {
    self.id.clone()
  }

  fn billable_type(&self) -> &str {
    &self.kind
  }

  fn to_billable_ref(&self) -> Result<BillableRef, ValueObjectError> {
    Ok(self.clone())
  }
}

impl fmt::Display for BillableRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.kind, self.id)
  }
}
