use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::bill::LineAmountMode;
use crate::domain::bill::ViewData;

/// Request for creating a bill
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBillRequest {
  /// Identifier of the entity being billed
  #[validate(length(
    min = 1,
    max = 255,
    message = "Billable id must be between 1 and 255 characters"
  ))]
  pub billable_id: String,

  /// Type tag of the entity being billed, e.g. "customer"
  #[validate(length(
    min = 1,
    max = 255,
    message = "Billable type must be between 1 and 255 characters"
  ))]
  pub billable_type: String,

  /// Generated when omitted
  #[validate(length(
    min = 1,
    max = 100,
    message = "Reference must be between 1 and 100 characters"
  ))]
  pub reference: Option<String>,

  #[validate(length(equal = 3, message = "Currency must be a 3-letter ISO code"))]
  pub currency: Option<String>,

  pub status: Option<String>,

  #[validate(length(max = 2000, message = "Note cannot exceed 2000 characters"))]
  pub note: Option<String>,
}

/// Request for adding a line to a bill
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddLineRequest {
  /// `excl_tax` or `incl_tax`
  pub mode: LineAmountMode,

  /// Amount in minor units
  #[validate(range(min = 0, message = "Amount cannot be negative"))]
  pub amount: i64,

  #[validate(length(
    min = 1,
    max = 500,
    message = "Description must be between 1 and 500 characters"
  ))]
  pub description: String,

  /// Rate as a fraction, 0.21 for 21%
  #[serde(default)]
  #[validate(range(min = 0.0, max = 1.0, message = "Tax percentage must be between 0 and 1"))]
  pub tax_percentage: f64,

  /// Optional entity the line is about
  pub billable_id: Option<String>,
  pub billable_type: Option<String>,
}

/// Vendor details shown on the rendered bill
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillViewQuery {
  pub vendor: Option<String>,
  pub street: Option<String>,
  pub location: Option<String>,
  pub phone: Option<String>,
  pub email: Option<String>,
  pub url: Option<String>,
  pub product: Option<String>,
}

impl From<BillViewQuery> for ViewData {
  fn from(query: BillViewQuery) -> Self {
    let fields = [
      ("vendor", query.vendor),
      ("street", query.street),
      ("location", query.location),
      ("phone", query.phone),
      ("email", query.email),
      ("url", query.url),
      ("product", query.product),
    ];

    let mut data = ViewData::new();
    for (key, value) in fields {
      if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        data.insert(key, value);
      }
    }
    data
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
  pub status: &'static str,
}

/// Standard error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
  /// Error type/code
  pub error: String,

  /// Human-readable error message
  pub message: String,

  /// Optional detailed error information
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn add_line_request() -> AddLineRequest {
    AddLineRequest {
      mode: LineAmountMode::ExclTax,
      amount: 1000,
      description: "Consulting".to_string(),
      tax_percentage: 0.21,
      billable_id: None,
      billable_type: None,
    }
  }

  #[test]
  fn test_create_bill_request_validation() {
    let request: CreateBillRequest =
      serde_json::from_str(r#"{"billable_id": "42", "billable_type": "customer"}"#).unwrap();
    assert!(request.validate().is_ok());

    let request = CreateBillRequest {
      currency: Some("EURO".to_string()),
      ..request
    };
    assert!(request.validate().is_err());
  }

  #[test]
  fn test_create_bill_request_empty_billable() {
    let request: CreateBillRequest =
      serde_json::from_str(r#"{"billable_id": "", "billable_type": "customer"}"#).unwrap();
    assert!(request.validate().is_err());
  }

  #[test]
  fn test_add_line_request_validation() {
    assert!(add_line_request().validate().is_ok());

    let request = AddLineRequest {
      amount: -1,
      ..add_line_request()
    };
    assert!(request.validate().is_err());

    let request = AddLineRequest {
      tax_percentage: -0.1,
      ..add_line_request()
    };
    assert!(request.validate().is_err());

    let request = AddLineRequest {
      description: String::new(),
      ..add_line_request()
    };
    assert!(request.validate().is_err());
  }

  #[test]
  fn test_add_line_request_defaults_to_zero_rate() {
    let request: AddLineRequest =
      serde_json::from_str(r#"{"mode": "incl_tax", "amount": 500, "description": "Gift"}"#)
        .unwrap();
    assert_eq!(request.mode, LineAmountMode::InclTax);
    assert_eq!(request.tax_percentage, 0.0);
  }

  #[test]
  fn test_view_query_skips_blank_values() {
    let data = ViewData::from(BillViewQuery {
      vendor: Some("Acme Ltd".to_string()),
      phone: Some("  ".to_string()),
      ..BillViewQuery::default()
    });

    let keys: Vec<_> = data.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["vendor"]);
  }
}
