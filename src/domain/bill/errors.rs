use super::value_objects::ValueObjectError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BillError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("No bill with reference {0}")]
  NotFound(String),

  #[error("Bill not found: {0}")]
  BillNotFound(Uuid),

  #[error("Invoice line belongs to bill {line_bill_id}, not {bill_id}")]
  LineOwnerMismatch { line_bill_id: Uuid, bill_id: Uuid },

  #[error("Bill reference '{0}' already exists")]
  ReferenceAlreadyExists(String),

  #[error("Rendering failed: {0}")]
  Rendering(String),

  #[error("PDF generation failed: {0}")]
  PdfGenerationFailed(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

impl BillError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, BillError::NotFound(_) | BillError::BillNotFound(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_not_found_messages_name_the_lookup() {
    let by_reference = BillError::NotFound("2024-01-01-ABCDEF".to_string());
    let id = Uuid::new_v4();
    let by_id = BillError::BillNotFound(id);

    assert_eq!(
      by_reference.to_string(),
      "No bill with reference 2024-01-01-ABCDEF"
    );
    assert_eq!(by_id.to_string(), format!("Bill not found: {}", id));
    assert!(by_reference.is_not_found());
    assert!(by_id.is_not_found());
  }
}
