use serde::Deserialize;
use std::sync::Arc;

use crate::domain::bill::{BillError, BillService, BillableRef};

use super::get_bill_details::BillDetailsResponse;

/// Whether the submitted amount already includes tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineAmountMode {
  ExclTax,
  InclTax,
}

#[derive(Debug, Deserialize)]
pub struct AddBillLineCommand {
  pub reference: String,
  pub mode: LineAmountMode,
  /// Minor units
  pub amount: i64,
  pub description: String,
  pub tax_percentage: f64,
  pub billable_id: Option<String>,
  pub billable_type: Option<String>,
}

pub struct AddBillLineUseCase {
  bill_service: Arc<BillService>,
}

impl AddBillLineUseCase {
  pub fn new(bill_service: Arc<BillService>) -> Self {
    Self { bill_service }
  }

  pub async fn execute(&self, command: AddBillLineCommand) -> Result<BillDetailsResponse, BillError> {
    let line_owner = match (command.billable_id, command.billable_type) {
      (None, None) => None,
      (id, kind) => Some(BillableRef::new(
        id.unwrap_or_default(),
        kind.unwrap_or_default(),
      )?),
    };

    let bill = self
      .bill_service
      .find_by_reference_or_fail(&command.reference)
      .await?;

    let bill = match command.mode {
      LineAmountMode::ExclTax => {
        self
          .bill_service
          .add_amount_excl_tax(
            bill.id,
            line_owner,
            command.amount,
            &command.description,
            command.tax_percentage,
          )
          .await?
      }
      LineAmountMode::InclTax => {
        self
          .bill_service
          .add_amount_incl_tax(
            bill.id,
            line_owner,
            command.amount,
            &command.description,
            command.tax_percentage,
          )
          .await?
      }
    };

    Ok(BillDetailsResponse::from(&bill))
  }
}
