use serde::Deserialize;
use std::sync::Arc;

use crate::domain::bill::{BillError, BillService};

use super::get_bill_details::BillDetailsResponse;

#[derive(Debug, Deserialize)]
pub struct RecalculateBillCommand {
  pub reference: String,
}

pub struct RecalculateBillUseCase {
  bill_service: Arc<BillService>,
}

impl RecalculateBillUseCase {
  pub fn new(bill_service: Arc<BillService>) -> Self {
    Self { bill_service }
  }

  pub async fn execute(
    &self,
    command: RecalculateBillCommand,
  ) -> Result<BillDetailsResponse, BillError> {
    let bill = self
      .bill_service
      .find_by_reference_or_fail(&command.reference)
      .await?;
    let bill = self.bill_service.recalculate(bill.id).await?;

    Ok(BillDetailsResponse::from(&bill))
  }
}
