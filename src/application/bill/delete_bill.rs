use serde::Deserialize;
use std::sync::Arc;

use crate::domain::bill::{BillError, BillService};

#[derive(Debug, Deserialize)]
pub struct DeleteBillCommand {
  pub reference: String,
}

pub struct DeleteBillUseCase {
  bill_service: Arc<BillService>,
}

impl DeleteBillUseCase {
  pub fn new(bill_service: Arc<BillService>) -> Self {
    Self { bill_service }
  }

  pub async fn execute(&self, command: DeleteBillCommand) -> Result<(), BillError> {
    let bill = self
      .bill_service
      .find_by_reference_or_fail(&command.reference)
      .await?;

    self.bill_service.delete(bill.id).await
  }
}
