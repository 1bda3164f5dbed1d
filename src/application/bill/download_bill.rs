use std::sync::Arc;

use crate::domain::bill::{BillDownload, BillError, BillService, ViewData};

#[derive(Debug)]
pub struct DownloadBillCommand {
  pub reference: String,
  pub view_data: ViewData,
}

pub struct DownloadBillUseCase {
  bill_service: Arc<BillService>,
}

impl DownloadBillUseCase {
  pub fn new(bill_service: Arc<BillService>) -> Self {
    Self { bill_service }
  }

  pub async fn execute(&self, command: DownloadBillCommand) -> Result<BillDownload, BillError> {
    let bill = self
      .bill_service
      .find_by_reference_or_fail(&command.reference)
      .await?;

    self.bill_service.download(bill.id, &command.view_data).await
  }
}
