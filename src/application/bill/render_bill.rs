use std::sync::Arc;

use crate::domain::bill::{BillError, BillService, ViewData};

#[derive(Debug)]
pub struct RenderBillCommand {
  pub reference: String,
  pub view_data: ViewData,
}

#[derive(Debug)]
pub struct RenderBillResponse {
  pub html: String,
}

pub struct RenderBillUseCase {
  bill_service: Arc<BillService>,
}

impl RenderBillUseCase {
  pub fn new(bill_service: Arc<BillService>) -> Self {
    Self { bill_service }
  }

  pub async fn execute(&self, command: RenderBillCommand) -> Result<RenderBillResponse, BillError> {
    let bill = self
      .bill_service
      .find_by_reference_or_fail(&command.reference)
      .await?;
    let rendered = self.bill_service.view(bill.id, &command.view_data).await?;

    Ok(RenderBillResponse {
      html: rendered.html,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::application::bill::test_support::{bill_service, create_bill};

  #[tokio::test]
  async fn test_render_by_reference() {
    let service = bill_service();
    let bill = create_bill(&service, "REF-1").await;
    service
      .add_amount_excl_tax(bill.id, None, 2500, "Support plan", 0.0)
      .await
      .unwrap();

    let response = RenderBillUseCase::new(service)
      .execute(RenderBillCommand {
        reference: "REF-1".to_string(),
        view_data: ViewData::new().with("email", "billing@example.com"),
      })
      .await
      .unwrap();

    assert!(response.html.contains("REF-1"));
    assert!(response.html.contains("Support plan"));
    assert!(response.html.contains("25.00"));
    assert!(response.html.contains("billing@example.com"));
  }
}
