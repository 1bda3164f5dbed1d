use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::bill::{
  Bill, BillError, BillService, BillServiceDependencies, BillableRef, Currency, NewBill,
  PdfGenerator,
};
use crate::infrastructure::persistence::InMemoryBillStore;
use crate::infrastructure::reference::RandomReferenceGenerator;
use crate::infrastructure::rendering::TeraBillRenderer;

/// Wraps the HTML in a PDF header instead of shelling out to wkhtmltopdf.
pub struct FakePdfGenerator;

#[async_trait]
impl PdfGenerator for FakePdfGenerator {
  async fn generate_pdf(&self, html: &str) -> Result<Vec<u8>, BillError> {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.extend_from_slice(html.as_bytes());
    Ok(bytes)
  }
}

pub fn bill_service() -> Arc<BillService> {
  let store = Arc::new(InMemoryBillStore::new());
  Arc::new(BillService::new(BillServiceDependencies {
    bill_repo: store.clone(),
    line_repo: store,
    renderer: Arc::new(TeraBillRenderer::new(None).unwrap()),
    pdf_generator: Arc::new(FakePdfGenerator),
    reference_generator: Arc::new(RandomReferenceGenerator::new()),
    default_currency: Currency::EUR,
  }))
}

pub async fn create_bill(service: &BillService, reference: &str) -> Bill {
  let owner = BillableRef::new("1", "customer").unwrap();
  service
    .create(
      &owner,
      NewBill {
        reference: Some(reference.to_string()),
        ..NewBill::default()
      },
    )
    .await
    .unwrap()
}
