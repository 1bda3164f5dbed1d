use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::billable::{Billable, BillableRef};
use super::entities::{Bill, InvoiceLine};
use super::errors::BillError;
use super::ports::{
  BillRenderer, BillRepository, InvoiceLineRepository, PdfGenerator, ReferenceGenerator,
  RenderedBill, ViewData,
};
use super::value_objects::{BillReference, BillStatus, Currency};

const MAX_REFERENCE_ATTEMPTS: usize = 5;

/// Bill creation data
#[derive(Debug, Clone, Default)]
pub struct NewBill {
  /// Generated when absent
  pub reference: Option<String>,
  pub currency: Option<Currency>,
  pub status: Option<BillStatus>,
  pub note: Option<String>,
}

/// A rendered PDF ready to be sent as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDownload {
  pub filename: String,
  pub content_type: &'static str,
  pub bytes: Vec<u8>,
}

pub struct BillServiceDependencies {
  pub bill_repo: Arc<dyn BillRepository>,
  pub line_repo: Arc<dyn InvoiceLineRepository>,
  pub renderer: Arc<dyn BillRenderer>,
  pub pdf_generator: Arc<dyn PdfGenerator>,
  pub reference_generator: Arc<dyn ReferenceGenerator>,
  pub default_currency: Currency,
}

pub struct BillService {
  bill_repo: Arc<dyn BillRepository>,
  line_repo: Arc<dyn InvoiceLineRepository>,
  renderer: Arc<dyn BillRenderer>,
  pdf_generator: Arc<dyn PdfGenerator>,
  reference_generator: Arc<dyn ReferenceGenerator>,
  default_currency: Currency,
}

impl BillService {
  pub fn new(deps: BillServiceDependencies) -> Self {
    Self {
      bill_repo: deps.bill_repo,
      line_repo: deps.line_repo,
      renderer: deps.renderer,
      pdf_generator: deps.pdf_generator,
      reference_generator: deps.reference_generator,
      default_currency: deps.default_currency,
    }
  }

  /// Creates an empty bill for `owner`.
  pub async fn create<B: Billable + Sync + ?Sized>(
    &self,
    owner: &B,
    data: NewBill,
  ) -> Result<Bill, BillError> {
    let billable = owner.to_billable_ref()?;
    let reference = match data.reference {
      Some(reference) => {
        let reference = BillReference::new(reference)?;
        if self
          .bill_repo
          .exists_by_reference(reference.value())
          .await?
        {
          return Err(BillError::ReferenceAlreadyExists(reference.into_inner()));
        }
        reference
      }
      None => self.unique_reference().await?,
    };

    let mut bill = Bill::new(
      reference,
      billable,
      data.currency.unwrap_or(self.default_currency),
    );
    if let Some(status) = data.status {
      bill.set_status(status);
    }
    bill.set_note(data.note);

    let created = self.bill_repo.create(bill).await?;
    tracing::info!(
      bill_id = %created.id,
      reference = %created.reference,
      billable = %created.billable,
      "Bill created"
    );
    Ok(created)
  }

  /// Loads a bill together with its lines.
  pub async fn get_bill(&self, bill_id: Uuid) -> Result<Bill, BillError> {
    let bill = self
      .bill_repo
      .find_by_id(bill_id)
      .await?
      .ok_or(BillError::BillNotFound(bill_id))?;
    self.with_lines(bill).await
  }

  /// Use this if the amount does not yet include tax.
  pub async fn add_amount_excl_tax(
    &self,
    bill_id: Uuid,
    line_owner: Option<BillableRef>,
    amount: i64,
    description: &str,
    tax_percentage: f64,
  ) -> Result<Bill, BillError> {
    let line = InvoiceLine::excluding_tax(bill_id, amount, description, tax_percentage)?
      .with_billable(line_owner);
    self.add_line(bill_id, line).await
  }

  /// Use this if the amount already includes tax.
  pub async fn add_amount_incl_tax(
    &self,
    bill_id: Uuid,
    line_owner: Option<BillableRef>,
    amount: i64,
    description: &str,
    tax_percentage: f64,
  ) -> Result<Bill, BillError> {
    let line = InvoiceLine::including_tax(bill_id, amount, description, tax_percentage)?
      .with_billable(line_owner);
    self.add_line(bill_id, line).await
  }

  /// Attaches a prepared line and stores it together with the recalculated totals.
  pub async fn add_line(&self, bill_id: Uuid, line: InvoiceLine) -> Result<Bill, BillError> {
    let line_id = line.id;
    let (amount, tax) = (line.amount.value(), line.tax.value());

    let bill = self.bill_repo.add_line(bill_id, line).await?;
    tracing::info!(
      bill_id = %bill_id,
      line_id = %line_id,
      amount,
      tax,
      grand_total = bill.totals.grand_total.value(),
      "Invoice line added"
    );
    Ok(bill)
  }

  /// Recalculates total and tax based on the stored lines.
  pub async fn recalculate(&self, bill_id: Uuid) -> Result<Bill, BillError> {
    self.bill_repo.recalculate(bill_id).await
  }

  pub async fn view(&self, bill_id: Uuid, data: &ViewData) -> Result<RenderedBill, BillError> {
    let bill = self.get_bill(bill_id).await?;
    self.renderer.render(&bill, data)
  }

  /// Captures the bill as a PDF and returns the raw bytes.
  pub async fn pdf(&self, bill_id: Uuid, data: &ViewData) -> Result<Vec<u8>, BillError> {
    let bill = self.get_bill(bill_id).await?;
    self.render_pdf(&bill, data).await
  }

  pub async fn download(&self, bill_id: Uuid, data: &ViewData) -> Result<BillDownload, BillError> {
    let bill = self.get_bill(bill_id).await?;
    let bytes = self.render_pdf(&bill, data).await?;

    Ok(BillDownload {
      filename: format!("{}.pdf", bill.reference),
      content_type: "application/pdf",
      bytes,
    })
  }

  pub async fn find_by_reference(&self, reference: &str) -> Result<Option<Bill>, BillError> {
    match self.bill_repo.find_by_reference(reference.trim()).await? {
      Some(bill) => Ok(Some(self.with_lines(bill).await?)),
      None => Ok(None),
    }
  }

  pub async fn find_by_reference_or_fail(&self, reference: &str) -> Result<Bill, BillError> {
    self
      .find_by_reference(reference)
      .await?
      .ok_or_else(|| BillError::NotFound(reference.trim().to_string()))
  }

  /// Deletes the bill and every line it owns.
  pub async fn delete(&self, bill_id: Uuid) -> Result<(), BillError> {
    self
      .bill_repo
      .find_by_id(bill_id)
      .await?
      .ok_or(BillError::BillNotFound(bill_id))?;
    self.bill_repo.delete(bill_id).await?;
    tracing::info!(bill_id = %bill_id, "Bill deleted");
    Ok(())
  }

  // Helper methods
  async fn render_pdf(&self, bill: &Bill, data: &ViewData) -> Result<Vec<u8>, BillError> {
    let rendered = self.renderer.render(bill, data)?;
    let bytes = self.pdf_generator.generate_pdf(&rendered.html).await?;
    tracing::info!(
      reference = %bill.reference,
      size = bytes.len(),
      "Bill PDF generated"
    );
    Ok(bytes)
  }

  async fn with_lines(&self, mut bill: Bill) -> Result<Bill, BillError> {
    bill.lines = self.line_repo.find_by_bill_id(bill.id).await?;
    Ok(bill)
  }

  async fn unique_reference(&self) -> Result<BillReference, BillError> {
    let today = Utc::now().date_naive();
    let mut last = None;
    for _ in 0..MAX_REFERENCE_ATTEMPTS {
      let reference = self.reference_generator.generate(today)?;
      if !self
        .bill_repo
        .exists_by_reference(reference.value())
        .await?
      {
        return Ok(reference);
      }
      tracing::warn!(reference = %reference, "Generated bill reference already taken");
      last = Some(reference);
    }

    Err(BillError::ReferenceAlreadyExists(
      last.map(BillReference::into_inner).unwrap_or_default(),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::application::bill::test_support::{FakePdfGenerator, bill_service};
  use crate::domain::bill::ValueObjectError;
  use crate::infrastructure::persistence::InMemoryBillStore;
  use crate::infrastructure::reference::RandomReferenceGenerator;
  use crate::infrastructure::rendering::TeraBillRenderer;
  use chrono::NaiveDate;

  struct FixedReferenceGenerator;

  impl ReferenceGenerator for FixedReferenceGenerator {
    fn generate(&self, _date: NaiveDate) -> Result<BillReference, ValueObjectError> {
      BillReference::new("FIXED")
    }
  }

  struct Subscription {
    id: Uuid,
  }

  impl Billable for Subscription {
    fn billable_id(&self) -> String {
      self.id.to_string()
    }

    fn billable_type(&self) -> &str {
      "subscription"
    }
  }

  fn service_with(reference_generator: Arc<dyn ReferenceGenerator>) -> BillService {
    let store = Arc::new(InMemoryBillStore::new());
    BillService::new(BillServiceDependencies {
      bill_repo: store.clone(),
      line_repo: store,
      renderer: Arc::new(TeraBillRenderer::new(None).unwrap()),
      pdf_generator: Arc::new(FakePdfGenerator),
      reference_generator,
      default_currency: Currency::EUR,
    })
  }

  fn service() -> Arc<BillService> {
    bill_service()
  }

  fn owner() -> Subscription {
    Subscription { id: Uuid::new_v4() }
  }

  #[tokio::test]
  async fn test_create_generates_reference() {
    let service = service();
    let owner = owner();
    let bill = service.create(&owner, NewBill::default()).await.unwrap();

    assert_eq!(bill.billable.kind(), "subscription");
    assert_eq!(bill.billable.id(), owner.id.to_string());
    assert_eq!(bill.currency, Currency::EUR);
    assert!(
      bill
        .reference
        .value()
        .starts_with(&Utc::now().date_naive().to_string())
    );
  }

  #[tokio::test]
  async fn test_create_rejects_duplicate_reference() {
    let service = service();
    let data = NewBill {
      reference: Some("INV-1".to_string()),
      ..NewBill::default()
    };
    service.create(&owner(), data.clone()).await.unwrap();

    let err = service.create(&owner(), data).await.unwrap_err();
    assert!(matches!(err, BillError::ReferenceAlreadyExists(r) if r == "INV-1"));
  }

  #[tokio::test]
  async fn test_generated_reference_collisions_give_up() {
    let service = service_with(Arc::new(FixedReferenceGenerator));
    service.create(&owner(), NewBill::default()).await.unwrap();

    let err = service.create(&owner(), NewBill::default()).await.unwrap_err();
    assert!(matches!(err, BillError::ReferenceAlreadyExists(_)));
  }

  #[tokio::test]
  async fn test_add_amount_excl_tax_recalculates_and_persists() {
    let service = service();
    let bill = service.create(&owner(), NewBill::default()).await.unwrap();

    let bill = service
      .add_amount_excl_tax(bill.id, None, 1000, "service", 0.21)
      .await
      .unwrap();
    assert_eq!(bill.lines.len(), 1);
    assert_eq!(bill.lines[0].amount.value(), 1000);
    assert_eq!(bill.lines[0].tax.value(), 210);
    assert_eq!(bill.totals.subtotal.value(), 1000);
    assert_eq!(bill.totals.tax.value(), 210);
    assert_eq!(bill.totals.grand_total.value(), 1210);

    let stored = service.get_bill(bill.id).await.unwrap();
    assert_eq!(stored.totals, bill.totals);
    assert_eq!(stored.lines, bill.lines);
  }

  #[tokio::test]
  async fn test_add_amount_incl_tax_reconstructs_amount() {
    let service = service();
    let bill = service.create(&owner(), NewBill::default()).await.unwrap();
    let product = BillableRef::new("sku-1", "product").unwrap();

    let bill = service
      .add_amount_incl_tax(bill.id, Some(product.clone()), 1210, "service", 0.21)
      .await
      .unwrap();
    assert_eq!(bill.lines[0].amount.value(), 1000);
    assert_eq!(bill.lines[0].tax.value(), 210);
    assert_eq!(bill.lines[0].billable, Some(product));
    assert_eq!(bill.totals.grand_total.value(), 1210);
  }

  #[tokio::test]
  async fn test_invalid_amount_does_not_touch_storage() {
    let service = service();
    let bill = service.create(&owner(), NewBill::default()).await.unwrap();

    let err = service
      .add_amount_excl_tax(bill.id, None, -5, "bad", 0.21)
      .await
      .unwrap_err();
    assert!(matches!(err, BillError::Validation(_)));
    assert!(service.get_bill(bill.id).await.unwrap().lines.is_empty());
  }

  #[tokio::test]
  async fn test_rejected_total_does_not_store_line() {
    let service = service();
    let bill = service.create(&owner(), NewBill::default()).await.unwrap();
    service
      .add_amount_excl_tax(bill.id, None, i64::MAX - 10, "big", 0.0)
      .await
      .unwrap();

    let err = service
      .add_amount_excl_tax(bill.id, None, 100, "small", 0.0)
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      BillError::Validation(ValueObjectError::AmountOverflow(_))
    ));

    let stored = service.get_bill(bill.id).await.unwrap();
    assert_eq!(stored.lines.len(), 1);
    assert_eq!(stored.totals.grand_total.value(), i64::MAX - 10);
    assert!(service.recalculate(bill.id).await.is_ok());
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_concurrent_adds_keep_totals_in_step() {
    let service = service();
    let bill_id = service.create(&owner(), NewBill::default()).await.unwrap().id;

    let tasks: Vec<_> = (0..50)
      .map(|i| {
        let service = service.clone();
        tokio::spawn(async move {
          service
            .add_amount_excl_tax(bill_id, None, 100 + i, "item", 0.21)
            .await
        })
      })
      .collect();
    for task in tasks {
      task.await.unwrap().unwrap();
    }

    let stored = service.get_bill(bill_id).await.unwrap();
    assert_eq!(stored.lines.len(), 50);
    let subtotal: i64 = stored.lines.iter().map(|l| l.amount.value()).sum();
    let tax: i64 = stored.lines.iter().map(|l| l.tax.value()).sum();
    assert_eq!(stored.totals.subtotal.value(), subtotal);
    assert_eq!(stored.totals.tax.value(), tax);
    assert_eq!(stored.totals.grand_total.value(), subtotal + tax);
  }

  #[tokio::test]
  async fn test_add_to_missing_bill_fails() {
    let service = service();
    let missing = Uuid::new_v4();
    let err = service
      .add_amount_excl_tax(missing, None, 100, "orphan", 0.0)
      .await
      .unwrap_err();
    assert!(matches!(err, BillError::BillNotFound(id) if id == missing));
  }

  #[tokio::test]
  async fn test_add_line_for_other_bill_fails() {
    let service = service();
    let a = service.create(&owner(), NewBill::default()).await.unwrap();
    let b = service.create(&owner(), NewBill::default()).await.unwrap();

    let line = InvoiceLine::excluding_tax(b.id, 100, "misrouted", 0.0).unwrap();
    let err = service.add_line(a.id, line).await.unwrap_err();
    assert!(matches!(err, BillError::LineOwnerMismatch { .. }));
    assert!(service.get_bill(b.id).await.unwrap().lines.is_empty());
  }

  #[tokio::test]
  async fn test_recalculate_is_idempotent() {
    let service = service();
    let bill = service.create(&owner(), NewBill::default()).await.unwrap();
    service
      .add_amount_excl_tax(bill.id, None, 333, "a", 0.09)
      .await
      .unwrap();
    service
      .add_amount_incl_tax(bill.id, None, 1001, "b", 0.21)
      .await
      .unwrap();

    let first = service.recalculate(bill.id).await.unwrap();
    let second = service.recalculate(bill.id).await.unwrap();
    assert_eq!(first.totals, second.totals);
    assert_eq!(
      second.totals.grand_total.value(),
      second.totals.subtotal.value() + second.totals.tax.value()
    );
  }

  #[tokio::test]
  async fn test_find_by_reference() {
    let service = service();
    let created = service
      .create(
        &owner(),
        NewBill {
          reference: Some("REF-42".to_string()),
          ..NewBill::default()
        },
      )
      .await
      .unwrap();
    service
      .add_amount_excl_tax(created.id, None, 100, "x", 0.0)
      .await
      .unwrap();

    let found = service.find_by_reference("REF-42").await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.lines.len(), 1);

    assert!(service.find_by_reference("missing").await.unwrap().is_none());
    let err = service.find_by_reference_or_fail("missing").await.unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn test_view_reflects_last_recalculation() {
    let service = service();
    let bill = service.create(&owner(), NewBill::default()).await.unwrap();
    service
      .add_amount_excl_tax(bill.id, None, 1000, "Consulting hours", 0.21)
      .await
      .unwrap();

    let rendered = service
      .view(bill.id, &ViewData::new().with("vendor", "Acme Ltd"))
      .await
      .unwrap();
    assert!(rendered.html.contains(bill.reference.value()));
    assert!(rendered.html.contains("Consulting hours"));
    assert!(rendered.html.contains("12.10"));
    assert!(rendered.html.contains("Acme Ltd"));
  }

  #[tokio::test]
  async fn test_pdf_and_download() {
    let service = service();
    let bill = service.create(&owner(), NewBill::default()).await.unwrap();
    service
      .add_amount_excl_tax(bill.id, None, 500, "Setup", 0.0)
      .await
      .unwrap();

    let pdf = service.pdf(bill.id, &ViewData::new()).await.unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    let download = service.download(bill.id, &ViewData::new()).await.unwrap();
    assert_eq!(download.filename, format!("{}.pdf", bill.reference));
    assert_eq!(download.content_type, "application/pdf");
    assert_eq!(download.bytes, pdf);
  }

  #[tokio::test]
  async fn test_delete_removes_lines() {
    let store = Arc::new(InMemoryBillStore::new());
    let service = BillService::new(BillServiceDependencies {
      bill_repo: store.clone(),
      line_repo: store.clone(),
      renderer: Arc::new(TeraBillRenderer::new(None).unwrap()),
      pdf_generator: Arc::new(FakePdfGenerator),
      reference_generator: Arc::new(RandomReferenceGenerator::new()),
      default_currency: Currency::USD,
    });
    let bill = service.create(&owner(), NewBill::default()).await.unwrap();
    assert_eq!(bill.currency, Currency::USD);
    service
      .add_amount_excl_tax(bill.id, None, 100, "x", 0.0)
      .await
      .unwrap();

    service.delete(bill.id).await.unwrap();
    assert!(store.find_by_bill_id(bill.id).await.unwrap().is_empty());
    assert!(service.get_bill(bill.id).await.unwrap_err().is_not_found());
    assert!(service.delete(bill.id).await.is_err());
  }
}
