use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::bill::{Bill, BillError, BillRepository, InvoiceLine, InvoiceLineRepository};

#[derive(Debug, Default)]
struct Tables {
  bills: HashMap<Uuid, Bill>,
  // bill_id -> lines in insertion order
  lines: HashMap<Uuid, Vec<InvoiceLine>>,
}

/// In-memory bill and line storage.
///
/// Used when no database is configured and in tests. Enforces the same
/// constraints as the Postgres schema: unique references, lines must point
/// at an existing bill, deleting a bill deletes its lines.
#[derive(Debug, Default)]
pub struct InMemoryBillStore {
  tables: RwLock<Tables>,
}

impl InMemoryBillStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Tables {
  fn with_lines(&self, bill_id: Uuid) -> Result<Bill, BillError> {
    let mut bill = self
      .bills
      .get(&bill_id)
      .cloned()
      .ok_or(BillError::BillNotFound(bill_id))?;
    bill.lines = self.lines.get(&bill_id).cloned().unwrap_or_default();
    Ok(bill)
  }
}

fn without_lines(mut bill: Bill) -> Bill {
  bill.lines.clear();
  bill.stale = false;
  bill
}

#[async_trait]
impl BillRepository for InMemoryBillStore {
  async fn create(&self, bill: Bill) -> Result<Bill, BillError> {
    let mut tables = self.tables.write().await;
    if tables
      .bills
      .values()
      .any(|existing| existing.reference == bill.reference)
    {
      return Err(BillError::ReferenceAlreadyExists(
        bill.reference.into_inner(),
      ));
    }

    let bill = without_lines(bill);
    tables.bills.insert(bill.id, bill.clone());
    tables.lines.entry(bill.id).or_default();
    Ok(bill)
  }

  async fn add_line(&self, bill_id: Uuid, line: InvoiceLine) -> Result<Bill, BillError> {
    let mut tables = self.tables.write().await;
    let mut bill = tables.with_lines(bill_id)?;
    bill.attach_line(line.clone())?;
    bill.recalculate()?;

    tables.lines.entry(bill_id).or_default().push(line);
    tables.bills.insert(bill_id, without_lines(bill.clone()));
    Ok(bill)
  }

  async fn recalculate(&self, bill_id: Uuid) -> Result<Bill, BillError> {
    let mut tables = self.tables.write().await;
    let mut bill = tables.with_lines(bill_id)?;
    bill.recalculate()?;

    tables.bills.insert(bill_id, without_lines(bill.clone()));
    Ok(bill)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Bill>, BillError> {
    Ok(self.tables.read().await.bills.get(&id).cloned())
  }

  async fn find_by_reference(&self, reference: &str) -> Result<Option<Bill>, BillError> {
    Ok(
      self
        .tables
        .read()
        .await
        .bills
        .values()
        .find(|bill| bill.reference.value() == reference)
        .cloned(),
    )
  }

  async fn exists_by_reference(&self, reference: &str) -> Result<bool, BillError> {
    Ok(self.find_by_reference(reference).await?.is_some())
  }

  async fn delete(&self, id: Uuid) -> Result<(), BillError> {
    let mut tables = self.tables.write().await;
    tables.bills.remove(&id);
    tables.lines.remove(&id);
    Ok(())
  }
}

#[async_trait]
impl InvoiceLineRepository for InMemoryBillStore {
  async fn find_by_bill_id(&self, bill_id: Uuid) -> Result<Vec<InvoiceLine>, BillError> {
    Ok(
      self
        .tables
        .read()
        .await
        .lines
        .get(&bill_id)
        .cloned()
        .unwrap_or_default(),
    )
  }
}
