use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::entities::{Bill, InvoiceLine};
use super::errors::BillError;
use super::value_objects::{BillReference, ValueObjectError};

/// Bill rows. Lines are written through `add_line` so the stored totals
/// always match the stored lines; they are read through `InvoiceLineRepository`.
#[async_trait]
pub trait BillRepository: Send + Sync {
  async fn create(&self, bill: Bill) -> Result<Bill, BillError>;
  /// Attaches `line` to bill `bill_id`, recalculates, and stores the line
  /// and the new totals as one unit. Writers to the same bill are serialized.
  /// Nothing is stored when the line or the new totals are rejected.
  ///
  /// Returns the bill with all of its lines.
  async fn add_line(&self, bill_id: Uuid, line: InvoiceLine) -> Result<Bill, BillError>;
  /// Recomputes and stores the totals from the stored lines, under the same
  /// serialization as `add_line`.
  async fn recalculate(&self, bill_id: Uuid) -> Result<Bill, BillError>;
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Bill>, BillError>;
  async fn find_by_reference(&self, reference: &str) -> Result<Option<Bill>, BillError>;
  async fn exists_by_reference(&self, reference: &str) -> Result<bool, BillError>;
  /// Also removes the bill's lines.
  async fn delete(&self, id: Uuid) -> Result<(), BillError>;
}

#[async_trait]
pub trait InvoiceLineRepository: Send + Sync {
  async fn find_by_bill_id(&self, bill_id: Uuid) -> Result<Vec<InvoiceLine>, BillError>;
}

/// Extra template variables passed alongside the bill.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ViewData(Map<String, Value>);

impl ViewData {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.0.insert(key.into(), value.into());
    self
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
    self.0.insert(key.into(), value.into());
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }
}

impl From<Map<String, Value>> for ViewData {
  fn from(map: Map<String, Value>) -> Self {
    Self(map)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBill {
  pub html: String,
}

pub trait BillRenderer: Send + Sync {
  fn render(&self, bill: &Bill, data: &ViewData) -> Result<RenderedBill, BillError>;
}

#[async_trait]
pub trait PdfGenerator: Send + Sync {
  async fn generate_pdf(&self, html: &str) -> Result<Vec<u8>, BillError>;
}

pub trait ReferenceGenerator: Send + Sync {
  fn generate(&self, date: NaiveDate) -> Result<BillReference, ValueObjectError>;
}
