use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::bill::{Bill, BillError, BillService, BillTotals, InvoiceLine, TaxComponent};

#[derive(Debug, Deserialize)]
pub struct GetBillDetailsCommand {
  pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct TaxComponentDto {
  pub name: String,
  pub rate: Decimal,
  pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct InvoiceLineDto {
  pub id: Uuid,
  pub billable_id: Option<String>,
  pub billable_type: Option<String>,
  pub name: Option<String>,
  pub description: String,
  pub amount: i64,
  pub tax: i64,
  pub total: i64,
  pub tax_percentage: Decimal,
  pub tax_details: Vec<TaxComponentDto>,
  pub discount: i64,
  pub quantity: i64,
  pub is_free: bool,
  pub is_complimentary: bool,
  pub created_at: DateTime<Utc>,
}

/// Amounts are in minor units.
#[derive(Debug, Serialize)]
pub struct BillTotalsDto {
  pub subtotal: i64,
  pub tax: i64,
  pub grand_total: i64,
  pub currency: String,
}

#[derive(Debug, Serialize)]
pub struct BillDetailsResponse {
  pub id: Uuid,
  pub reference: String,
  pub billable_id: String,
  pub billable_type: String,
  pub currency: String,
  pub status: String,
  pub note: Option<String>,
  pub lines: Vec<InvoiceLineDto>,
  pub totals: BillTotalsDto,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<&TaxComponent> for TaxComponentDto {
  fn from(component: &TaxComponent) -> Self {
    Self {
      name: component.name.clone(),
      rate: component.rate.value(),
      amount: component.amount.value(),
    }
  }
}

impl From<&InvoiceLine> for InvoiceLineDto {
  fn from(line: &InvoiceLine) -> Self {
    Self {
      id: line.id,
      billable_id: line.billable.as_ref().map(|b| b.id().to_string()),
      billable_type: line.billable.as_ref().map(|b| b.kind().to_string()),
      name: line.name.clone(),
      description: line.description.value().to_string(),
      amount: line.amount.value(),
      tax: line.tax.value(),
      // amount and tax are each bounded by the line's input total
      total: line.amount.value().saturating_add(line.tax.value()),
      tax_percentage: line.tax_percentage.value(),
      tax_details: line
        .tax_details
        .components()
        .iter()
        .map(TaxComponentDto::from)
        .collect(),
      discount: line.discount.value(),
      quantity: line.quantity.value(),
      is_free: line.is_free,
      is_complimentary: line.is_complimentary,
      created_at: line.created_at,
    }
  }
}

impl BillTotalsDto {
  fn new(totals: &BillTotals, currency: &str) -> Self {
    Self {
      subtotal: totals.subtotal.value(),
      tax: totals.tax.value(),
      grand_total: totals.grand_total.value(),
      currency: currency.to_string(),
    }
  }
}

impl From<&Bill> for BillDetailsResponse {
  fn from(bill: &Bill) -> Self {
    Self {
      id: bill.id,
      reference: bill.reference.value().to_string(),
      billable_id: bill.billable.id().to_string(),
      billable_type: bill.billable.kind().to_string(),
      currency: bill.currency.as_str().to_string(),
      status: bill.status.as_str().to_string(),
      note: bill.note.clone(),
      lines: bill.lines.iter().map(InvoiceLineDto::from).collect(),
      totals: BillTotalsDto::new(&bill.totals, bill.currency.as_str()),
      created_at: bill.created_at,
      updated_at: bill.updated_at,
    }
  }
}

pub struct GetBillDetailsUseCase {
  bill_service: Arc<BillService>,
}

impl GetBillDetailsUseCase {
  pub fn new(bill_service: Arc<BillService>) -> Self {
    Self { bill_service }
  }

  pub async fn execute(
    &self,
    command: GetBillDetailsCommand,
  ) -> Result<BillDetailsResponse, BillError> {
    let bill = self
      .bill_service
      .find_by_reference_or_fail(&command.reference)
      .await?;

    Ok(BillDetailsResponse::from(&bill))
  }
}
