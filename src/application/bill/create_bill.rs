use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::bill::{BillError, BillService, BillStatus, BillableRef, Currency, NewBill};

#[derive(Debug, Deserialize)]
pub struct CreateBillCommand {
  pub billable_id: String,
  pub billable_type: String,
  pub reference: Option<String>,
  pub currency: Option<String>,
  pub status: Option<String>,
  pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateBillResponse {
  pub bill_id: Uuid,
  pub reference: String,
  pub currency: String,
  pub status: String,
  pub created_at: DateTime<Utc>,
}

pub struct CreateBillUseCase {
  bill_service: Arc<BillService>,
}

impl CreateBillUseCase {
  pub fn new(bill_service: Arc<BillService>) -> Self {
    Self { bill_service }
  }

  pub async fn execute(&self, command: CreateBillCommand) -> Result<CreateBillResponse, BillError> {
    let owner = BillableRef::new(command.billable_id, command.billable_type)?;
    let data = NewBill {
      reference: command.reference,
      currency: command.currency.as_deref().map(Currency::from_str).transpose()?,
      status: command.status.as_deref().map(BillStatus::from_str).transpose()?,
      note: command.note,
    };

    let bill = self.bill_service.create(&owner, data).await?;

    Ok(CreateBillResponse {
      bill_id: bill.id,
      reference: bill.reference.into_inner(),
      currency: bill.currency.as_str().to_string(),
      status: bill.status.as_str().to_string(),
      created_at: bill.created_at,
    })
  }
}
