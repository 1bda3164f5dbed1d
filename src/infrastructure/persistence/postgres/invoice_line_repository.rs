use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::bill::{
  BillError, BillableRef, Cents, InvoiceLine, InvoiceLineRepository, LineDescription, Quantity,
  TaxDetails, TaxRate,
};

const LINE_COLUMNS: &str = "id, bill_id, billable_id, billable_type, name, description, amount, \
                            tax, tax_percentage, tax_details, discount, quantity, is_free, \
                            is_complimentary, created_at";

#[derive(Debug, FromRow)]
struct InvoiceLineRow {
  id: Uuid,
  bill_id: Uuid,
  billable_id: Option<String>,
  billable_type: Option<String>,
  name: Option<String>,
  description: String,
  amount: i64,
  tax: i64,
  tax_percentage: Decimal,
  tax_details: Json<TaxDetails>,
  discount: i64,
  quantity: i64,
  is_free: bool,
  is_complimentary: bool,
  created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceLineRow> for InvoiceLine {
  type Error = BillError;

  fn try_from(row: InvoiceLineRow) -> Result<Self, Self::Error> {
    let billable = match (row.billable_id, row.billable_type) {
      (Some(id), Some(kind)) => Some(BillableRef::new(id, kind)?),
      _ => None,
    };

    Ok(InvoiceLine {
      id: row.id,
      bill_id: row.bill_id,
      billable,
      name: row.name,
      description: LineDescription::new(row.description)?,
      amount: Cents::new(row.amount)?,
      tax: Cents::new(row.tax)?,
      tax_percentage: TaxRate::new(row.tax_percentage)?,
      tax_details: row.tax_details.0,
      discount: Cents::new(row.discount)?,
      quantity: Quantity::new(row.quantity)?,
      is_free: row.is_free,
      is_complimentary: row.is_complimentary,
      created_at: row.created_at,
    })
  }
}

/// Inserts a line row. Callers keep the bill totals in step.
pub(super) async fn insert_line<'e>(
  executor: impl PgExecutor<'e>,
  line: &InvoiceLine,
) -> Result<InvoiceLine, BillError> {
  let query = format!(
    r#"
            INSERT INTO invoice_lines (
                id, bill_id, billable_id, billable_type, name, description, amount,
                tax, tax_percentage, tax_details, discount, quantity, is_free,
                is_complimentary, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {LINE_COLUMNS}
            "#
  );

  let row = sqlx::query_as::<_, InvoiceLineRow>(&query)
    .bind(line.id)
    .bind(line.bill_id)
    .bind(line.billable.as_ref().map(|b| b.id().to_string()))
    .bind(line.billable.as_ref().map(|b| b.kind().to_string()))
    .bind(line.name.as_deref())
    .bind(line.description.value())
    .bind(line.amount.value())
    .bind(line.tax.value())
    .bind(line.tax_percentage.value())
    .bind(Json(&line.tax_details))
    .bind(line.discount.value())
    .bind(line.quantity.value())
    .bind(line.is_free)
    .bind(line.is_complimentary)
    .bind(line.created_at)
    .fetch_one(executor)
    .await
    .map_err(|e| match &e {
      sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
        BillError::BillNotFound(line.bill_id)
      }
      _ => BillError::Database(e),
    })?;

  row.try_into()
}

pub(super) async fn select_lines<'e>(
  executor: impl PgExecutor<'e>,
  bill_id: Uuid,
) -> Result<Vec<InvoiceLine>, BillError> {
  let query = format!("SELECT {LINE_COLUMNS} FROM invoice_lines WHERE bill_id = $1 ORDER BY seq");
  let rows = sqlx::query_as::<_, InvoiceLineRow>(&query)
    .bind(bill_id)
    .fetch_all(executor)
    .await?;

  rows.into_iter().map(InvoiceLine::try_from).collect()
}

pub struct PostgresInvoiceLineRepository {
  pool: PgPool,
}

impl PostgresInvoiceLineRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl InvoiceLineRepository for PostgresInvoiceLineRepository {
  async fn find_by_bill_id(&self, bill_id: Uuid) -> Result<Vec<InvoiceLine>, BillError> {
    select_lines(&self.pool, bill_id).await
  }
}
