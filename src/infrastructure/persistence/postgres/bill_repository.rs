use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::bill::{
  Bill, BillError, BillReference, BillRepository, BillStatus, BillTotals, BillableRef, Cents,
  Currency, InvoiceLine,
};

use super::invoice_line_repository::{insert_line, select_lines};

const BILL_COLUMNS: &str = "id, reference, billable_id, billable_type, currency, status, note, \
                            subtotal, tax, grand_total, created_at, updated_at";

#[derive(Debug, FromRow)]
struct BillRow {
  id: Uuid,
  reference: String,
  billable_id: String,
  billable_type: String,
  currency: String,
  status: String,
  note: Option<String>,
  subtotal: i64,
  tax: i64,
  grand_total: i64,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<BillRow> for Bill {
  type Error = BillError;

  fn try_from(row: BillRow) -> Result<Self, Self::Error> {
    Ok(Bill {
      id: row.id,
      reference: BillReference::new(row.reference)?,
      billable: BillableRef::new(row.billable_id, row.billable_type)?,
      currency: Currency::from_str(&row.currency)?,
      status: BillStatus::from_str(&row.status)?,
      note: row.note,
      lines: Vec::new(),
      totals: BillTotals {
        subtotal: Cents::new(row.subtotal)?,
        tax: Cents::new(row.tax)?,
        grand_total: Cents::new(row.grand_total)?,
      },
      created_at: row.created_at,
      updated_at: row.updated_at,
      stale: false,
    })
  }
}

fn map_write_error(error: sqlx::Error, reference: &BillReference) -> BillError {
  match &error {
    sqlx::Error::Database(db) if db.is_unique_violation() => {
      BillError::ReferenceAlreadyExists(reference.value().to_string())
    }
    _ => BillError::Database(error),
  }
}

/// Loads the bill row `FOR UPDATE`, so concurrent line writers wait for
/// this transaction, then loads its lines.
async fn lock_with_lines(
  tx: &mut Transaction<'_, Postgres>,
  bill_id: Uuid,
) -> Result<Bill, BillError> {
  let query = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1 FOR UPDATE");
  let row = sqlx::query_as::<_, BillRow>(&query)
    .bind(bill_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(BillError::BillNotFound(bill_id))?;

  let mut bill = Bill::try_from(row)?;
  bill.lines = select_lines(&mut **tx, bill_id).await?;
  Ok(bill)
}

async fn store_totals(tx: &mut Transaction<'_, Postgres>, bill: &Bill) -> Result<(), BillError> {
  sqlx::query(
    r#"
            UPDATE bills
            SET subtotal = $2, tax = $3, grand_total = $4, updated_at = $5
            WHERE id = $1
            "#,
  )
  .bind(bill.id)
  .bind(bill.totals.subtotal.value())
  .bind(bill.totals.tax.value())
  .bind(bill.totals.grand_total.value())
  .bind(bill.updated_at)
  .execute(&mut **tx)
  .await?;

  Ok(())
}

pub struct PostgresBillRepository {
  pool: PgPool,
}

impl PostgresBillRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl BillRepository for PostgresBillRepository {
  async fn create(&self, bill: Bill) -> Result<Bill, BillError> {
    let query = format!(
      r#"
            INSERT INTO bills (
                id, reference, billable_id, billable_type, currency, status, note,
                subtotal, tax, grand_total, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {BILL_COLUMNS}
            "#
    );

    let row = sqlx::query_as::<_, BillRow>(&query)
      .bind(bill.id)
      .bind(bill.reference.value())
      .bind(bill.billable.id())
      .bind(bill.billable.kind())
      .bind(bill.currency.as_str())
      .bind(bill.status.as_str())
      .bind(bill.note.as_deref())
      .bind(bill.totals.subtotal.value())
      .bind(bill.totals.tax.value())
      .bind(bill.totals.grand_total.value())
      .bind(bill.created_at)
      .bind(bill.updated_at)
      .fetch_one(&self.pool)
      .await
      .map_err(|e| map_write_error(e, &bill.reference))?;

    row.try_into()
  }

  async fn add_line(&self, bill_id: Uuid, line: InvoiceLine) -> Result<Bill, BillError> {
    let mut tx = self.pool.begin().await?;
    let mut bill = lock_with_lines(&mut tx, bill_id).await?;
    // Validated before any write; dropping `tx` rolls back.
    bill.attach_line(line.clone())?;
    bill.recalculate()?;

    insert_line(&mut *tx, &line).await?;
    store_totals(&mut tx, &bill).await?;
    tx.commit().await?;

    Ok(bill)
  }

  async fn recalculate(&self, bill_id: Uuid) -> Result<Bill, BillError> {
    let mut tx = self.pool.begin().await?;
    let mut bill = lock_with_lines(&mut tx, bill_id).await?;
    bill.recalculate()?;

    store_totals(&mut tx, &bill).await?;
    tx.commit().await?;

    Ok(bill)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Bill>, BillError> {
    let query = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1");
    let row = sqlx::query_as::<_, BillRow>(&query)
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;

    row.map(Bill::try_from).transpose()
  }

  async fn find_by_reference(&self, reference: &str) -> Result<Option<Bill>, BillError> {
    let query = format!("SELECT {BILL_COLUMNS} FROM bills WHERE reference = $1");
    let row = sqlx::query_as::<_, BillRow>(&query)
      .bind(reference)
      .fetch_optional(&self.pool)
      .await?;

    row.map(Bill::try_from).transpose()
  }

  async fn exists_by_reference(&self, reference: &str) -> Result<bool, BillError> {
    let exists: bool =
      sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bills WHERE reference = $1)")
        .bind(reference)
        .fetch_one(&self.pool)
        .await?;

    Ok(exists)
  }

  async fn delete(&self, id: Uuid) -> Result<(), BillError> {
    // invoice_lines rows go with it (ON DELETE CASCADE)
    sqlx::query("DELETE FROM bills WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?;

    Ok(())
  }
}
