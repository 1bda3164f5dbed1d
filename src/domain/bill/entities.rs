use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::billable::BillableRef;
use super::errors::BillError;
use super::tax::{self, TaxSplit};
use super::value_objects::{
  BillReference, BillStatus, Cents, Currency, LineDescription, Quantity, TaxDetails, TaxRate,
  ValueObjectError,
};

// Invoice Line - One billable line on a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
  pub id: Uuid,
  pub bill_id: Uuid,
  pub billable: Option<BillableRef>,
  pub name: Option<String>,
  pub description: LineDescription,
  /// Tax-exclusive amount
  pub amount: Cents,
  pub tax: Cents,
  pub tax_percentage: TaxRate,
  pub tax_details: TaxDetails,
  pub discount: Cents,
  pub quantity: Quantity,
  pub is_free: bool,
  pub is_complimentary: bool,
  pub created_at: DateTime<Utc>,
}

impl InvoiceLine {
  pub fn new(
    bill_id: Uuid,
    description: LineDescription,
    split: TaxSplit,
    tax_percentage: TaxRate,
  ) -> Self {
    let tax_details = if tax_percentage.is_zero() {
      TaxDetails::default()
    } else {
      TaxDetails::single("tax", tax_percentage, split.tax)
    };

    Self {
      id: Uuid::new_v4(),
      bill_id,
      billable: None,
      name: None,
      description,
      amount: split.amount,
      tax: split.tax,
      tax_percentage,
      tax_details,
      discount: Cents::ZERO,
      quantity: Quantity::ONE,
      is_free: false,
      is_complimentary: false,
      created_at: Utc::now(),
    }
  }

  /// Line for an amount that does not yet include tax.
  pub fn excluding_tax(
    bill_id: Uuid,
    amount: i64,
    description: impl Into<String>,
    tax_percentage: f64,
  ) -> Result<Self, ValueObjectError> {
    let amount = Cents::new(amount)?;
    let rate = TaxRate::from_f64(tax_percentage)?;
    let description = LineDescription::new(description)?;
    let split = tax::split_exclusive(amount, rate)?;
    Ok(Self::new(bill_id, description, split, rate))
  }

  /// Line for an amount that already includes tax.
  pub fn including_tax(
    bill_id: Uuid,
    total: i64,
    description: impl Into<String>,
    tax_percentage: f64,
  ) -> Result<Self, ValueObjectError> {
    let total = Cents::new(total)?;
    let rate = TaxRate::from_f64(tax_percentage)?;
    let description = LineDescription::new(description)?;
    let split = tax::split_inclusive(total, rate)?;
    Ok(Self::new(bill_id, description, split, rate))
  }

  pub fn with_billable(mut self, billable: Option<BillableRef>) -> Self {
    self.billable = billable;
    self
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn with_discount(mut self, discount: Cents) -> Self {
    self.discount = discount;
    self
  }

  pub fn with_quantity(mut self, quantity: Quantity) -> Self {
    self.quantity = quantity;
    self
  }

  pub fn with_tax_details(mut self, tax_details: TaxDetails) -> Self {
    self.tax_details = tax_details;
    self
  }

  pub fn free(mut self) -> Self {
    self.is_free = true;
    self
  }

  pub fn complimentary(mut self) -> Self {
    self.is_complimentary = true;
    self
  }

  pub fn total(&self) -> Result<Cents, ValueObjectError> {
    self.amount.checked_add(self.tax)
  }
}

// Bill Totals - Derived from the lines at the last recalculation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillTotals {
  pub subtotal: Cents,
  pub tax: Cents,
  pub grand_total: Cents,
}

impl BillTotals {
  pub fn calculate(lines: &[InvoiceLine]) -> Result<Self, ValueObjectError> {
    let subtotal = lines
      .iter()
      .try_fold(Cents::ZERO, |acc, line| acc.checked_add(line.amount))?;
    let tax = lines
      .iter()
      .try_fold(Cents::ZERO, |acc, line| acc.checked_add(line.tax))?;
    let grand_total = subtotal.checked_add(tax)?;

    Ok(Self {
      subtotal,
      tax,
      grand_total,
    })
  }
}

// Bill - The billing document attached to a billable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
  pub id: Uuid,
  pub reference: BillReference,
  pub billable: BillableRef,
  pub currency: Currency,
  pub status: BillStatus,
  pub note: Option<String>,
  pub lines: Vec<InvoiceLine>,
  pub totals: BillTotals,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(skip)]
  pub(crate) stale: bool,
}

impl Bill {
  pub fn new(reference: BillReference, billable: BillableRef, currency: Currency) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      reference,
      billable,
      currency,
      status: BillStatus::default(),
      note: None,
      lines: Vec::new(),
      totals: BillTotals::default(),
      created_at: now,
      updated_at: now,
      stale: false,
    }
  }

  /// Appends a line. Totals are stale until `recalculate` runs.
  pub fn attach_line(&mut self, line: InvoiceLine) -> Result<&InvoiceLine, BillError> {
    if line.bill_id != self.id {
      return Err(BillError::LineOwnerMismatch {
        line_bill_id: line.bill_id,
        bill_id: self.id,
      });
    }

    self.lines.push(line);
    self.stale = true;
    self.updated_at = Utc::now();
    Ok(&self.lines[self.lines.len() - 1])
  }

  pub fn add_amount_excl_tax(
    &mut self,
    amount: i64,
    description: impl Into<String>,
    tax_percentage: f64,
  ) -> Result<&InvoiceLine, BillError> {
    let line = InvoiceLine::excluding_tax(self.id, amount, description, tax_percentage)?;
    self.attach_line(line)
  }

  pub fn add_amount_incl_tax(
    &mut self,
    total: i64,
    description: impl Into<String>,
    tax_percentage: f64,
  ) -> Result<&InvoiceLine, BillError> {
    let line = InvoiceLine::including_tax(self.id, total, description, tax_percentage)?;
    self.attach_line(line)
  }

  pub fn recalculate(&mut self) -> Result<&Self, BillError> {
    let totals = BillTotals::calculate(&self.lines)?;
    if totals != self.totals {
      self.updated_at = Utc::now();
    }
    self.totals = totals;
    self.stale = false;
    tracing::debug!(
      reference = %self.reference,
      lines = self.lines.len(),
      grand_total = totals.grand_total.value(),
      "Bill recalculated"
    );
    Ok(self)
  }

  pub fn is_stale(&self) -> bool {
    self.stale
  }

  pub fn set_status(&mut self, status: BillStatus) {
    self.status = status;
    self.updated_at = Utc::now();
  }

  pub fn set_note(&mut self, note: Option<String>) {
    self.note = note.filter(|n| !n.trim().is_empty());
    self.updated_at = Utc::now();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_bill() -> Bill {
    Bill::new(
      BillReference::new("2024-05-01-ABC123").unwrap(),
      BillableRef::new("42", "customer").unwrap(),
      Currency::EUR,
    )
  }

  #[test]
  fn test_bill_creation() {
    let bill = new_bill();
    assert!(bill.lines.is_empty());
    assert_eq!(bill.totals, BillTotals::default());
    assert_eq!(bill.status, BillStatus::Concept);
    assert!(!bill.is_stale());
  }

  #[test]
  fn test_ids_are_generated_per_instance() {
    let a = new_bill();
    let b = new_bill();
    assert_ne!(a.id, b.id);

    let l1 = InvoiceLine::excluding_tax(a.id, 1, "a", 0.0).unwrap();
    let l2 = InvoiceLine::excluding_tax(a.id, 1, "a", 0.0).unwrap();
    assert_ne!(l1.id, l2.id);
  }

  #[test]
  fn test_add_amount_excl_tax() {
    let mut bill = new_bill();
    let line = bill.add_amount_excl_tax(1000, "service", 0.21).unwrap();
    assert_eq!(line.amount.value(), 1000);
    assert_eq!(line.tax.value(), 210);
    assert_eq!(line.tax_details.components()[0].amount.value(), 210);
    assert!(bill.is_stale());

    let totals = bill.recalculate().unwrap().totals;
    assert_eq!(totals.subtotal.value(), 1000);
    assert_eq!(totals.tax.value(), 210);
    assert_eq!(totals.grand_total.value(), 1210);
    assert!(!bill.is_stale());
  }

  #[test]
  fn test_add_amount_incl_tax() {
    let mut bill = new_bill();
    let line = bill.add_amount_incl_tax(1210, "service", 0.21).unwrap();
    assert_eq!(line.amount.value(), 1000);
    assert_eq!(line.tax.value(), 210);

    assert_eq!(bill.recalculate().unwrap().totals.grand_total.value(), 1210);
  }

  #[test]
  fn test_zero_rate_has_no_tax_details() {
    let mut bill = new_bill();
    let line = bill.add_amount_excl_tax(500, "exempt", 0.0).unwrap();
    assert!(line.tax_details.is_empty());
    assert_eq!(line.tax, Cents::ZERO);
  }

  #[test]
  fn test_invalid_input_is_rejected_before_mutation() {
    let mut bill = new_bill();
    assert!(matches!(
      bill.add_amount_excl_tax(-1, "negative", 0.21),
      Err(BillError::Validation(ValueObjectError::InvalidAmount(_)))
    ));
    assert!(matches!(
      bill.add_amount_incl_tax(100, "negative rate", -0.1),
      Err(BillError::Validation(ValueObjectError::InvalidTaxRate(_)))
    ));
    assert!(bill.add_amount_excl_tax(100, "  ", 0.21).is_err());
    assert!(bill.lines.is_empty());
    assert!(!bill.is_stale());
  }

  #[test]
  fn test_line_for_other_bill_is_rejected() {
    let mut bill = new_bill();
    let other = new_bill();
    let line = InvoiceLine::excluding_tax(other.id, 100, "foreign", 0.0).unwrap();

    let err = bill.attach_line(line).unwrap_err();
    assert!(matches!(err, BillError::LineOwnerMismatch { .. }));
    assert!(bill.lines.is_empty());
  }

  #[test]
  fn test_recalculate_is_idempotent() {
    let mut bill = new_bill();
    bill.add_amount_excl_tax(1000, "a", 0.21).unwrap();
    bill.add_amount_incl_tax(999, "b", 0.09).unwrap();

    let first = bill.recalculate().unwrap().totals;
    let second = bill.recalculate().unwrap().totals;
    assert_eq!(first, second);
  }

  #[test]
  fn test_grand_total_is_subtotal_plus_tax() {
    let mut bill = new_bill();
    let amounts = [1, 17, 250, 1000, 1005, 99_999, 123_457];
    let rates = [0.0, 0.06, 0.09, 0.21, 0.255];

    for (i, amount) in amounts.iter().enumerate() {
      let rate = rates[i % rates.len()];
      if i % 2 == 0 {
        bill.add_amount_excl_tax(*amount, "excl", rate).unwrap();
      } else {
        bill.add_amount_incl_tax(*amount, "incl", rate).unwrap();
      }

      let totals = bill.recalculate().unwrap().totals;
      assert_eq!(
        totals.grand_total.value(),
        totals.subtotal.value() + totals.tax.value()
      );
      let sum: i64 = bill
        .lines
        .iter()
        .map(|l| l.amount.value() + l.tax.value())
        .sum();
      assert_eq!(totals.grand_total.value(), sum);
    }
  }

  #[test]
  fn test_line_modifiers() {
    let bill = new_bill();
    let line = InvoiceLine::excluding_tax(bill.id, 1000, "Gift", 0.21)
      .unwrap()
      .with_name("gift")
      .with_quantity(Quantity::new(2).unwrap())
      .with_discount(Cents::new(100).unwrap())
      .with_billable(Some(BillableRef::new("9", "product").unwrap()))
      .free()
      .complimentary();

    assert_eq!(line.name.as_deref(), Some("gift"));
    assert_eq!(line.quantity.value(), 2);
    assert_eq!(line.discount.value(), 100);
    assert!(line.is_free && line.is_complimentary);
    assert_eq!(line.total().unwrap().value(), 1210);
  }

  #[test]
  fn test_set_note_ignores_blank() {
    let mut bill = new_bill();
    bill.set_note(Some("   ".to_string()));
    assert!(bill.note.is_none());
    bill.set_note(Some("Thanks!".to_string()));
    assert_eq!(bill.note.as_deref(), Some("Thanks!"));
  }
}
