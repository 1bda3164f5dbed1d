//! Tax arithmetic for invoice lines.
//!
//! All amounts are integer minor units. Intermediate values are computed in
//! `Decimal` and rounded half away from zero to the nearest minor unit, so an
//! amount split from a tax-inclusive total always adds back up to that total.

use rust_decimal::Decimal;

use super::value_objects::{Cents, TaxRate, ValueObjectError};

/// Tax-exclusive amount and the tax on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxSplit {
  pub amount: Cents,
  pub tax: Cents,
}

impl TaxSplit {
  pub fn total(&self) -> Result<Cents, ValueObjectError> {
    self.amount.checked_add(self.tax)
  }
}

/// `amount` excludes tax; tax = round(amount * rate).
pub fn split_exclusive(amount: Cents, rate: TaxRate) -> Result<TaxSplit, ValueObjectError> {
  let tax = Decimal::from(amount.value())
    .checked_mul(rate.value())
    .ok_or_else(|| overflow(amount, rate))?;

  Ok(TaxSplit {
    amount,
    tax: Cents::round_from(tax)?,
  })
}

/// `total` includes tax; amount = round(total / (1 + rate)), tax = total - amount.
pub fn split_inclusive(total: Cents, rate: TaxRate) -> Result<TaxSplit, ValueObjectError> {
  let divisor = Decimal::ONE
    .checked_add(rate.value())
    .ok_or_else(|| overflow(total, rate))?;
  let amount = Decimal::from(total.value())
    .checked_div(divisor)
    .ok_or_else(|| overflow(total, rate))?;
  let amount = Cents::round_from(amount)?;

  // rate >= 0 keeps amount <= total
  let tax = Cents::new(total.value() - amount.value())?;

  Ok(TaxSplit { amount, tax })
}

fn overflow(amount: Cents, rate: TaxRate) -> ValueObjectError {
  ValueObjectError::AmountOverflow(format!("{} at rate {}", amount.value(), rate.value()))
}
