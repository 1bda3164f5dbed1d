use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
  #[error("Invalid reference: {0}")]
  InvalidReference(String),
  #[error("Invalid currency code: {0}")]
  InvalidCurrency(String),
  #[error("Invalid status: {0}")]
  InvalidStatus(String),
  #[error("Invalid amount: {0}")]
  InvalidAmount(String),
  #[error("Amount overflow: {0}")]
  AmountOverflow(String),
  #[error("Invalid tax rate: {0}")]
  InvalidTaxRate(String),
  #[error("Invalid line description: {0}")]
  InvalidDescription(String),
  #[error("Invalid quantity: {0}")]
  InvalidQuantity(String),
  #[error("Invalid billable: {0}")]
  InvalidBillable(String),
}

// Bill Reference - External, unique identifier of a bill
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillReference(String);

impl BillReference {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidReference(
        "Reference cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 100 {
      return Err(ValueObjectError::InvalidReference(
        "Reference cannot exceed 100 characters".to_string(),
      ));
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c == '/') {
      return Err(ValueObjectError::InvalidReference(
        "Reference cannot contain whitespace or '/'".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for BillReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Bill Status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
  #[default]
  Concept,
  Sent,
  Paid,
  Cancelled,
}

impl BillStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      BillStatus::Concept => "concept",
      BillStatus::Sent => "sent",
      BillStatus::Paid => "paid",
      BillStatus::Cancelled => "cancelled",
    }
  }
}

impl FromStr for BillStatus {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "concept" => Ok(BillStatus::Concept),
      "sent" => Ok(BillStatus::Sent),
      "paid" => Ok(BillStatus::Paid),
      "cancelled" => Ok(BillStatus::Cancelled),
      _ => Err(ValueObjectError::InvalidStatus(format!(
        "Unknown status: {}",
        s
      ))),
    }
  }
}

// Currency - ISO 4217
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
  #[default]
  EUR,
  USD,
  GBP,
  DKK,
  SEK,
  NOK,
}

impl Currency {
  pub fn as_str(&self) -> &'static str {
    match self {
      Currency::EUR => "EUR",
      Currency::USD => "USD",
      Currency::GBP => "GBP",
      Currency::DKK => "DKK",
      Currency::SEK => "SEK",
      Currency::NOK => "NOK",
    }
  }

  pub fn symbol(&self) -> &'static str {
    match self {
      Currency::EUR => "€",
      Currency::USD => "$",
      Currency::GBP => "£",
      Currency::DKK | Currency::SEK | Currency::NOK => "kr",
    }
  }
}

impl FromStr for Currency {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_uppercase().as_str() {
      "EUR" => Ok(Currency::EUR),
      "USD" => Ok(Currency::USD),
      "GBP" => Ok(Currency::GBP),
      "DKK" => Ok(Currency::DKK),
      "SEK" => Ok(Currency::SEK),
      "NOK" => Ok(Currency::NOK),
      _ => Err(ValueObjectError::InvalidCurrency(format!(
        "Unsupported currency: {}",
        s
      ))),
    }
  }
}

/// Non-negative amount in the smallest currency unit (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Cents(i64);

impl Cents {
  pub const ZERO: Cents = Cents(0);

  pub fn new(value: i64) -> Result<Self, ValueObjectError> {
    if value < 0 {
      return Err(ValueObjectError::InvalidAmount(format!(
        "Amount cannot be negative: {}",
        value
      )));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> i64 {
    self.0
  }

  pub fn checked_add(self, other: Cents) -> Result<Cents, ValueObjectError> {
    self
      .0
      .checked_add(other.0)
      .map(Cents)
      .ok_or_else(|| ValueObjectError::AmountOverflow(format!("{} + {}", self.0, other.0)))
  }

  /// Major units with two decimals, e.g. 1210 -> 12.10
  pub fn to_decimal(&self) -> Decimal {
    Decimal::new(self.0, 2)
  }

  /// Rounds half away from zero to the nearest minor unit.
  pub fn round_from(value: Decimal) -> Result<Self, ValueObjectError> {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let cents = rounded
      .to_i64()
      .ok_or_else(|| ValueObjectError::AmountOverflow(value.to_string()))?;
    Self::new(cents)
  }
}

impl TryFrom<i64> for Cents {
  type Error = ValueObjectError;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl From<Cents> for i64 {
  fn from(value: Cents) -> Self {
    value.0
  }
}

impl fmt::Display for Cents {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:.2}", self.to_decimal())
  }
}

/// Tax rate as a fraction, 0.21 for 21%.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
  pub const ZERO: TaxRate = TaxRate(Decimal::ZERO);

  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value.is_sign_negative() && !value.is_zero() {
      return Err(ValueObjectError::InvalidTaxRate(format!(
        "Tax rate cannot be negative: {}",
        value
      )));
    }
    Ok(Self(value.normalize()))
  }

  pub fn from_f64(value: f64) -> Result<Self, ValueObjectError> {
    if !value.is_finite() {
      return Err(ValueObjectError::InvalidTaxRate(format!(
        "Tax rate must be a finite number: {}",
        value
      )));
    }
    let decimal = Decimal::from_f64(value).ok_or_else(|| {
      ValueObjectError::InvalidTaxRate(format!("Tax rate out of range: {}", value))
    })?;
    Self::new(decimal)
  }

  pub fn value(&self) -> Decimal {
    self.0
  }

  pub fn is_zero(&self) -> bool {
    self.0.is_zero()
  }

  pub fn as_percentage(&self) -> Decimal {
    (self.0 * Decimal::ONE_HUNDRED).normalize()
  }
}

impl fmt::Display for TaxRate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}%", self.as_percentage())
  }
}

// Line Description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineDescription(String);

impl LineDescription {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 500 {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot exceed 500 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

// Quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
  pub const ONE: Quantity = Quantity(1);

  pub fn new(value: i64) -> Result<Self, ValueObjectError> {
    if value < 1 {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity must be at least 1".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> i64 {
    self.0
  }
}

impl Default for Quantity {
  fn default() -> Self {
    Self::ONE
  }
}

/// One named component of a line's tax, e.g. a federal and a state part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxComponent {
  pub name: String,
  pub rate: TaxRate,
  pub amount: Cents,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxDetails(Vec<TaxComponent>);

impl TaxDetails {
  pub fn new(components: Vec<TaxComponent>) -> Self {
    Self(components)
  }

  pub fn single(name: impl Into<String>, rate: TaxRate, amount: Cents) -> Self {
    Self(vec![TaxComponent {
      name: name.into(),
      rate,
      amount,
    }])
  }

  pub fn components(&self) -> &[TaxComponent] {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
