use chrono::NaiveDate;
use rand::Rng;

use crate::domain::bill::{BillReference, ReferenceGenerator, ValueObjectError};

const REFERENCE_CHARS: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LENGTH: usize = 6;

/// Generates references of the form `YYYY-MM-DD-XXXXXX`
pub struct RandomReferenceGenerator;

impl RandomReferenceGenerator {
  pub fn new() -> Self {
    Self
  }

  fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LENGTH)
      .map(|_| REFERENCE_CHARS[rng.gen_range(0..REFERENCE_CHARS.len())] as char)
      .collect()
  }
}

impl Default for RandomReferenceGenerator {
  fn default() -> Self {
    Self::new()
  }
}

impl ReferenceGenerator for RandomReferenceGenerator {
  fn generate(&self, date: NaiveDate) -> Result<BillReference, ValueObjectError> {
    BillReference::new(format!(
      "{}-{}",
      date.format("%Y-%m-%d"),
      Self::random_suffix()
    ))
  }
}
