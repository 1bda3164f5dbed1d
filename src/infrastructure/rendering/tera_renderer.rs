use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error as _;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::domain::bill::{Bill, BillError, BillRenderer, Cents, RenderedBill, ViewData};

pub const BILL_TEMPLATE: &str = "bill.html.tera";

const BUILTIN_BILL_TEMPLATE: &str = include_str!("../../../templates/bill.html.tera");

/// Renders bills to HTML with Tera.
///
/// A `bill.html.tera` found in the custom templates directory replaces the
/// built-in layout.
#[derive(Clone)]
pub struct TeraBillRenderer {
  tera: Arc<Tera>,
}

impl TeraBillRenderer {
  pub fn new(templates_dir: Option<&Path>) -> Result<Self, tera::Error> {
    let mut tera = match templates_dir {
      Some(dir) => Tera::new(&format!("{}/**/*.html.tera", dir.display()))?,
      None => Tera::default(),
    };

    if !tera.get_template_names().any(|name| name == BILL_TEMPLATE) {
      tera.add_raw_template(BILL_TEMPLATE, BUILTIN_BILL_TEMPLATE)?;
    }
    tera.autoescape_on(vec!["html.tera", ".html"]);
    tera.register_filter("money", money_filter);
    tera.register_filter("percentage", percentage_filter);

    Ok(Self {
      tera: Arc::new(tera),
    })
  }

  fn context(bill: &Bill, data: &ViewData) -> Context {
    let mut context = Context::new();
    for (key, value) in data.iter() {
      context.insert(key.as_str(), value);
    }
    // Set last so view data cannot shadow them
    context.insert("bill", bill);
    context.insert("currency_symbol", bill.currency.symbol());
    context
  }
}

impl BillRenderer for TeraBillRenderer {
  fn render(&self, bill: &Bill, data: &ViewData) -> Result<RenderedBill, BillError> {
    let html = self
      .tera
      .render(BILL_TEMPLATE, &Self::context(bill, data))
      .map_err(|e| BillError::Rendering(describe(&e)))?;

    Ok(RenderedBill { html })
  }
}

// Tera wraps the useful message a few levels down
fn describe(error: &tera::Error) -> String {
  let mut message = error.to_string();
  let mut source = error.source();
  while let Some(cause) = source {
    message.push_str(": ");
    message.push_str(&cause.to_string());
    source = cause.source();
  }
  message
}

/// `{{ 1210 | money }}` -> `12.10`
fn money_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
  let cents = value
    .as_i64()
    .ok_or_else(|| tera::Error::msg(format!("money filter expects cents, got {}", value)))?;
  let cents = Cents::new(cents).map_err(|e| tera::Error::msg(e.to_string()))?;
  Ok(Value::String(cents.to_string()))
}

/// `{{ "0.21" | percentage }}` -> `21%`
fn percentage_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
  let rate = match value {
    Value::String(s) => Decimal::from_str(s).ok(),
    Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
    _ => None,
  }
  .ok_or_else(|| tera::Error::msg(format!("percentage filter expects a rate, got {}", value)))?;

  Ok(Value::String(format!(
    "{}%",
    (rate * Decimal::ONE_HUNDRED).normalize()
  )))
}
