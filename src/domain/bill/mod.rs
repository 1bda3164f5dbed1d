pub mod billable;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod tax;
pub mod value_objects;

pub use billable::{Billable, BillableRef};
pub use entities::{Bill, BillTotals, InvoiceLine};
pub use errors::BillError;
pub use ports::{
  BillRenderer, BillRepository, InvoiceLineRepository, PdfGenerator, ReferenceGenerator,
  RenderedBill, ViewData,
};
pub use services::{BillDownload, BillService, BillServiceDependencies, NewBill};
pub use tax::TaxSplit;
pub use value_objects::{
  BillReference, BillStatus, Cents, Currency, LineDescription, Quantity, TaxComponent,
  TaxDetails, TaxRate, ValueObjectError,
};
