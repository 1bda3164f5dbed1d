pub mod add_bill_line;
pub mod create_bill;
pub mod delete_bill;
pub mod download_bill;
pub mod get_bill_details;
pub mod recalculate_bill;
pub mod render_bill;

#[cfg(test)]
pub(crate) mod test_support;

pub use add_bill_line::{AddBillLineCommand, AddBillLineUseCase, LineAmountMode};
pub use create_bill::{CreateBillCommand, CreateBillResponse, CreateBillUseCase};
pub use delete_bill::{DeleteBillCommand, DeleteBillUseCase};
pub use download_bill::{DownloadBillCommand, DownloadBillUseCase};
pub use get_bill_details::{
  BillDetailsResponse, BillTotalsDto, GetBillDetailsCommand, GetBillDetailsUseCase,
  InvoiceLineDto, TaxComponentDto,
};
pub use recalculate_bill::{RecalculateBillCommand, RecalculateBillUseCase};
pub use render_bill::{RenderBillCommand, RenderBillResponse, RenderBillUseCase};
