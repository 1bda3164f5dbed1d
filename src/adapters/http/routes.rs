use actix_web::web;
use std::sync::Arc;

use crate::application::bill::{
  AddBillLineUseCase, CreateBillUseCase, DeleteBillUseCase, DownloadBillUseCase,
  GetBillDetailsUseCase, RecalculateBillUseCase, RenderBillUseCase,
};
use crate::domain::bill::BillService;

use super::handlers::bills::{
  add_line_handler, create_bill_handler, delete_bill_handler, download_bill_handler,
  get_bill_handler, recalculate_bill_handler, view_bill_handler,
};
use super::handlers::health::health_check;

/// Use cases served by the bill routes
#[derive(Clone)]
pub struct BillRouteDependencies {
  pub create_bill_use_case: Arc<CreateBillUseCase>,
  pub get_bill_details_use_case: Arc<GetBillDetailsUseCase>,
  pub add_bill_line_use_case: Arc<AddBillLineUseCase>,
  pub recalculate_bill_use_case: Arc<RecalculateBillUseCase>,
  pub render_bill_use_case: Arc<RenderBillUseCase>,
  pub download_bill_use_case: Arc<DownloadBillUseCase>,
  pub delete_bill_use_case: Arc<DeleteBillUseCase>,
}

impl BillRouteDependencies {
  pub fn from_service(bill_service: Arc<BillService>) -> Self {
    Self {
      create_bill_use_case: Arc::new(CreateBillUseCase::new(bill_service.clone())),
      get_bill_details_use_case: Arc::new(GetBillDetailsUseCase::new(bill_service.clone())),
      add_bill_line_use_case: Arc::new(AddBillLineUseCase::new(bill_service.clone())),
      recalculate_bill_use_case: Arc::new(RecalculateBillUseCase::new(bill_service.clone())),
      render_bill_use_case: Arc::new(RenderBillUseCase::new(bill_service.clone())),
      download_bill_use_case: Arc::new(DownloadBillUseCase::new(bill_service.clone())),
      delete_bill_use_case: Arc::new(DeleteBillUseCase::new(bill_service)),
    }
  }
}

/// Configure bill routes
///
/// # Routes
///
/// - POST /bills - Create a bill for a billable
/// - GET /bills/{reference} - Bill details with lines and totals
/// - DELETE /bills/{reference} - Delete a bill and its lines
/// - POST /bills/{reference}/lines - Add a line (`excl_tax` or `incl_tax`)
/// - POST /bills/{reference}/recalculate - Recompute and store totals
/// - GET /bills/{reference}/html - Rendered bill
/// - GET /bills/{reference}/pdf - PDF download
/// - GET /health - Liveness check
pub fn configure_bill_routes(cfg: &mut web::ServiceConfig, deps: BillRouteDependencies) {
  cfg
    .app_data(web::Data::new(deps.create_bill_use_case))
    .app_data(web::Data::new(deps.get_bill_details_use_case))
    .app_data(web::Data::new(deps.add_bill_line_use_case))
    .app_data(web::Data::new(deps.recalculate_bill_use_case))
    .app_data(web::Data::new(deps.render_bill_use_case))
    .app_data(web::Data::new(deps.download_bill_use_case))
    .app_data(web::Data::new(deps.delete_bill_use_case))
    .route("/health", web::get().to(health_check))
    .service(
      web::scope("/bills")
        .route("", web::post().to(create_bill_handler))
        .service(
          web::resource("/{reference}")
            .route(web::get().to(get_bill_handler))
            .route(web::delete().to(delete_bill_handler)),
        )
        .route("/{reference}/lines", web::post().to(add_line_handler))
        .route(
          "/{reference}/recalculate",
          web::post().to(recalculate_bill_handler),
        )
        .route("/{reference}/html", web::get().to(view_bill_handler))
        .route("/{reference}/pdf", web::get().to(download_bill_handler)),
    );
}
