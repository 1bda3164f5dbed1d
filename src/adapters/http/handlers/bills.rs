use actix_web::http::header::{
  self, ContentDisposition, DispositionParam, DispositionType, HeaderValue,
};
use actix_web::{HttpResponse, web};
use std::sync::Arc;
use validator::Validate;

use crate::adapters::http::{
  dtos::{AddLineRequest, BillViewQuery, CreateBillRequest},
  errors::ApiError,
};
use crate::application::bill::{
  AddBillLineCommand, AddBillLineUseCase, CreateBillCommand, CreateBillUseCase, DeleteBillCommand,
  DeleteBillUseCase, DownloadBillCommand, DownloadBillUseCase, GetBillDetailsCommand,
  GetBillDetailsUseCase, RecalculateBillCommand, RecalculateBillUseCase, RenderBillCommand,
  RenderBillUseCase,
};
use crate::domain::bill::BillDownload;

/// POST /bills
/// Body: CreateBillRequest (JSON)
/// Response: CreateBillResponse (JSON) with status 201
pub async fn create_bill_handler(
  request: web::Json<CreateBillRequest>,
  use_case: web::Data<Arc<CreateBillUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let response = use_case
    .execute(CreateBillCommand {
      billable_id: request.billable_id,
      billable_type: request.billable_type,
      reference: request.reference,
      currency: request.currency,
      status: request.status,
      note: request.note,
    })
    .await?;

  Ok(HttpResponse::Created().json(response))
}

/// GET /bills/{reference}
pub async fn get_bill_handler(
  path: web::Path<String>,
  use_case: web::Data<Arc<GetBillDetailsUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case
    .execute(GetBillDetailsCommand {
      reference: path.into_inner(),
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// POST /bills/{reference}/lines
/// Body: AddLineRequest (JSON)
/// Response: BillDetailsResponse (JSON) with status 201
pub async fn add_line_handler(
  path: web::Path<String>,
  request: web::Json<AddLineRequest>,
  use_case: web::Data<Arc<AddBillLineUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let response = use_case
    .execute(AddBillLineCommand {
      reference: path.into_inner(),
      mode: request.mode,
      amount: request.amount,
      description: request.description,
      tax_percentage: request.tax_percentage,
      billable_id: request.billable_id,
      billable_type: request.billable_type,
    })
    .await?;

  Ok(HttpResponse::Created().json(response))
}

/// POST /bills/{reference}/recalculate
pub async fn recalculate_bill_handler(
  path: web::Path<String>,
  use_case: web::Data<Arc<RecalculateBillUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case
    .execute(RecalculateBillCommand {
      reference: path.into_inner(),
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// GET /bills/{reference}/html
pub async fn view_bill_handler(
  path: web::Path<String>,
  query: web::Query<BillViewQuery>,
  use_case: web::Data<Arc<RenderBillUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case
    .execute(RenderBillCommand {
      reference: path.into_inner(),
      view_data: query.into_inner().into(),
    })
    .await?;

  Ok(
    HttpResponse::Ok()
      .content_type("text/html; charset=utf-8")
      .body(response.html),
  )
}

/// GET /bills/{reference}/pdf
pub async fn download_bill_handler(
  path: web::Path<String>,
  query: web::Query<BillViewQuery>,
  use_case: web::Data<Arc<DownloadBillUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let download = use_case
    .execute(DownloadBillCommand {
      reference: path.into_inner(),
      view_data: query.into_inner().into(),
    })
    .await?;

  Ok(download_response(download))
}

/// DELETE /bills/{reference}
pub async fn delete_bill_handler(
  path: web::Path<String>,
  use_case: web::Data<Arc<DeleteBillUseCase>>,
) -> Result<HttpResponse, ApiError> {
  use_case
    .execute(DeleteBillCommand {
      reference: path.into_inner(),
    })
    .await?;

  Ok(HttpResponse::NoContent().finish())
}

/// Builds the attachment response for a rendered PDF.
pub fn download_response(download: BillDownload) -> HttpResponse {
  let disposition = ContentDisposition {
    disposition: DispositionType::Attachment,
    parameters: vec![DispositionParam::Filename(download.filename)],
  };

  HttpResponse::Ok()
    .content_type(download.content_type)
    .insert_header(disposition)
    .insert_header((header::CONTENT_LENGTH, HeaderValue::from(download.bytes.len())))
    .body(download.bytes)
}
