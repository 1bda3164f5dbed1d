pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod routes;

pub use dtos::{AddLineRequest, BillViewQuery, CreateBillRequest, ErrorResponse, HealthResponse};
pub use errors::ApiError;
pub use routes::{BillRouteDependencies, configure_bill_routes};
