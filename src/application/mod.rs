//! Application layer
//!
//! This layer contains use cases that orchestrate domain logic to implement
//! application-specific workflows. Use cases resolve a bill by reference and
//! hand the work to `BillService`.

pub mod bill;
