//! Bills and invoice lines for any billable entity.
//!
//! `domain::bill` holds the aggregate and its arithmetic, `application::bill`
//! the use cases, `infrastructure` the storage, rendering and PDF
//! collaborators, and `adapters::http` the actix-web surface.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
