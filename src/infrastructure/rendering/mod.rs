mod tera_renderer;

pub use tera_renderer::{BILL_TEMPLATE, TeraBillRenderer};
