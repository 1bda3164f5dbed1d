pub mod bill;

pub use bill::*;
