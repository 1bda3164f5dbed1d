pub mod bills;
pub mod health;
