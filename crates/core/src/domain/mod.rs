pub mod campaign;
pub mod inventory;
pub mod product;
pub mod sale;
