pub mod branch;
pub mod inventory;
pub mod product;
pub mod store;
pub mod user;
