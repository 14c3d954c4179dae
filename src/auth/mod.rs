pub mod jwt;
pub mod access;
