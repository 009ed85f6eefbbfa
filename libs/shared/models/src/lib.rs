pub mod auth;
pub mod collections;
pub mod error;
