pub mod lawyer;
pub mod repository;
pub mod schedule;

pub use lawyer::*;
pub use repository::*;
