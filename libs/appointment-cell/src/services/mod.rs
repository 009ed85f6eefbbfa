pub mod availability;
pub mod booking;
pub mod clock;
pub mod dashboard;
pub mod lifecycle;
pub mod repository;

pub use availability::*;
pub use booking::*;
pub use dashboard::*;
pub use repository::*;
