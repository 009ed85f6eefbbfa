pub mod email;
pub mod queue;
pub mod templates;

pub use email::*;
pub use queue::*;
