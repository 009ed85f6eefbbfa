//! Document store collection names shared across cells.

pub const USERS_COLLECTION: &str = "users";
pub const SESSIONS_COLLECTION: &str = "sessions";
pub const LAWYERS_COLLECTION: &str = "lawyers";
pub const APPOINTMENTS_COLLECTION: &str = "appointments";
