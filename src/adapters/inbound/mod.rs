mod api_server;

pub use api_server::{router, ApiError, ApiServer, ApiState, CurrentUser, Session};

// Re-export for external use (e.g., integration tests)
#[allow(unused_imports)]
pub use api_server::{SESSION_HEADER, USERNAME_HEADER, USER_ID_HEADER};
