pub mod session_auth;

pub use session_auth::{bearer_token, session_auth_middleware, AuthUser};
