pub mod jwt_auth;
pub mod role_guard;

pub use jwt_auth::{AuthUser, JwtAuthMiddleware, MaybeAuthUser};
pub use role_guard::RequireRole;
