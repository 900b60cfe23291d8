//! Authentication seam
//!
//! Login, registration and token issuance live in the auth collaborator;
//! this module only verifies bearer tokens and resolves them to a user id
//! and role for the request handlers.

pub mod jwt;
pub mod middleware;

pub use jwt::{create_token, verify_token, JwtConfig, TokenClaims};
pub use middleware::{auth_middleware, AuthState, AuthUser};
