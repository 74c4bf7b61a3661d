//! Well-known role name constants carried in access-token claims.

pub const ROLE_ADMIN: &str = "admin";
