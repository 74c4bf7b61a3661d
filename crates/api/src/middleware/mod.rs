//! Request extractors enforcing authentication and authorization.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`managed::RequireUnmanaged`] -- Refuses requests on a managed instance.

pub mod auth;
pub mod managed;
pub mod rbac;
