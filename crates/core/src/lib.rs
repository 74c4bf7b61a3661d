//! Shared domain types for the Keystone platform server.

pub mod error;
pub mod group;
pub mod roles;
pub mod types;
