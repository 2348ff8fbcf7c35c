//! Authentication and role extractors.
//!
//! - [`auth::AuthUser`] -- the caller identified by a Bearer token.
//! - [`rbac::RequireAdmin`] -- `Administrador` only.
//! - [`rbac::RequireOversight`] -- `Administrador` or `SST`.
//! - [`rbac::RequireAuth`] -- any signed-in user.

pub mod auth;
pub mod rbac;
