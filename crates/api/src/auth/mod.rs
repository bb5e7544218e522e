//! Authentication: JWT bearer tokens for end users; the internal
//! self-invocation channel uses the continuation tokens from
//! [`gala_core::token`].

pub mod jwt;

/// Role name granted unrestricted access to upload jobs.
pub const ROLE_ADMIN: &str = "admin";
