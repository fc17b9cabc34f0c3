/// Router Module Index
///
/// Organizes the routing logic into security-segregated modules, so access
/// control is applied explicitly at the module level (via axum layers) and a
/// protected endpoint cannot be exposed by accident.

/// Routes accessible to all clients (anonymous, read-only, plus registration).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated user session.
pub mod authenticated;

/// Routes restricted exclusively to users with the admin role.
pub mod admin;
