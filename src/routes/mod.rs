/// Router Module Index
///
/// Organizes routing into access-segregated modules. Access control is applied to each
/// module as a whole by `create_router`, so a route's protection follows from the module
/// it is declared in.

/// Routes accessible to all clients.
pub mod public;

/// Routes behind the authentication stage of the gate.
pub mod authenticated;

/// Routes behind the full gate (authentication, then the admin role check).
pub mod admin;
