// handlers/protected/mod.rs - Handlers that need a verified caller
//
// Every handler here takes `AuthContext` and is mounted behind a `Guard`.
// Routes that allow any role still do their own self-or-admin checks.
pub mod notifications;
pub mod payments;
pub mod session;
pub mod users;
