// handlers/mod.rs - Handlers grouped by the guard they sit behind
//
// Public (no credential) → Protected (any verified caller with a profile)
// → Elevated (admin only). The tier only says where a handler lives; the
// guard attached in app.rs is what actually enforces it.
pub mod elevated;
pub mod protected;
pub mod public;
