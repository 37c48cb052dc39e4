// handlers/elevated/mod.rs - Admin-only handlers
//
// Mounted behind a `Guard` requiring the admin role; handlers still refuse
// operations an admin must not perform on themselves or on other admins.
pub mod admin;
