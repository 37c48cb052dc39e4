// services/mod.rs - Outbound integrations used by handlers
pub mod payments;
