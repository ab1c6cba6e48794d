// handlers/elevated/mod.rs - Elevated handlers (Super-admin only)

pub mod rbac;

pub use rbac::rbac_report;
