//! Permission model and the Authorization Gate.

pub mod gate;
pub mod permission;

pub use gate::{decide, Decision, Denial, Requirement};
pub use permission::{known, Permission, PermissionError, PermissionSet, DEFAULT_ROLE, SUPER_ADMIN_ROLE};
