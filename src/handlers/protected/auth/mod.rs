// handlers/protected/auth/mod.rs - Current-session endpoints

pub mod me;

pub use me::{me_get, me_put};
