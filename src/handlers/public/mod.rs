// handlers/public/mod.rs - Public handlers (no authentication required)

pub mod auth;
pub mod index;

pub use auth::{login, signup};
pub use index::{health, root};
