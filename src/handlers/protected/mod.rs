// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every route here runs behind `authenticate` and the route's declared
// requirement. Handlers receive the live identity as `Extension<ResolvedIdentity>`.

pub mod auth;
pub mod roles;
pub mod users;
