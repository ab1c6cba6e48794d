//! Presentation-side access control: the API client, the observable identity
//! context, the view table, the route guard and navigation.

pub mod api;
pub mod guard;
pub mod identity;
pub mod nav;
pub mod views;

pub use api::ApiClient;
pub use guard::{evaluate, GuardState, Navigator, RouteGuard};
pub use identity::{IdentityContext, IdentitySource, IdentityState, Refresh};
pub use nav::{navigation_links, refreshed_navigation, NavLink};
pub use views::{find_view, View, HOME_PATH, LOGIN_PATH, VIEWS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("not signed in: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{code} ({status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
