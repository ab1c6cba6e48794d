use once_cell::sync::Lazy;

use crate::authz::{known, Requirement};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// A navigable view and what it demands of the signed-in identity.
#[derive(Debug, Clone)]
pub struct View {
    pub path: &'static str,
    pub label: &'static str,
    pub requirement: Requirement,
    /// Listed in the navigation sidebar.
    pub in_nav: bool,
}

pub static VIEWS: Lazy<Vec<View>> = Lazy::new(|| {
    vec![
        View {
            path: HOME_PATH,
            label: "Home",
            requirement: Requirement::Unrestricted,
            in_nav: true,
        },
        View {
            path: "/account",
            label: "Account",
            requirement: Requirement::Unrestricted,
            in_nav: false,
        },
        View {
            path: "/super-admin",
            label: "Admin Dashboard",
            requirement: Requirement::SuperAdminOnly,
            in_nav: true,
        },
        View {
            path: "/manage-users",
            label: "Manage Users",
            requirement: Requirement::any_of([known::MANAGE_USERS]),
            in_nav: true,
        },
        View {
            path: "/manage-roles",
            label: "Manage Roles",
            requirement: Requirement::any_of([known::MANAGE_ROLES]),
            in_nav: true,
        },
        View {
            path: "/manage-posts",
            label: "Manage Posts",
            requirement: Requirement::any_of([known::MANAGE_POSTS]),
            in_nav: true,
        },
        View {
            path: "/create-post",
            label: "Create Post",
            requirement: Requirement::any_of([known::CREATE_POSTS]),
            in_nav: true,
        },
    ]
});

/// Exact path match, ignoring one trailing slash.
pub fn find_view(path: &str) -> Option<&'static View> {
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };
    VIEWS.iter().find(|view| view.path == path)
}
