//! Page routes and the authentication guard in front of them.

use std::fmt;
use uuid::Uuid;

use crate::endpoints::auth::{Role, User};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    RequesterDashboard,
    ProjectDetail(Uuid),
    RaterDashboard,
    ProjectSessions(Uuid),
    Rate(Uuid),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::RequesterDashboard => "/requester/dashboard".to_string(),
            Route::ProjectDetail(id) => format!("/requester/projects/{id}"),
            Route::RaterDashboard => "/rater/dashboard".to_string(),
            Route::ProjectSessions(id) => format!("/projects/{id}/rate"),
            Route::Rate(id) => format!("/sessions/{id}/rate"),
        }
    }

    /// `None` for paths that name no page. `/` is the dashboard.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] | ["dashboard"] => Route::Dashboard,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["requester", "dashboard"] => Route::RequesterDashboard,
            ["requester", "projects", id] => Route::ProjectDetail(id.parse().ok()?),
            ["rater", "dashboard"] => Route::RaterDashboard,
            ["projects", id, "rate"] => Route::ProjectSessions(id.parse().ok()?),
            ["sessions", id, "rate"] => Route::Rate(id.parse().ok()?),
            _ => return None,
        };
        Some(route)
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// The role a route is restricted to, if any.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::RequesterDashboard | Route::ProjectDetail(_) => Some(Role::Requester),
            Route::RaterDashboard => Some(Role::Rater),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// The current user has not been fetched yet.
    Loading,
    Anonymous,
    Authenticated(User),
}

impl AuthState {
    /// State after a `current_user` lookup. Only a rejected session counts as
    /// signed out; other failures say nothing about the user and are returned.
    pub fn from_lookup(result: Result<User, ApiError>) -> Result<Self, ApiError> {
        match result {
            Ok(user) => Ok(AuthState::Authenticated(user)),
            Err(e) if e.requires_login() => Ok(AuthState::Anonymous),
            Err(e) => Err(e),
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render,
    /// Auth is still loading; show a placeholder.
    Wait,
    Redirect(Route),
}

pub fn dashboard_for(role: Role) -> Route {
    match role {
        Role::Requester => Route::RequesterDashboard,
        Role::Rater => Route::RaterDashboard,
    }
}

pub fn guard(route: Route, auth: &AuthState) -> Navigation {
    let user = match auth {
        AuthState::Loading => return Navigation::Wait,
        AuthState::Anonymous if route.is_public() => return Navigation::Render,
        AuthState::Anonymous => return Navigation::Redirect(Route::Login),
        AuthState::Authenticated(user) => user,
    };

    if route.is_public() || route == Route::Dashboard {
        return Navigation::Redirect(dashboard_for(user.role));
    }

    match route.required_role() {
        Some(role) if role != user.role => Navigation::Redirect(dashboard_for(user.role)),
        _ => Navigation::Render,
    }
}

/// Guard a raw path. Unknown paths go to the dashboard.
pub fn guard_path(path: &str, auth: &AuthState) -> Navigation {
    match Route::parse(path) {
        Some(route) => guard(route, auth),
        None => match guard(Route::Dashboard, auth) {
            Navigation::Render => Navigation::Redirect(Route::Dashboard),
            other => other,
        },
    }
}
