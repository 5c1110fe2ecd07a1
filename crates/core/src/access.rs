//! Role-gated navigation.
//!
//! Every front-end asks this module, on every navigation, whether a path may
//! be rendered for the current session. The answers are pure functions of
//! `(session, path)`; nothing is cached because the session can end at any
//! moment.
//!
//! These checks decide what the client shows. They are not a security
//! boundary: the backend authorizes every request on its own.
//!
//! # Default-route policy
//!
//! | Session  | `/` and unknown paths  |
//! |----------|------------------------|
//! | none     | `/login`               |
//! | staff    | `/admin`               |
//! | customer | `/customer/products`   |

use crate::types::{ProductId, Role, Session};

/// Path of the login screen.
pub const LOGIN_PATH: &str = "/login";

/// Upper bound on redirects followed by [`navigate`].
const MAX_REDIRECTS: usize = 8;

/// A screen the client can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    /// Staff overview with aggregate stats.
    AdminDashboard,
    AdminProducts,
    AdminOrders,
    /// Customer product list; the customer landing screen.
    CustomerProducts,
    /// Product detail with the order form.
    CustomerProduct(ProductId),
    CustomerOrders,
}

impl Route {
    /// Canonical path of the route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => LOGIN_PATH.to_owned(),
            Self::Register => "/register".to_owned(),
            Self::AdminDashboard => "/admin".to_owned(),
            Self::AdminProducts => "/admin/products".to_owned(),
            Self::AdminOrders => "/admin/orders".to_owned(),
            Self::CustomerProducts => "/customer/products".to_owned(),
            Self::CustomerProduct(id) => format!("/customer/products/{id}"),
            Self::CustomerOrders => "/customer/my-orders".to_owned(),
        }
    }

    /// Role required to render the route; `None` for public screens.
    #[must_use]
    pub const fn required_role(&self) -> Option<Role> {
        match self {
            Self::Login | Self::Register => None,
            Self::AdminDashboard | Self::AdminProducts | Self::AdminOrders => Some(Role::Staff),
            Self::CustomerProducts | Self::CustomerProduct(_) | Self::CustomerOrders => {
                Some(Role::Customer)
            }
        }
    }
}

/// Outcome of checking a session against a required role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Render the protected screen.
    Allow,
    /// Go elsewhere instead.
    Redirect {
        /// Target path.
        to: String,
        /// Originally requested path, captured when the user must log in first.
        from: Option<String>,
    },
}

/// Outcome of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect { to: String, from: Option<String> },
}

impl AccessDecision {
    /// The redirect as a [`Resolution`], or `None` when access is allowed.
    #[must_use]
    pub fn into_redirect(self) -> Option<Resolution> {
        match self {
            Self::Allow => None,
            Self::Redirect { to, from } => Some(Resolution::Redirect { to, from }),
        }
    }
}

/// Final screen reached by [`navigate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub route: Route,
    /// Location captured by a login redirect, to resume after authentication.
    pub from: Option<String>,
}

/// Check `session` against the role a screen requires.
///
/// - no session: redirect to login, capturing `requested_path`
/// - wrong role: redirect to the session role's landing path
/// - matching role: allow
#[must_use]
pub fn guard(session: Option<&Session>, required: Role, requested_path: &str) -> AccessDecision {
    match session {
        None => AccessDecision::Redirect {
            to: LOGIN_PATH.to_owned(),
            from: Some(normalize(requested_path)),
        },
        Some(session) if session.role != required => AccessDecision::Redirect {
            to: session.role.landing_path().to_owned(),
            from: None,
        },
        Some(_) => AccessDecision::Allow,
    }
}

/// Where `/` and unmatched paths send the session.
#[must_use]
pub fn default_path(session: Option<&Session>) -> &'static str {
    session.map_or(LOGIN_PATH, |s| s.role.landing_path())
}

/// Resolve a requested path for the current session.
#[must_use]
pub fn resolve(session: Option<&Session>, path: &str) -> Resolution {
    let normalized = normalize(path);
    let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["login"] => public(session, Route::Login),
        ["register"] => public(session, Route::Register),
        ["admin", rest @ ..] => {
            if let Some(redirect) = guard(session, Role::Staff, &normalized).into_redirect() {
                return redirect;
            }
            match rest {
                [] => Resolution::Render(Route::AdminDashboard),
                ["products"] => Resolution::Render(Route::AdminProducts),
                ["orders"] => Resolution::Render(Route::AdminOrders),
                _ => redirect_to(Route::AdminDashboard.path()),
            }
        }
        ["customer", rest @ ..] => {
            if let Some(redirect) = guard(session, Role::Customer, &normalized).into_redirect() {
                return redirect;
            }
            match rest {
                ["products"] => Resolution::Render(Route::CustomerProducts),
                ["products", id] => id.parse::<ProductId>().map_or_else(
                    |_| redirect_to(Route::CustomerProducts.path()),
                    |id| Resolution::Render(Route::CustomerProduct(id)),
                ),
                ["my-orders"] => Resolution::Render(Route::CustomerOrders),
                _ => redirect_to(Route::CustomerProducts.path()),
            }
        }
        _ => redirect_to(default_path(session).to_owned()),
    }
}

/// Resolve `path` and follow redirects until a screen renders.
///
/// The first login redirect's captured location is kept in
/// [`Navigation::from`].
#[must_use]
pub fn navigate(session: Option<&Session>, path: &str) -> Navigation {
    let mut current = path.to_owned();
    let mut captured = None;

    for _ in 0..MAX_REDIRECTS {
        match resolve(session, &current) {
            Resolution::Render(route) => {
                return Navigation {
                    route,
                    from: captured,
                };
            }
            Resolution::Redirect { to, from } => {
                if captured.is_none() {
                    captured = from;
                }
                current = to;
            }
        }
    }

    // Unreachable with the table above; fail closed.
    Navigation {
        route: Route::Login,
        from: captured,
    }
}

/// Public screens send authenticated sessions to their landing path.
fn public(session: Option<&Session>, route: Route) -> Resolution {
    match session {
        Some(session) => redirect_to(session.role.landing_path().to_owned()),
        None => Resolution::Render(route),
    }
}

fn redirect_to(to: String) -> Resolution {
    Resolution::Redirect { to, from: None }
}

/// Drop query/fragment and trailing slashes; always start with `/`.
fn normalize(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path.get(..end).unwrap_or(path).trim().trim_matches('/');
    format!("/{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff() -> Session {
        Session::new("admin", Role::Staff)
    }

    fn customer() -> Session {
        Session::new("alice", Role::Customer)
    }

    const ADMIN_PATHS: [&str; 3] = ["/admin", "/admin/products", "/admin/orders"];
    const CUSTOMER_PATHS: [&str; 3] = [
        "/customer/products",
        "/customer/products/7",
        "/customer/my-orders",
    ];

    #[test]
    fn test_guard_without_session_captures_location() {
        assert_eq!(
            guard(None, Role::Staff, "/admin/orders?page=2"),
            AccessDecision::Redirect {
                to: "/login".to_owned(),
                from: Some("/admin/orders".to_owned()),
            }
        );
    }

    #[test]
    fn test_guard_role_mismatch_goes_to_own_landing() {
        assert_eq!(
            guard(Some(&customer()), Role::Staff, "/admin"),
            AccessDecision::Redirect {
                to: "/customer/products".to_owned(),
                from: None,
            }
        );
        assert_eq!(
            guard(Some(&staff()), Role::Customer, "/customer/my-orders"),
            AccessDecision::Redirect {
                to: "/admin".to_owned(),
                from: None,
            }
        );
    }

    #[test]
    fn test_staff_allowed_on_admin_redirected_from_customer() {
        let session = staff();
        for path in ADMIN_PATHS {
            assert!(matches!(resolve(Some(&session), path), Resolution::Render(_)));
        }
        for path in CUSTOMER_PATHS {
            assert_eq!(
                resolve(Some(&session), path),
                Resolution::Redirect {
                    to: "/admin".to_owned(),
                    from: None
                }
            );
        }
    }

    #[test]
    fn test_customer_allowed_on_customer_redirected_from_admin() {
        let session = customer();
        for path in CUSTOMER_PATHS {
            assert!(matches!(resolve(Some(&session), path), Resolution::Render(_)));
        }
        for path in ADMIN_PATHS {
            assert_eq!(
                resolve(Some(&session), path),
                Resolution::Redirect {
                    to: "/customer/products".to_owned(),
                    from: None
                }
            );
        }
    }

    #[test]
    fn test_unauthenticated_never_renders_protected() {
        for path in ADMIN_PATHS.iter().chain(CUSTOMER_PATHS.iter()) {
            let nav = navigate(None, path);
            assert_eq!(nav.route, Route::Login);
            assert_eq!(nav.from.as_deref(), Some(*path));
        }
    }

    #[test]
    fn test_default_route_policy() {
        assert_eq!(navigate(None, "/").route, Route::Login);
        assert_eq!(navigate(Some(&staff()), "/").route, Route::AdminDashboard);
        assert_eq!(
            navigate(Some(&customer()), "/").route,
            Route::CustomerProducts
        );
    }

    #[test]
    fn test_unmatched_paths_fall_back() {
        assert_eq!(navigate(None, "/nope/at/all").route, Route::Login);
        assert_eq!(
            navigate(Some(&staff()), "/admin/unknown").route,
            Route::AdminDashboard
        );
        assert_eq!(
            navigate(Some(&customer()), "/customer").route,
            Route::CustomerProducts
        );
        assert_eq!(
            navigate(Some(&customer()), "/customer/products/not-a-number").route,
            Route::CustomerProducts
        );
        assert_eq!(
            navigate(Some(&customer()), "/place-order/3").route,
            Route::CustomerProducts
        );
    }

    #[test]
    fn test_login_redirects_authenticated_session() {
        assert_eq!(navigate(Some(&staff()), "/login").route, Route::AdminDashboard);
        assert_eq!(
            navigate(Some(&customer()), "/register").route,
            Route::CustomerProducts
        );
        assert_eq!(navigate(None, "/register").route, Route::Register);
    }

    #[test]
    fn test_product_detail_route() {
        let nav = navigate(Some(&customer()), "/customer/products/7/");
        assert_eq!(nav.route, Route::CustomerProduct(ProductId::new(7)));
        assert_eq!(nav.route.path(), "/customer/products/7");
    }

    #[test]
    fn test_route_paths_resolve_to_themselves() {
        let routes = [
            (Route::AdminDashboard, staff()),
            (Route::AdminProducts, staff()),
            (Route::AdminOrders, staff()),
            (Route::CustomerProducts, customer()),
            (Route::CustomerOrders, customer()),
        ];
        for (route, session) in routes {
            assert_eq!(resolve(Some(&session), &route.path()), Resolution::Render(route));
            assert_eq!(route.required_role(), Some(session.role));
        }
    }
}
