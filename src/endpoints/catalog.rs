//! Endpoint table.

use reqwest::Method;

/// A logical operation bound to its HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    /// Path relative to the API base URL. `{id}` is a placeholder.
    pub path: &'static str,
    pub method: Method,
    pub skip_cache: bool,
}

impl Endpoint {
    /// Path with the `{id}` placeholder filled in.
    pub fn path_with(&self, id: &str) -> String {
        self.path.replace("{id}", id)
    }
}

pub const LOGIN: Endpoint = Endpoint {
    name: "login",
    path: "/users/login",
    method: Method::POST,
    skip_cache: true,
};

pub const REGISTER: Endpoint = Endpoint {
    name: "register",
    path: "/users/register",
    method: Method::POST,
    skip_cache: true,
};

pub const LOGOUT: Endpoint = Endpoint {
    name: "logout",
    path: "/users/logout",
    method: Method::POST,
    skip_cache: true,
};

/// Session is identified by an http-only cookie; no bearer token is sent.
pub const REFRESH_TOKEN: Endpoint = Endpoint {
    name: "refresh-token",
    path: "/users/refresh-token",
    method: Method::POST,
    skip_cache: true,
};

pub const GET_CURRENT_USER: Endpoint = Endpoint {
    name: "get-current-user",
    path: "/users/me",
    method: Method::GET,
    skip_cache: false,
};

pub const UPDATE_PROFILE: Endpoint = Endpoint {
    name: "update-profile",
    path: "/users/me",
    method: Method::PATCH,
    skip_cache: true,
};

pub const UPDATE_ROLE: Endpoint = Endpoint {
    name: "update-role",
    path: "/users/{id}/role",
    method: Method::PATCH,
    skip_cache: true,
};

pub const LIST_USERS: Endpoint = Endpoint {
    name: "list-users",
    path: "/users",
    method: Method::GET,
    skip_cache: false,
};

pub const LIST_TESTS: Endpoint = Endpoint {
    name: "list-tests",
    path: "/tests",
    method: Method::GET,
    skip_cache: false,
};

pub const GET_TEST: Endpoint = Endpoint {
    name: "get-test",
    path: "/tests/{id}",
    method: Method::GET,
    skip_cache: false,
};

pub const SUBMIT_TEST: Endpoint = Endpoint {
    name: "submit-test",
    path: "/tests/{id}/submit",
    method: Method::POST,
    skip_cache: true,
};

pub const LIST_HOMEWORK: Endpoint = Endpoint {
    name: "list-homework",
    path: "/homework",
    method: Method::GET,
    skip_cache: false,
};

pub const GET_HOMEWORK: Endpoint = Endpoint {
    name: "get-homework",
    path: "/homework/{id}",
    method: Method::GET,
    skip_cache: false,
};

/// Every operation, in declaration order.
pub const ENDPOINTS: &[Endpoint] = &[
    LOGIN,
    REGISTER,
    LOGOUT,
    REFRESH_TOKEN,
    GET_CURRENT_USER,
    UPDATE_PROFILE,
    UPDATE_ROLE,
    LIST_USERS,
    LIST_TESTS,
    GET_TEST,
    SUBMIT_TEST,
    LIST_HOMEWORK,
    GET_HOMEWORK,
];

/// Find an operation by name.
pub fn lookup(name: &str) -> Option<&'static Endpoint> {
    ENDPOINTS.iter().find(|e| e.name == name)
}

/// Whether `url` addresses the token refresh endpoint.
///
/// A 401 from it means the session is gone and must not start another
/// refresh.
pub fn is_refresh_endpoint(url: &str) -> bool {
    let path = url.split('?').next().unwrap_or(url);
    path.ends_with(REFRESH_TOKEN.path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = ENDPOINTS.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), ENDPOINTS.len());
    }

    #[test]
    fn mutations_bypass_cache() {
        for endpoint in ENDPOINTS.iter().filter(|e| e.method != Method::GET) {
            assert!(endpoint.skip_cache, "{} should skip the cache", endpoint.name);
        }
    }

    #[test]
    fn path_placeholder_is_filled() {
        assert_eq!(UPDATE_ROLE.path_with("42"), "/users/42/role");
        assert_eq!(LIST_TESTS.path_with("42"), "/tests");
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(lookup("list-tests"), Some(&LIST_TESTS));
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn refresh_endpoint_urls() {
        assert!(is_refresh_endpoint("http://api/users/refresh-token"));
        assert!(is_refresh_endpoint("http://api/users/refresh-token?t=1"));
        assert!(!is_refresh_endpoint("http://api/users/login"));
        assert!(!is_refresh_endpoint("http://api/users/register"));
        assert!(!is_refresh_endpoint("http://api/users/me"));
    }
}
