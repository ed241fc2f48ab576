//! Compile-time invalidation pattern table.

/// Key fragments identifying session and current-user responses.
const AUTH_FRAGMENTS: &[&str] = &[
    "/users/login",
    "/users/register",
    "/users/logout",
    "/users/refresh-token",
    "/users/me",
];

/// Key fragments identifying any user resource.
const USER_FRAGMENTS: &[&str] = &["/users"];

/// Key fragments identifying test listings and details.
const TESTS_FRAGMENTS: &[&str] = &["/tests"];

/// Named set of cache key fragments.
///
/// A key matches a pattern when it contains any of the pattern's
/// fragments. [`All`](Self::All) is the wildcard and matches every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidationPattern {
    User,
    Auth,
    Tests,
    All,
}

impl InvalidationPattern {
    /// Label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            InvalidationPattern::User => "user",
            InvalidationPattern::Auth => "auth",
            InvalidationPattern::Tests => "tests",
            InvalidationPattern::All => "all",
        }
    }

    /// Substrings this pattern matches. Empty for the wildcard.
    pub fn fragments(&self) -> &'static [&'static str] {
        match self {
            InvalidationPattern::User => USER_FRAGMENTS,
            InvalidationPattern::Auth => AUTH_FRAGMENTS,
            InvalidationPattern::Tests => TESTS_FRAGMENTS,
            InvalidationPattern::All => &[],
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, InvalidationPattern::All)
    }

    /// Whether `key` falls under this pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.is_wildcard() || self.fragments().iter().any(|f| key.contains(f))
    }
}

/// Whether a URL addresses a user or session resource.
///
/// Successful mutations against such URLs invalidate the
/// [`User`](InvalidationPattern::User) and [`Auth`](InvalidationPattern::Auth)
/// patterns.
pub fn is_user_resource(url: &str) -> bool {
    InvalidationPattern::User.matches(url) || InvalidationPattern::Auth.matches(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_matches_session_keys_only() {
        let auth = InvalidationPattern::Auth;
        assert!(auth.matches("GET:http://api/users/me:"));
        assert!(auth.matches("POST:http://api/users/login:{\"email\":\"a\"}"));
        assert!(!auth.matches("GET:http://api/users?role=student:"));
        assert!(!auth.matches("GET:http://api/tests:"));
    }

    #[test]
    fn user_matches_every_user_key() {
        let user = InvalidationPattern::User;
        assert!(user.matches("GET:http://api/users?role=student:"));
        assert!(user.matches("GET:http://api/users/me:"));
        assert!(!user.matches("GET:http://api/homework:"));
    }

    #[test]
    fn wildcard_matches_everything() {
        assert!(InvalidationPattern::All.matches(""));
        assert!(InvalidationPattern::All.matches("GET:http://api/tests:"));
        assert!(InvalidationPattern::All.fragments().is_empty());
    }

    #[test]
    fn user_resource_detection() {
        assert!(is_user_resource("http://api/users/42/role"));
        assert!(is_user_resource("http://api/users/refresh-token"));
        assert!(!is_user_resource("http://api/tests/7"));
    }
}
