//! Version information.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `User-Agent` header sent with every request: `satchel/{version}`.
pub fn user_agent() -> String {
    format!("satchel/{PKG_VERSION}")
}
