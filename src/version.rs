// Build-time version from Cargo.toml

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Client identifier sent as `User-Agent` on every publish request.
pub fn user_agent() -> String {
    format!("{}/{} (host metrics publisher)", NAME, VERSION)
}
