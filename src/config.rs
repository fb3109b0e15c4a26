use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "RecuerdaMed";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default log filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    "info,recuerdamed=debug".to_string()
}

/// Get the application data directory
/// ~/RecuerdaMed/ on all platforms, overridable with RECUERDAMED_DATA_DIR
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RECUERDAMED_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("RecuerdaMed")
}

/// Path of the SQLite database file
pub fn database_path() -> PathBuf {
    app_data_dir().join("recuerdamed.db")
}

/// Bind address, overridable with RECUERDAMED_ADDR
pub fn bind_addr() -> SocketAddr {
    std::env::var("RECUERDAMED_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8420)))
}
