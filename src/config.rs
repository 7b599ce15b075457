use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MediPoint";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address for the API server. Override with `MEDIPOINT_ADDR`.
pub const DEFAULT_ADDR: &str = "127.0.0.1:5000";

/// Get the application data directory (~/MediPoint/)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("MediPoint")
}

/// Path of the application database file
pub fn database_path() -> PathBuf {
    app_data_dir().join("medipoint.db")
}

/// Bind address, from `MEDIPOINT_ADDR` or the default
pub fn bind_addr() -> SocketAddr {
    std::env::var("MEDIPOINT_ADDR")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            DEFAULT_ADDR
                .parse()
                .expect("default bind address is valid")
        })
}

/// Default log filter when `RUST_LOG` is unset
pub fn default_log_filter() -> &'static str {
    "medipoint=info,tower_http=warn"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("MediPoint"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
        assert!(db.ends_with("medipoint.db"));
    }

    #[test]
    fn default_addr_parses() {
        let addr: SocketAddr = DEFAULT_ADDR.parse().unwrap();
        assert_eq!(addr.port(), 5000);
    }
}
