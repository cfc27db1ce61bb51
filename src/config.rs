use std::path::PathBuf;

/// Library-level constants
pub const APP_NAME: &str = "DaySupply";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable overriding the bundled resources directory.
pub const RESOURCES_ENV: &str = "DAY_SUPPLY_RESOURCES";

pub const CATALOG_FILE: &str = "drug_catalog.json";
pub const CONFIG_FILE: &str = "supply_config.json";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "day_supply_lib=info"
}

/// Directory holding drug_catalog.json and supply_config.json.
/// Resolution: $DAY_SUPPLY_RESOURCES, then the crate's own resources/ (development
/// checkouts), then the per-user data directory.
pub fn resources_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(RESOURCES_ENV) {
        return PathBuf::from(dir);
    }
    let bundled = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources");
    if bundled.is_dir() {
        return bundled;
    }
    app_data_dir().join("resources")
}

/// Per-user data directory (~/.local/share/DaySupply on Linux).
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with(APP_NAME));
    }

    #[test]
    fn resources_dir_finds_bundled_catalog() {
        if std::env::var_os(RESOURCES_ENV).is_none() {
            assert!(resources_dir().join(CATALOG_FILE).is_file());
        }
    }

    #[test]
    fn log_filter_targets_this_crate() {
        assert!(default_log_filter().starts_with("day_supply_lib"));
    }
}
