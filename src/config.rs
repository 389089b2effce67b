use std::path::PathBuf;

/// Application configuration loaded from environment variables.
///
/// Every setting has a default, so a missing `.env` file or variable is
/// never an error.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where the collection database lives
    pub db_path: PathBuf,
    /// Force the 3D fallback even when a GPU is available
    pub disable_3d: bool,
    /// Log level for this crate when `RUST_LOG` doesn't say otherwise
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            db_path: var("COIN_CABINET_DB")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            disable_3d: var("COIN_CABINET_DISABLE_3D")
                .map(|value| parse_flag(&value))
                .unwrap_or(false),
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }
}

/// Default database location in the user's data directory:
/// - Linux: ~/.local/share/coin-cabinet/coin_cabinet.db
/// - macOS: ~/Library/Application Support/coin-cabinet/coin_cabinet.db
/// - Windows: %APPDATA%\coin-cabinet\coin_cabinet.db
fn default_db_path() -> PathBuf {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    path.push("coin-cabinet");
    path.push("coin_cabinet.db");
    path
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert!(config.db_path.ends_with("coin-cabinet/coin_cabinet.db"));
        assert!(!config.disable_3d);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("COIN_CABINET_DB", "/tmp/coins.db"),
            ("COIN_CABINET_DISABLE_3D", "TRUE"),
            ("RUST_LOG", "debug"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/tmp/coins.db"));
        assert!(config.disable_3d);
        assert_eq!(config.rust_log, "debug");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("nope"));
    }
}
