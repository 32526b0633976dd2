//! Where Optimus keeps its files.
//!
//! The data directory is `<config dir>/optimus/data`, where the config dir is
//! `%APPDATA%` on Windows, `~/Library/Application Support` on macOS and
//! `$XDG_CONFIG_HOME` (or `~/.config`) elsewhere. `OPTIMUS_DATA_DIR`
//! overrides it.

use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "OPTIMUS_DATA_DIR";

const APP_DIR: &str = "optimus";

fn data_dir_from(override_dir: Option<PathBuf>, config_base: Option<PathBuf>) -> PathBuf {
    override_dir.unwrap_or_else(|| {
        config_base
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("data")
    })
}

/// Data directory for notes, tasks, contacts, config and logs.
pub fn get_data_dir() -> PathBuf {
    let override_dir = std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    data_dir_from(override_dir, dirs::config_dir())
}

/// Rolling log files live next to the data.
pub fn get_log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let dir = data_dir_from(Some("/tmp/opt".into()), Some("/home/u/.config".into()));
        assert_eq!(dir, PathBuf::from("/tmp/opt"));
    }

    #[test]
    fn test_default_layout() {
        let dir = data_dir_from(None, Some("/home/u/.config".into()));
        assert_eq!(dir, PathBuf::from("/home/u/.config/optimus/data"));
        assert_eq!(get_log_dir(&dir), dir.join("logs"));
    }
}
