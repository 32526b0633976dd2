//! JSON file persistence shared by the feature stores.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// Timestamp format used in every store file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Load a JSON store. A missing or unreadable file is an empty store. A
/// corrupt one is moved aside to `<name>.corrupt` first so the next save
/// cannot overwrite what is left of the user's data.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            let aside = corrupt_path(path);
            match std::fs::rename(path, &aside) {
                Ok(()) => warn!(
                    "Failed to parse {}: {}; moved it to {}",
                    path.display(),
                    e,
                    aside.display()
                ),
                Err(re) => warn!(
                    "Failed to parse {}: {}; could not move it aside: {}",
                    path.display(),
                    e,
                    re
                ),
            }
            T::default()
        }),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to read {}: {}", path.display(), e);
            }
            T::default()
        }
    }
}

fn corrupt_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

/// Atomic write: write to a temp file in the same directory, then rename.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("store");
    let tmp = dir.join(format!(".{}.{}.tmp", name, std::process::id()));
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(&tmp, &json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
