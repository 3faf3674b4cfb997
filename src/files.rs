use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppError;

/// One lock per target path. Writers to the same file share the `.tmp` sibling.
static FILE_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Replace `path` with `data` so that readers see either the old or the new
/// content, never a partial write. Missing parent directories are created and
/// the previous content is kept as `<name>.bak`.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let lock = FILE_LOCKS
        .lock()
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    let _guard = lock.lock();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file_name = path.file_name().unwrap_or_default();

    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut bak_name = OsString::from(file_name);
    bak_name.push(".bak");
    let bak_path = path.with_file_name(&bak_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    // Losing the backup is not worth failing the write over.
    if path.exists() {
        let _ = fs::rename(path, &bak_path);
    }

    fs::rename(&tmp_path, path)?;

    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, json.as_bytes())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let data = fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_creates_parents_and_keeps_backup() {
        let dir = std::env::temp_dir().join("archmie_test_atomic_write");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("data.json");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(
            fs::read_to_string(dir.join("nested").join("data.json.bak")).unwrap(),
            "first"
        );
        assert!(!dir.join("nested").join("data.json.tmp").exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn read_json_reports_parse_errors() {
        let dir = std::env::temp_dir().join("archmie_test_read_json");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("broken.json");
        atomic_write(&path, b"{not json").unwrap();

        let result: Result<serde_json::Value, _> = read_json(&path);
        assert!(matches!(result, Err(AppError::ValidationError { .. })));

        let _ = fs::remove_dir_all(&dir);
    }
}
