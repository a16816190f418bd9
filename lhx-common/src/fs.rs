//! File helpers

use crate::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Temp path used while writing `path` (`<name>.tmp` in the same directory)
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to `path` atomically
///
/// The data goes to a sibling temp file which is synced and then renamed over
/// the target, so an interrupted write never leaves a truncated file behind
/// under the final name.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path_for(path);
    let result = (|| {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_for() {
        assert_eq!(
            temp_path_for(Path::new("/cache/abc.json")),
            PathBuf::from("/cache/abc.json.tmp")
        );
    }
}
