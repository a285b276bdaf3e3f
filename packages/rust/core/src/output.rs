//! Filesystem helpers shared by every stage that writes output.

use std::path::{Path, PathBuf};

use tracing::debug;

use docpack_shared::{DocpackError, Result};

/// Write `bytes` to a temp sibling, then rename over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| DocpackError::io(parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| DocpackError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| DocpackError::io(path, e))?;

    debug!(path = %path.display(), size = bytes.len(), "wrote file");
    Ok(())
}

/// Write a JSON file (pretty-printed, trailing newline).
pub(crate) fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(data)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}

/// A fresh, empty staging directory next to `target`.
pub(crate) fn staging_dir_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = parent.join(format!(".{name}.staging"));

    remove_dir_if_exists(&staging)?;
    std::fs::create_dir_all(&staging).map_err(|e| DocpackError::io(&staging, e))?;
    Ok(staging)
}

/// Swap a fully written staging directory into place at `target`.
///
/// The previous `target` (if any) is moved aside first and removed only
/// after the rename succeeds, so an interrupted run leaves either the old or
/// the new directory in place.
pub(crate) fn swap_into_place(staging: &Path, target: &Path) -> Result<()> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let old = parent.join(format!(".{name}.old"));

    remove_dir_if_exists(&old)?;
    if target.exists() {
        std::fs::rename(target, &old).map_err(|e| DocpackError::io(target, e))?;
    }
    std::fs::rename(staging, target).map_err(|e| DocpackError::io(target, e))?;
    remove_dir_if_exists(&old)?;

    debug!(path = %target.display(), "directory replaced");
    Ok(())
}

/// Copy every regular file directly inside `from` into `to`.
///
/// Returns the copied file names, sorted.
pub(crate) fn copy_flat_dir(from: &Path, to: &Path) -> Result<Vec<String>> {
    std::fs::create_dir_all(to).map_err(|e| DocpackError::io(to, e))?;

    let mut names = Vec::new();
    if from.is_dir() {
        for entry in std::fs::read_dir(from).map_err(|e| DocpackError::io(from, e))? {
            let entry = entry.map_err(|e| DocpackError::io(from, e))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    names.sort();

    for name in &names {
        let src = from.join(name);
        let dst = to.join(name);
        std::fs::copy(&src, &dst).map_err(|e| DocpackError::io(&dst, e))?;
    }

    Ok(names)
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| DocpackError::io(path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("docpack-output-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let tmp = temp_dir();
        let path = tmp.join("nested").join("out.json");

        write_json(&path, &vec!["a", "b"]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "[\n  \"a\",\n  \"b\"\n]\n"
        );
        assert!(!tmp.join("nested").join(".out.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn swap_replaces_directory_contents() {
        let tmp = temp_dir();
        let target = tmp.join("compact");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("stale.md"), "old").unwrap();

        let staging = staging_dir_for(&target).unwrap();
        std::fs::write(staging.join("fresh.md"), "new").unwrap();
        swap_into_place(&staging, &target).unwrap();

        assert!(!target.join("stale.md").exists());
        assert!(target.join("fresh.md").exists());
        assert!(!staging.exists());
        assert!(!tmp.join(".compact.old").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn copy_flat_dir_sorted_names() {
        let tmp = temp_dir();
        let from = tmp.join("from");
        std::fs::create_dir_all(from.join("sub")).unwrap();
        std::fs::write(from.join("b.md"), "b").unwrap();
        std::fs::write(from.join("a.md"), "a").unwrap();

        let names = copy_flat_dir(&from, &tmp.join("to")).unwrap();
        assert_eq!(names, vec!["a.md", "b.md"]);
        assert_eq!(std::fs::read_to_string(tmp.join("to/a.md")).unwrap(), "a");

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
