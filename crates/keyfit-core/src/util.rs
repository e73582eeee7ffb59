use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes `contents` to `path` via a sibling temp file and a rename, so a
/// reader never observes a half-written file.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    // Same directory keeps the rename on one filesystem.
    let temp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(contents.as_ref())?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}
