//! Atomic file writes (temp file in the target directory + rename)
//!
//! Readers never observe a partially written file: content goes to a
//! temporary file next to the target, is synced, and only then takes the
//! target name. A process killed mid-write leaves at most a stray temp file
//! named with [`TEMP_PREFIX`], which [`remove_stale_temp_files`] cleans up.

use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Name prefix of in-progress temp files
pub const TEMP_PREFIX: &str = ".lyrnet-partial-";

fn write_temp<F>(target: &Path, write: F) -> io::Result<NamedTempFile>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    Ok(temp)
}

/// Create `target` atomically; fails with `ErrorKind::AlreadyExists` if it is
/// already present, leaving the existing file untouched
pub fn create_new_atomic<F>(target: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    if target.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", target.display()),
        ));
    }
    let temp = write_temp(target, write)?;
    temp.persist_noclobber(target).map_err(|e| e.error)?;
    Ok(())
}

/// Write `target` atomically, replacing any previous content
pub fn replace_atomic<F>(target: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let temp = write_temp(target, write)?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// Delete temp files an interrupted process left in `dir`; returns the count.
/// Must not run while another writer is active in the same directory.
pub fn remove_stale_temp_files(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let is_temp = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(TEMP_PREFIX));
        if is_temp && entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
