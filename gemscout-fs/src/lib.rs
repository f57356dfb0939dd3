//! Filesystem helpers shared by the GemScout crates.
//!
//! Paths are UTF-8 (`camino`) and every operation goes through `cap-std`
//! directory handles. Outputs are written with [`write_atomic`], so a
//! reader sees either the previous file or the complete new one.
//! [`stage_atomic`] splits that into a write and a later commit so related
//! outputs are only replaced once all of them are on disk.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Read, Write};
use std::path::Component;

/// Open a file for reading using ambient authority.
///
/// # Errors
/// Returns the underlying I/O error when the file cannot be opened.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Read a whole file into memory.
///
/// # Errors
/// Returns the underlying I/O error when the file cannot be opened or read.
pub fn read_bytes(path: &Utf8Path) -> io::Result<Vec<u8>> {
    let mut file = open_utf8_file(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Open the directory containing `path` and return it with the file name.
///
/// # Errors
/// Fails when `path` has no file name or its directory cannot be opened.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Create the parent directory of `path`, and its ancestors, when missing.
///
/// # Errors
/// Returns the underlying I/O error when a directory cannot be created.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }
    let (base_dir, relative) = base_dir_and_relative(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    base_dir.create_dir_all(&relative)
}

/// Report whether `path` exists and is a regular file.
///
/// Missing files and missing parent directories both report `false`.
///
/// # Errors
/// Returns I/O errors other than "not found".
pub fn is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = match open_dir_and_file(path) {
        Ok(found) => found,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Replace `path` with `contents` through a sibling temporary file.
///
/// The temporary file is flushed to disk and renamed over the target, so an
/// interrupted write never leaves a truncated file behind. Parent
/// directories are created when missing.
///
/// # Errors
/// Returns the underlying I/O error; the temporary file is removed on a
/// failed rename.
pub fn write_atomic(path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    stage_atomic(path, contents)?.commit()
}

/// Write `contents` to a sibling temporary file of `path` without touching
/// `path` itself.
///
/// Staging several outputs before committing any of them keeps a failure
/// in one from replacing the others. A staged file that is dropped without
/// [`StagedFile::commit`] removes its temporary file.
///
/// # Errors
/// Returns the underlying I/O error when the parent directory or the
/// temporary file cannot be created or flushed.
pub fn stage_atomic(path: &Utf8Path, contents: &[u8]) -> io::Result<StagedFile> {
    ensure_parent_dir(path)?;
    let (dir, name) = open_dir_and_file(path)?;
    let temp_name = format!(".{name}.{}.tmp", std::process::id());
    let staged = StagedFile {
        dir,
        temp_name,
        name,
        pending: true,
    };
    {
        let mut file = staged.dir.create(staged.temp_name.as_str())?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    Ok(staged)
}

/// A fully written temporary file waiting to replace its target.
#[derive(Debug)]
#[must_use = "a staged file is discarded unless committed"]
pub struct StagedFile {
    dir: fs_utf8::Dir,
    temp_name: String,
    name: String,
    pending: bool,
}

impl StagedFile {
    /// Rename the temporary file over the target.
    ///
    /// # Errors
    /// Returns the rename error; the temporary file is removed on drop.
    pub fn commit(mut self) -> io::Result<()> {
        self.dir
            .rename(self.temp_name.as_str(), &self.dir, self.name.as_str())?;
        self.pending = false;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.pending {
            let _cleanup = self.dir.remove_file(self.temp_name.as_str());
        }
    }
}

/// Split a parent path into an ambient base directory and a relative suffix.
fn base_dir_and_relative(parent: &Utf8Path) -> io::Result<(fs_utf8::Dir, Utf8PathBuf)> {
    let std_parent = parent.as_std_path();
    let (base, relative) = match std_parent.components().next() {
        // Windows drive or UNC prefix.
        Some(Component::Prefix(prefix)) => {
            let prefix_str = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix_str).join(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .or_else(|_| std_parent.strip_prefix(prefix.as_os_str()))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?
                .to_path_buf();
            (base, relative)
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR.to_string());
            let relative = std_parent
                .strip_prefix(base.as_std_path())
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?
                .to_path_buf();
            (base, relative)
        }
        _ => (Utf8PathBuf::from("."), std_parent.to_path_buf()),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    let relative = Utf8PathBuf::from_path_buf(relative)
        .map_err(|_| io::Error::other("non-UTF-8 parent path"))?;
    Ok((dir, relative))
}
