//! Crash-safe file writes for the emitted SKR document: write to a
//! temporary file in the same directory as the destination, `fsync` it,
//! then rename over the destination. A reader never observes a
//! partially-written SKR, and a crash mid-write leaves the previous file
//! (or nothing) rather than a truncated one.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub fn write_atomically(destination: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = destination.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let file_name = destination
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "destination has no file name"))?;

    let temp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(contents)?;
    temp_file.sync_all()?;
    drop(temp_file);

    fs::rename(&temp_path, destination)
}
