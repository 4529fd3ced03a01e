// src/database/timestamp.rs

//! File modification timestamps as plain integers
//!
//! A missing file reads as 0 so comparisons never need an `Option`.

use filetime::FileTime;
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Nanoseconds since the Unix epoch, or 0 if the file does not exist
pub fn modified_time(path: &Path) -> u64 {
    match fs::metadata(path) {
        Ok(meta) => to_nanos(FileTime::from_last_modification_time(&meta)),
        Err(_) => 0,
    }
}

/// Stamp `to` with the modification time of `from`, returning the stamp
pub fn copy_modified_time(from: &Path, to: &Path) -> io::Result<u64> {
    let meta = fs::metadata(from)?;
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_mtime(to, mtime)?;
    Ok(to_nanos(mtime))
}

/// Number of regular files below `dir`, 0 if it does not exist
pub fn directory_file_count(dir: &Path) -> u64 {
    if !dir.is_dir() {
        return 0;
    }
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count() as u64
}

fn to_nanos(time: FileTime) -> u64 {
    let secs = time.unix_seconds().max(0) as u64;
    secs * 1_000_000_000 + u64::from(time.nanoseconds())
}
