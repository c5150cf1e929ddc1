//! Placement of exported archives: complete-or-absent, never overwriting.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Highest `_N` suffix tried before giving up on a name.
const MAX_SUFFIX: usize = 99;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("no free file name for {filename} in {}", .dir.display())]
    NameTaken { filename: String, dir: PathBuf },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Writes `bytes` as a new archive in `dir`, creating `dir` if needed.
///
/// An existing `session.har` is left alone and the archive lands in
/// `session_2.har`, `session_3.har`, ... instead. Readers see the file
/// complete or not at all.
pub fn write_archive(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
    if dir.exists() && !dir.is_dir() {
        return Err(PersistError::NotADirectory(dir.to_path_buf()));
    }
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file_mut().sync_all()?;

    for attempt in 1..=MAX_SUFFIX {
        let target = dir.join(candidate_name(filename, attempt));
        match tmp.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(tempfile::PersistError { error, file })
                if error.kind() == io::ErrorKind::AlreadyExists =>
            {
                tmp = file;
            }
            Err(err) => return Err(PersistError::Io(err.error)),
        }
    }
    Err(PersistError::NameTaken {
        filename: filename.to_string(),
        dir: dir.to_path_buf(),
    })
}

fn candidate_name(filename: &str, attempt: usize) -> String {
    if attempt == 1 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => format!("{stem}_{attempt}.{extension}"),
        _ => format!("{filename}_{attempt}"),
    }
}

#[cfg(test)]
mod tests {
    use super::candidate_name;

    #[test]
    fn suffix_goes_before_the_extension() {
        assert_eq!(candidate_name("a_filtered.har", 1), "a_filtered.har");
        assert_eq!(candidate_name("a_filtered.har", 3), "a_filtered_3.har");
        assert_eq!(candidate_name("capture", 2), "capture_2");
        assert_eq!(candidate_name(".har", 2), ".har_2");
    }
}
