use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use harvest_core::ExportArtifact;
use harvest_logging::harvest_info;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Highest numbered suffix tried before giving up on a free filename.
const MAX_SUFFIX: u32 = 99;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0:?} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error("could not create output directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("no free filename for {0} in the output directory")]
    NameTaken(String),
    #[error("could not write export: {0}")]
    Io(#[from] io::Error),
}

/// Create `dir` if it is missing. An existing non-directory is an error.
pub fn prepare_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(PersistError::NotADirectory(dir.to_path_buf()));
        }
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| PersistError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Saves export artifacts into one directory.
///
/// The body goes to a temp file first and is linked into place only when
/// complete. Earlier exports are never replaced: when the artifact's filename
/// is taken, `-2`, `-3`, ... is inserted before the extension.
#[derive(Debug, Clone)]
pub struct ExportWriter {
    dir: PathBuf,
}

impl ExportWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save(&self, artifact: &ExportArtifact) -> Result<PathBuf, PersistError> {
        prepare_output_dir(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(artifact.body.as_bytes())?;
        tmp.as_file().sync_all()?;

        for attempt in 1..=MAX_SUFFIX {
            let target = self.dir.join(numbered_name(&artifact.filename, attempt));
            match tmp.persist_noclobber(&target) {
                Ok(_) => {
                    harvest_info!(
                        "Saved {} export ({} bytes) to {:?}",
                        artifact.format,
                        artifact.body.len(),
                        target
                    );
                    return Ok(target);
                }
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => tmp = err.file,
                Err(err) => return Err(err.error.into()),
            }
        }
        Err(PersistError::NameTaken(artifact.filename.clone()))
    }
}

fn numbered_name(filename: &str, attempt: u32) -> String {
    if attempt <= 1 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{attempt}.{ext}"),
        _ => format!("{filename}-{attempt}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(numbered_name("connections-x.csv", 1), "connections-x.csv");
        assert_eq!(numbered_name("connections-x.csv", 3), "connections-x-3.csv");
        assert_eq!(numbered_name("connections", 2), "connections-2");
        assert_eq!(numbered_name(".json", 2), ".json-2");
    }
}
