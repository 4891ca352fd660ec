//! Source directory resolution.
//!
//! The base path is normalized to end with a path separator, then the
//! per-system subdirectories and per-entry file paths are derived from it.

use std::fs;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use strata_core::{LoadManifestEntry, SourceSystem};

use crate::IngestError;

/// A validated ingestion base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    root: PathBuf,
}

impl SourceLayout {
    /// Validate `base` as a readable directory and normalize it.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::InvalidBasePath`] if `base` is empty, does not
    /// exist, is not a directory, or cannot be listed.
    pub fn resolve(base: &Path) -> Result<Self, IngestError> {
        let invalid = |reason: String| IngestError::InvalidBasePath {
            path: base.to_path_buf(),
            reason,
        };

        if base.as_os_str().is_empty() {
            return Err(invalid("path is empty".into()));
        }
        let metadata = fs::metadata(base).map_err(|e| invalid(e.to_string()))?;
        if !metadata.is_dir() {
            return Err(invalid("not a directory".into()));
        }
        fs::read_dir(base).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            root: normalize(base),
        })
    }

    /// The base path, always ending with a separator.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subdirectory holding one source system's extracts.
    #[must_use]
    pub fn source_dir(&self, system: SourceSystem) -> PathBuf {
        self.root.join(system.dir_name())
    }

    #[must_use]
    pub fn source_path(&self, entry: &LoadManifestEntry) -> PathBuf {
        self.root.join(entry.relative_source())
    }

    /// Error-capture file, next to the source file.
    #[must_use]
    pub fn error_path(&self, entry: &LoadManifestEntry) -> PathBuf {
        self.root.join(entry.relative_error_file())
    }
}

/// Append a trailing separator unless one is already present.
fn normalize(base: &Path) -> PathBuf {
    let text = base.as_os_str();
    if text.to_string_lossy().ends_with(std::path::is_separator) {
        return base.to_path_buf();
    }
    let mut owned = text.to_os_string();
    owned.push(MAIN_SEPARATOR_STR);
    PathBuf::from(owned)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strata_core::MANIFEST;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn root_gains_trailing_separator() {
        let dir = TempDir::new().unwrap();
        let layout = SourceLayout::resolve(dir.path()).unwrap();
        let root = layout.root().to_string_lossy().into_owned();
        assert!(root.ends_with(MAIN_SEPARATOR_STR));
        assert_eq!(root.trim_end_matches(MAIN_SEPARATOR_STR), dir.path().to_string_lossy());
    }

    #[test]
    fn trailing_separator_is_not_doubled() {
        let dir = TempDir::new().unwrap();
        let with_sep = PathBuf::from(format!("{}{MAIN_SEPARATOR_STR}", dir.path().display()));
        let layout = SourceLayout::resolve(&with_sep).unwrap();
        assert_eq!(layout.root(), with_sep.as_path());
    }

    #[test]
    fn entry_paths_live_under_source_dirs() {
        let dir = TempDir::new().unwrap();
        let layout = SourceLayout::resolve(dir.path()).unwrap();
        let entry = &MANIFEST[0];
        assert_eq!(
            layout.source_path(entry),
            dir.path().join("source_A").join("cust_info.csv")
        );
        assert_eq!(
            layout.error_path(entry),
            dir.path().join("source_A").join("error_cust_info.csv")
        );
        assert_eq!(
            layout.source_dir(SourceSystem::Erp),
            dir.path().join("source_B")
        );
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = SourceLayout::resolve(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, IngestError::InvalidBasePath { .. }));
    }

    #[test]
    fn file_is_not_a_base_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("cust_info.csv");
        fs::write(&file, "a,b\n").unwrap();
        let err = SourceLayout::resolve(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = SourceLayout::resolve(Path::new("")).unwrap_err();
        assert!(err.to_string().contains("path is empty"));
    }
}
