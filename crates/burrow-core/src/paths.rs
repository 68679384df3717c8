//! Locations on disk the orchestrator needs to know about.

use burrow_types::FileInfo;
use std::path::{Path, PathBuf};

/// Path of the wormhole executable shipped under `resources/binaries`.
pub fn bundled_executable_path(resources_dir: &Path) -> PathBuf {
    let name = if cfg!(windows) { "wormhole.exe" } else { "wormhole" };
    resources_dir.join("binaries").join(name)
}

/// Where received files go when the user has not chosen a directory.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Downloads")
    })
}

/// Name and size of each file picked for sending.
pub async fn describe_files(paths: &[PathBuf]) -> crate::Result<Vec<FileInfo>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(FileInfo {
            path: path.clone(),
            name,
            size: metadata.len(),
        });
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_executable_path() {
        let path = bundled_executable_path(Path::new("/opt/burrow/resources"));
        assert!(path.starts_with("/opt/burrow/resources/binaries"));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("wormhole"));
    }

    #[tokio::test]
    async fn test_describe_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let files = describe_files(&[path.clone()]).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "notes.txt");
        assert_eq!(files[0].size, 5);
        assert_eq!(files[0].path, path);
    }

    #[tokio::test]
    async fn test_describe_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = describe_files(&[dir.path().join("missing.bin")]).await;
        assert!(matches!(result, Err(crate::TransferError::Io(_))));
    }
}
