use std::path::{Component, Path, PathBuf};

use snafu::{ResultExt, ensure};
use tokio::fs;

use crate::error::{
    CreateLibraryRootSnafu, MediaResult, NotAFileSnafu, NotFoundSnafu, OutsideLibraryRootSnafu,
    ReadEntryMetadataSnafu, ReadLibraryDirectorySnafu,
};
use crate::kind::{MediaKind, is_supported_extension, mime_type_for_extension};

/// One displayable file discovered under the library root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaEntry {
    pub name: String,
    pub path: PathBuf,
    pub kind: MediaKind,
    pub mime_type: &'static str,
    pub size_bytes: u64,
}

/// Flat, single-directory media library rooted at a user-configured path.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the library root when missing. Returns true when it was created.
    pub async fn ensure_root(&self) -> MediaResult<bool> {
        if fs::try_exists(&self.root).await.unwrap_or(false) {
            return Ok(false);
        }

        fs::create_dir_all(&self.root)
            .await
            .context(CreateLibraryRootSnafu {
                stage: "library-ensure-root",
                path: self.root.clone(),
            })?;

        tracing::info!(root = %self.root.display(), "created media library root");
        Ok(true)
    }

    /// Lists every supported media file directly under the root, sorted by name.
    ///
    /// Subdirectories and files with unsupported extensions are skipped rather
    /// than reported as errors, so a mixed downloads folder stays usable as a
    /// library root.
    pub async fn scan(&self) -> MediaResult<Vec<MediaEntry>> {
        self.ensure_root().await?;

        let mut reader = fs::read_dir(&self.root)
            .await
            .context(ReadLibraryDirectorySnafu {
                stage: "library-scan-read-dir",
                path: self.root.clone(),
            })?;

        let mut entries = Vec::new();
        let mut skipped = 0usize;

        while let Some(dir_entry) = reader.next_entry().await.context(ReadLibraryDirectorySnafu {
            stage: "library-scan-next-entry",
            path: self.root.clone(),
        })? {
            let path = dir_entry.path();
            let metadata = dir_entry.metadata().await.context(ReadEntryMetadataSnafu {
                stage: "library-scan-metadata",
                path: path.clone(),
            })?;

            if !metadata.is_file() {
                continue;
            }

            let Some(extension) = path.extension().and_then(|value| value.to_str()) else {
                skipped += 1;
                continue;
            };

            if !is_supported_extension(extension) {
                skipped += 1;
                continue;
            }

            let Some(name) = path.file_name().and_then(|value| value.to_str()) else {
                // Non-UTF8 names cannot round-trip through settings or chat
                // references, so they stay invisible to the library.
                skipped += 1;
                continue;
            };

            entries.push(MediaEntry {
                name: name.to_string(),
                path: path.clone(),
                kind: MediaKind::from_extension(extension),
                mime_type: mime_type_for_extension(extension),
                size_bytes: metadata.len(),
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!(
            root = %self.root.display(),
            entry_count = entries.len(),
            skipped,
            "scanned media library"
        );

        Ok(entries)
    }

    /// Resolves a library-relative file name to its on-disk path.
    ///
    /// The name must stay inside the root: separators and parent components
    /// are rejected before touching the filesystem.
    pub async fn resolve(&self, name: &str) -> MediaResult<PathBuf> {
        ensure!(
            name_stays_in_root(name),
            OutsideLibraryRootSnafu {
                stage: "library-resolve-validate-name",
                name: name.to_string(),
            }
        );

        let path = self.root.join(name);
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return NotFoundSnafu {
                    stage: "library-resolve-metadata",
                    name: name.to_string(),
                }
                .fail();
            }
            Err(source) => {
                return Err(source).context(ReadEntryMetadataSnafu {
                    stage: "library-resolve-metadata",
                    path: path.clone(),
                });
            }
        };

        ensure!(
            metadata.is_file(),
            NotAFileSnafu {
                stage: "library-resolve-kind-check",
                name: name.to_string(),
            }
        );

        Ok(path)
    }
}

fn name_stays_in_root(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    let path = Path::new(name);
    let mut components = path.components();

    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;

    async fn library_with_files(files: &[&str]) -> (tempfile::TempDir, MediaLibrary) {
        let dir = tempfile::tempdir().expect("create temp library root");
        for name in files {
            tokio::fs::write(dir.path().join(name), b"fixture")
                .await
                .expect("write fixture file");
        }
        let library = MediaLibrary::new(dir.path());
        (dir, library)
    }

    #[tokio::test]
    async fn scan_lists_supported_files_sorted_by_name() {
        let (_dir, library) =
            library_with_files(&["clip.mp4", "notes.txt", "art.png", "take.wav"]).await;

        let entries = library.scan().await.expect("scan library");
        let names = entries
            .iter()
            .map(|entry| entry.name.as_str())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["art.png", "clip.mp4", "take.wav"]);
        assert_eq!(entries[0].kind, MediaKind::Image);
        assert_eq!(entries[1].kind, MediaKind::Video);
        assert_eq!(entries[1].mime_type, "video/mp4");
        assert_eq!(entries[2].size_bytes, 7);
    }

    #[tokio::test]
    async fn scan_skips_subdirectories() {
        let (dir, library) = library_with_files(&["clip.mp4"]).await;
        tokio::fs::create_dir(dir.path().join("nested.mp4"))
            .await
            .expect("create decoy directory");

        let entries = library.scan().await.expect("scan library");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "clip.mp4");
    }

    #[tokio::test]
    async fn scan_creates_a_missing_root() {
        let dir = tempfile::tempdir().expect("create temp parent");
        let root = dir.path().join("library");
        let library = MediaLibrary::new(&root);

        let entries = library.scan().await.expect("scan freshly created root");
        assert!(entries.is_empty());
        assert!(root.is_dir());
    }

    #[tokio::test]
    async fn resolve_returns_paths_for_existing_files_only() {
        let (dir, library) = library_with_files(&["clip.mp4"]).await;

        let path = library.resolve("clip.mp4").await.expect("resolve file");
        assert_eq!(path, dir.path().join("clip.mp4"));

        let missing = library.resolve("gone.mp4").await;
        assert!(matches!(missing, Err(MediaError::NotFound { .. })));
    }

    #[tokio::test]
    async fn resolve_rejects_names_that_escape_the_root() {
        let (_dir, library) = library_with_files(&["clip.mp4"]).await;

        for name in ["../clip.mp4", "nested/clip.mp4", "/etc/passwd", ""] {
            let resolved = library.resolve(name).await;
            assert!(
                matches!(resolved, Err(MediaError::OutsideLibraryRoot { .. })),
                "expected rejection for {name:?}"
            );
        }
    }

    #[tokio::test]
    async fn resolve_rejects_directories() {
        let (dir, library) = library_with_files(&[]).await;
        tokio::fs::create_dir(dir.path().join("footage.mp4"))
            .await
            .expect("create decoy directory");

        let resolved = library.resolve("footage.mp4").await;
        assert!(matches!(resolved, Err(MediaError::NotAFile { .. })));
    }
}
