//! Local filesystem media adapter. Files are stored flat under the configured directory.

use crate::config::MediaConfig;
use crate::error::AppError;
use axum::body::Bytes;
use futures::stream::{self, Stream};
use serde::Serialize;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
    max_size: usize,
}

impl MediaStore {
    /// Create the media directory if needed.
    pub async fn open(config: &MediaConfig) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(&config.path).await?;
        tracing::info!(path = %config.path.display(), "media storage ready");
        Ok(MediaStore {
            root: config.path.clone(),
            max_size: config.max_size,
        })
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Store bytes under `name`, replacing an existing file of the same name.
    pub async fn put(&self, name: &str, bytes: &[u8]) -> Result<MediaFile, AppError> {
        let path = self.path_for(name)?;
        if bytes.len() > self.max_size {
            return Err(AppError::Validation(format!(
                "file exceeds the maximum size of {} bytes",
                self.max_size
            )));
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(name, size = bytes.len(), "media stored");
        Ok(describe(name, bytes.len() as u64))
    }

    /// Open a stored file for reading, or `NotFound`.
    pub async fn open_file(&self, name: &str) -> Result<(MediaFile, File), AppError> {
        let path = self.path_for(name)?;
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(AppError::NotFound(format!("file {}", name)))
            }
            Err(e) => return Err(e.into()),
        };
        let size = file.metadata().await?.len();
        Ok((describe(name, size), file))
    }

    /// All stored files, sorted by name.
    pub async fn list(&self) -> Result<Vec<MediaFile>, AppError> {
        let mut files = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_name(&name).is_ok() {
                files.push(describe(&name, meta.len()));
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(name, "media deleted");
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => Err(AppError::NotFound(format!("file {}", name))),
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, AppError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

/// A single path component of `[A-Za-z0-9._-]`, not starting with a dot.
pub fn validate_name(name: &str) -> Result<(), AppError> {
    let ok = !name.is_empty()
        && name.len() <= 255
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if ok {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid file name '{}'", name)))
    }
}

/// Read a file as a stream of chunks, for response bodies.
pub fn chunks(file: File) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok::<_, std::io::Error>(Some((Bytes::from(buf), file)))
    })
}

fn describe(name: &str, size: u64) -> MediaFile {
    MediaFile {
        name: name.to_string(),
        size,
        mime_type: mime_guess::from_path(name).first_or_octet_stream().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn store(dir: &tempfile::TempDir, max_size: usize) -> MediaStore {
        MediaStore::open(&MediaConfig {
            enabled: true,
            path: dir.path().join("uploads"),
            max_size,
        })
        .await
        .unwrap()
    }

    #[test]
    fn file_names_are_single_safe_components() {
        for ok in ["photo.png", "a_b-c.1.txt", "README"] {
            assert!(validate_name(ok).is_ok(), "{}", ok);
        }
        for bad in ["", ".env", "../secret", "a/b", "a\\b", "with space.txt", "ümlaut.png"] {
            assert!(validate_name(bad).is_err(), "{}", bad);
        }
    }

    #[tokio::test]
    async fn put_get_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(&dir, 1024).await;

        let info = media.put("note.txt", b"hello").await.unwrap();
        assert_eq!(info.size, 5);
        assert_eq!(info.mime_type, "text/plain");
        media.put("note.txt", b"hello again").await.unwrap();
        media.put("pic.png", &[0u8; 4]).await.unwrap();

        let (info, file) = media.open_file("note.txt").await.unwrap();
        assert_eq!(info.size, 11);
        let read: Vec<Bytes> = chunks(file).try_collect().await.unwrap();
        assert_eq!(read.concat(), b"hello again");

        let names: Vec<_> = media.list().await.unwrap().into_iter().map(|f| f.name).collect();
        assert_eq!(names, ["note.txt", "pic.png"]);

        media.delete("note.txt").await.unwrap();
        assert!(matches!(media.open_file("note.txt").await, Err(AppError::NotFound(_))));
        assert!(matches!(media.delete("note.txt").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn large_files_stream_in_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(&dir, 4 * CHUNK_SIZE).await;
        let data: Vec<u8> = (0..CHUNK_SIZE * 2 + 10).map(|i| (i % 251) as u8).collect();
        media.put("blob.bin", &data).await.unwrap();

        let (info, file) = media.open_file("blob.bin").await.unwrap();
        assert_eq!(info.size, data.len() as u64);
        let read: Vec<Bytes> = chunks(file).try_collect().await.unwrap();
        assert!(read.len() >= 3);
        assert_eq!(read.concat(), data);
    }

    #[tokio::test]
    async fn oversized_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(&dir, 4).await;
        assert!(matches!(media.put("big.bin", b"12345").await, Err(AppError::Validation(_))));
        assert!(media.list().await.unwrap().is_empty());
    }
}
