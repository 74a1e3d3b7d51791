use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncSeekExt;

use super::error::VfsError;
use super::vfs::{DirEntry, Metadata, OpenMode, ReadStream, Vfs, WriteStream};

/// VFS rooted at one directory of the local filesystem. Virtual paths are
/// already normalised by the resolver, so mapping is a plain join; the `..`
/// rejection there is what keeps sessions inside the root.
pub struct OsVfs {
    root: PathBuf,
}

impl OsVfs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn real_path(&self, virtual_path: &str) -> PathBuf {
        self.root.join(virtual_path.trim_start_matches('/'))
    }

    fn metadata_from_std(md: &std::fs::Metadata) -> Metadata {
        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            Some(md.permissions().mode())
        };
        #[cfg(not(unix))]
        let mode = None;

        Metadata {
            is_dir: md.is_dir(),
            size: md.len(),
            modified: md.modified().ok(),
            mode,
        }
    }
}

#[async_trait]
impl Vfs for OsVfs {
    async fn list(&self, path: &str) -> Result<Vec<DirEntry>, VfsError> {
        let real = self.real_path(path);
        let mut read_dir = tokio::fs::read_dir(&real)
            .await
            .map_err(|e| VfsError::from_io(path, &e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| VfsError::from_io(path, &e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            match entry.metadata().await {
                Ok(md) => entries.push(DirEntry {
                    name,
                    metadata: Self::metadata_from_std(&md),
                }),
                // Entries that vanish mid-listing are skipped.
                Err(_) => continue,
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn stat(&self, path: &str) -> Result<Metadata, VfsError> {
        let real = self.real_path(path);
        let md = tokio::fs::metadata(&real)
            .await
            .map_err(|e| VfsError::from_io(path, &e))?;
        Ok(Self::metadata_from_std(&md))
    }

    async fn open_read(&self, path: &str, offset: u64) -> Result<ReadStream, VfsError> {
        let real = self.real_path(path);
        let mut file = File::open(&real)
            .await
            .map_err(|e| VfsError::from_io(path, &e))?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .await
                .map_err(|e| VfsError::from_io(path, &e))?;
        }
        Ok(Box::new(file))
    }

    async fn open_write(
        &self,
        path: &str,
        offset: u64,
        mode: OpenMode,
    ) -> Result<WriteStream, VfsError> {
        let real = self.real_path(path);
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Create => {
                options.write(true).create(true);
                if offset == 0 {
                    options.truncate(true);
                }
            }
            OpenMode::Append => {
                if offset == 0 {
                    options.append(true).create(true);
                } else {
                    options.write(true).create(true);
                }
            }
            OpenMode::Exclusive => {
                options.write(true).create_new(true);
            }
        }
        let mut file = options
            .open(&real)
            .await
            .map_err(|e| VfsError::from_io(path, &e))?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))
                .await
                .map_err(|e| VfsError::from_io(path, &e))?;
        }
        Ok(Box::new(file))
    }

    async fn delete(&self, path: &str) -> Result<(), VfsError> {
        let real = self.real_path(path);
        tokio::fs::remove_file(&real)
            .await
            .map_err(|e| VfsError::from_io(path, &e))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), VfsError> {
        let real_from = self.real_path(from);
        let real_to = self.real_path(to);
        tokio::fs::rename(&real_from, &real_to)
            .await
            .map_err(|e| VfsError::from_io(from, &e))
    }

    async fn mkdir(&self, path: &str) -> Result<(), VfsError> {
        let real = self.real_path(path);
        tokio::fs::create_dir(&real)
            .await
            .map_err(|e| VfsError::from_io(path, &e))
    }

    async fn rmdir(&self, path: &str) -> Result<(), VfsError> {
        let real = self.real_path(path);
        tokio::fs::remove_dir(&real)
            .await
            .map_err(|e| VfsError::from_io(path, &e))
    }
}

impl OsVfs {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn fixture() -> (tempfile::TempDir, OsVfs) {
        let dir = tempfile::tempdir().unwrap();
        let vfs = OsVfs::new(dir.path());
        (dir, vfs)
    }

    #[tokio::test]
    async fn write_then_read_with_offset() {
        let (_dir, vfs) = fixture().await;

        let mut w = vfs.open_write("/f.bin", 0, OpenMode::Create).await.unwrap();
        w.write_all(b"0123456789").await.unwrap();
        w.shutdown().await.unwrap();

        let mut r = vfs.open_read("/f.bin", 4).await.unwrap();
        let mut out = Vec::new();
        r.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"456789");
    }

    #[tokio::test]
    async fn write_at_offset_preserves_prefix() {
        let (_dir, vfs) = fixture().await;

        let mut w = vfs.open_write("/f.bin", 0, OpenMode::Create).await.unwrap();
        w.write_all(b"AAAAAAAA").await.unwrap();
        w.shutdown().await.unwrap();

        let mut w = vfs.open_write("/f.bin", 4, OpenMode::Create).await.unwrap();
        w.write_all(b"BB").await.unwrap();
        w.shutdown().await.unwrap();

        let mut r = vfs.open_read("/f.bin", 0).await.unwrap();
        let mut out = Vec::new();
        r.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"AAAABBAA");
    }

    #[tokio::test]
    async fn exclusive_create_fails_on_existing() {
        let (_dir, vfs) = fixture().await;
        let mut w = vfs.open_write("/x", 0, OpenMode::Create).await.unwrap();
        w.write_all(b"hi").await.unwrap();
        w.shutdown().await.unwrap();

        let err = vfs.open_write("/x", 0, OpenMode::Exclusive).await;
        assert!(matches!(err, Err(VfsError::Exists(_))));
    }

    #[tokio::test]
    async fn directory_operations() {
        let (_dir, vfs) = fixture().await;
        vfs.mkdir("/sub").await.unwrap();
        assert!(vfs.stat("/sub").await.unwrap().is_dir);

        let entries = vfs.list("/").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "sub");

        vfs.rename("/sub", "/sub2").await.unwrap();
        assert!(matches!(vfs.stat("/sub").await, Err(VfsError::NotFound(_))));
        vfs.rmdir("/sub2").await.unwrap();
        assert!(vfs.list("/").await.unwrap().is_empty());
    }
}
