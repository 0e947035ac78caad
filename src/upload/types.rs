use bytes::Bytes;
use std::path::PathBuf;

use super::UploadError;

/// Fixed logical prefix every uploaded blob is placed under.
pub const BLOB_PREFIX: &str = "main/";

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Memory(Bytes),
}

/// A user-selected payload waiting to be uploaded.
///
/// Handles are immutable once captured and cheap to clone. Path-backed
/// handles read the file lazily and record its size when captured;
/// memory-backed handles share their buffer.
#[derive(Debug, Clone)]
pub struct FileHandle {
    name: String,
    size: Option<u64>,
    source: FileSource,
}

impl FileHandle {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self::from_named_path(name, path)
    }

    /// Like [`FileHandle::from_path`] but keeps a display name chosen by the caller.
    pub fn from_named_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: name.into(),
            size: std::fs::metadata(&path).ok().map(|m| m.len()),
            source: FileSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: Some(content.len() as u64),
            source: FileSource::Memory(content),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes as seen when the handle was captured.
    pub fn size_hint(&self) -> Option<u64> {
        self.size
    }

    pub async fn read(&self) -> Result<Bytes, UploadError> {
        match &self.source {
            FileSource::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|source| UploadError::Read {
                    name: self.name.clone(),
                    source,
                }),
            FileSource::Memory(bytes) => Ok(bytes.clone()),
        }
    }

    /// Destination path of this file inside its container.
    pub fn blob_name(&self) -> String {
        format!("{}{}", BLOB_PREFIX, self.name)
    }
}

/// A blob the provider confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedBlob {
    pub name: String,
    pub blob_name: String,
    /// Opaque provider identifier, for logging and acknowledgement only.
    pub confirmation_id: String,
}

/// Result of one upload attempt within a commit.
#[derive(Debug)]
pub struct FileOutcome {
    pub name: String,
    pub result: Result<UploadedBlob, UploadError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn blob_name_uses_main_prefix() {
        let file = FileHandle::from_bytes("report final.pdf", &b"x"[..]);
        assert_eq!(file.blob_name(), "main/report final.pdf");
    }

    #[test]
    fn path_handles_take_file_name() {
        let file = FileHandle::from_path("/tmp/some/dir/notes.txt");
        assert_eq!(file.name(), "notes.txt");
        assert_eq!(file.size_hint(), None);
    }

    #[test]
    fn size_is_recorded_when_captured() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello").unwrap();
        tmp.flush().unwrap();

        let file = FileHandle::from_path(tmp.path());
        tmp.write_all(b" world").unwrap();
        tmp.flush().unwrap();

        assert_eq!(file.size_hint(), Some(5));
    }

    #[tokio::test]
    async fn reads_path_and_memory_sources() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello").unwrap();

        let on_disk = FileHandle::from_path(tmp.path());
        assert_eq!(on_disk.size_hint(), Some(5));
        assert_eq!(&on_disk.read().await.unwrap()[..], b"hello");

        let in_memory = FileHandle::from_bytes("a.txt", &b"abc"[..]);
        assert_eq!(in_memory.size_hint(), Some(3));
        assert_eq!(&in_memory.read().await.unwrap()[..], b"abc");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let file = FileHandle::from_path("/definitely/not/here.bin");
        let err = file.read().await.unwrap_err();
        assert!(matches!(err, UploadError::Read { ref name, .. } if name == "here.bin"));
    }
}
