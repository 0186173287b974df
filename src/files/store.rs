use std::io;
use std::io::SeekFrom;
use std::path::PathBuf;

use tokio::io::AsyncSeekExt;
use tracing::debug;

use crate::error::FileError;
use crate::files::slice::SliceReader;

/// Read-only view of the served directory.
///
/// Every client-supplied name is resolved against the root and must stay
/// inside it after canonicalization, so `..`, absolute paths and symlinks
/// pointing outside the root all look like missing files.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Names of the entries in the root, sorted.
    ///
    /// Names that are not ASCII are left out: requests are ASCII-only, so
    /// such a file could never be asked for.
    pub async fn list(&self) -> Result<Vec<String>, FileError> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            match entry.file_name().into_string() {
                Ok(name) if name.is_ascii() => names.push(name),
                Ok(name) => debug!(name = %name, "Skipping non-ASCII entry"),
                Err(name) => debug!(name = ?name, "Skipping non-UTF-8 entry"),
            }
        }

        names.sort();
        Ok(names)
    }

    /// Size in bytes of the regular file `name`.
    pub async fn size_of(&self, name: &str) -> Result<u64, FileError> {
        let path = self.resolve(name).await?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| not_found_or(e, name))?;

        if !meta.is_file() {
            return Err(FileError::NotFound(name.to_string()));
        }
        Ok(meta.len())
    }

    /// Validates `[offset, offset + size)` against the file and opens a
    /// reader positioned at `offset`.
    ///
    /// Bounds are checked before any file data is read.
    pub async fn open_slice(
        &self,
        name: &str,
        offset: i64,
        size: i64,
        chunk_size: usize,
    ) -> Result<SliceReader, FileError> {
        let len = self.size_of(name).await?;
        let range = match (u64::try_from(offset), u64::try_from(size)) {
            (Ok(start), Ok(count)) => start
                .checked_add(count)
                .is_some_and(|end| end <= len)
                .then_some((start, count)),
            _ => None,
        };
        let Some((start, count)) = range else {
            return Err(FileError::BadOffset { offset, size, len });
        };

        let path = self.resolve(name).await?;
        let mut file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| not_found_or(e, name))?;
        file.seek(SeekFrom::Start(start)).await?;

        Ok(SliceReader::new(file, count, chunk_size))
    }

    async fn resolve(&self, name: &str) -> Result<PathBuf, FileError> {
        if !is_plain_name(name) {
            return Err(FileError::NotFound(name.to_string()));
        }

        let root = tokio::fs::canonicalize(&self.root).await?;
        let path = tokio::fs::canonicalize(self.root.join(name))
            .await
            .map_err(|e| not_found_or(e, name))?;

        if !path.starts_with(&root) || path == root {
            return Err(FileError::NotFound(name.to_string()));
        }
        Ok(path)
    }
}

/// A single path component with no separators or dot segments.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

fn not_found_or(err: io::Error, name: &str) -> FileError {
    match err.kind() {
        io::ErrorKind::NotFound => FileError::NotFound(name.to_string()),
        _ => FileError::Io(err),
    }
}
