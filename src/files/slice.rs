use std::io;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// Streams a validated byte range of a file in bounded chunks.
///
/// The file cursor is already at the start of the range; each chunk advances
/// it by exactly the number of bytes returned.
#[derive(Debug)]
pub struct SliceReader {
    file: File,
    remaining: u64,
    chunk_size: usize,
    buf: Vec<u8>,
}

impl SliceReader {
    pub(crate) fn new(file: File, size: u64, chunk_size: usize) -> Self {
        Self {
            file,
            remaining: size,
            chunk_size: chunk_size.max(1),
            buf: Vec::new(),
        }
    }

    /// Bytes of the range not yet handed out.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Next chunk of at most `chunk_size` bytes, or `None` once the range
    /// is done or the file ran out early.
    ///
    /// Short reads are retried until the chunk is full or EOF is reached.
    pub async fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        let want = usize::try_from(self.remaining)
            .unwrap_or(usize::MAX)
            .min(self.chunk_size);
        if want == 0 {
            return Ok(None);
        }

        self.buf.resize(want, 0);
        let mut filled = 0;
        while filled < want {
            let n = self.file.read(&mut self.buf[filled..want]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            self.remaining = 0;
            return Ok(None);
        }

        self.remaining -= filled as u64;
        Ok(Some(&self.buf[..filled]))
    }
}
